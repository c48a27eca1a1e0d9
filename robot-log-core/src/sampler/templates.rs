//! Message templates for synthetic telemetry
//!
//! Templates use `{}` and `{:.Nf}` placeholders. Each placeholder is filled
//! with a random value whose range is picked by keyword matching on the
//! template text; the first matching rule wins and unmatched templates fall
//! back to an integer in `[1, 100]`.

use rand::Rng;
use std::collections::HashMap;

/// Built-in templates per channel
const CHANNEL_TEMPLATES: &[(&str, &[&str])] = &[
    (
        "drivetrain",
        &[
            "Motor speeds normalized",
            "Gyro angle: {:.1f} degrees",
            "Odometry position updated: ({:.2f}, {:.2f})",
            "Turning to target angle",
            "Brake mode engaged",
        ],
    ),
    (
        "intake",
        &[
            "Note detected in intake",
            "Intake motor current: {:.1f}A",
            "Deploying intake mechanism",
            "Intake stalled - possible jam",
            "Retracting intake",
        ],
    ),
    (
        "shooter",
        &[
            "Shooter spinning up",
            "Target velocity reached: {} RPM",
            "Shot executed",
            "Shooter temperature: {}°C",
            "Cooling down shooter",
        ],
    ),
    (
        "vision",
        &[
            "AprilTag {} detected",
            "Target locked - distance: {:.2f}m",
            "Lost tracking of target",
            "Camera exposure adjusted",
            "Processing pipeline switched",
        ],
    ),
    (
        "auto",
        &[
            "Starting autonomous routine",
            "Path point {} reached",
            "Executing action: shoot",
            "Autonomous completed successfully",
            "Trajectory following active",
        ],
    ),
    (
        "elevator",
        &[
            "Elevator moving to setpoint: {:.1f} inches",
            "Elevator current position: {:.1f} inches",
            "Elevator soft limit reached at {:.1f} inches",
            "Elevator power: {:.1f}V",
            "Elevator limit switch triggered",
        ],
    ),
    (
        "system",
        &[
            "Battery voltage: {:.1f}V",
            "CAN utilization: {}%",
            "CPU temperature: {}°C",
            "Free memory: {}MB",
            "Robot enabled",
        ],
    ),
    (
        "error",
        &[
            "CAN timeout on device ID {}",
            "Motor controller fault detected",
            "Pressure sensor disconnected",
            "Communication lost with coprocessor",
            "Brownout detected",
        ],
    ),
];

/// Numeric range used to fill a placeholder
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillRange {
    Float(f64, f64),
    Int(i64, i64),
}

/// Range for templates that match no rule
pub const FALLBACK_RANGE: FillRange = FillRange::Int(1, 100);

struct FillRule {
    keywords: &'static [&'static str],
    ignore_case: bool,
    range: FillRange,
}

/// Keyword rules, checked in order
const FILL_RULES: &[FillRule] = &[
    FillRule { keywords: &["angle", "degrees"], ignore_case: false, range: FillRange::Float(-180.0, 180.0) },
    FillRule { keywords: &["position"], ignore_case: false, range: FillRange::Float(0.0, 10.0) },
    FillRule { keywords: &["current"], ignore_case: false, range: FillRange::Float(0.0, 40.0) },
    FillRule { keywords: &["RPM"], ignore_case: false, range: FillRange::Int(4000, 6000) },
    FillRule { keywords: &["temperature", "°C"], ignore_case: false, range: FillRange::Int(20, 60) },
    FillRule { keywords: &["distance"], ignore_case: false, range: FillRange::Float(1.0, 5.0) },
    FillRule { keywords: &["AprilTag"], ignore_case: false, range: FillRange::Int(1, 8) },
    FillRule { keywords: &["point"], ignore_case: false, range: FillRange::Int(1, 10) },
    FillRule { keywords: &["ID", "device"], ignore_case: false, range: FillRange::Int(1, 20) },
    FillRule { keywords: &["voltage"], ignore_case: true, range: FillRange::Float(11.5, 12.8) },
    FillRule { keywords: &["inches"], ignore_case: false, range: FillRange::Float(0.0, 24.0) },
    FillRule { keywords: &["utilization", "%"], ignore_case: false, range: FillRange::Int(20, 80) },
    FillRule { keywords: &["memory"], ignore_case: true, range: FillRange::Int(100, 500) },
];

impl FillRule {
    fn matches(&self, template: &str, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| {
            if self.ignore_case {
                lowered.contains(keyword)
            } else {
                template.contains(keyword)
            }
        })
    }
}

/// Pick the fill range for a template
pub fn range_for(template: &str) -> FillRange {
    let lowered = template.to_lowercase();
    FILL_RULES
        .iter()
        .find(|rule| rule.matches(template, &lowered))
        .map(|rule| rule.range)
        .unwrap_or(FALLBACK_RANGE)
}

/// A placeholder's requested precision (`None` for plain `{}`)
type Precision = Option<usize>;

/// Parse the text between `{` and `}`
fn parse_placeholder(inner: &str) -> Precision {
    inner.strip_prefix(":.")
        .and_then(|rest| rest.strip_suffix('f'))
        .and_then(|digits| digits.parse().ok())
}

fn render_value<R: Rng + ?Sized>(range: FillRange, precision: Precision, rng: &mut R) -> String {
    match (range, precision) {
        (FillRange::Float(lo, hi), Some(p)) => format!("{:.*}", p, rng.gen_range(lo..=hi)),
        (FillRange::Float(lo, hi), None) => format!("{}", rng.gen_range(lo..=hi)),
        (FillRange::Int(lo, hi), Some(p)) => format!("{:.*}", p, rng.gen_range(lo..=hi) as f64),
        (FillRange::Int(lo, hi), None) => format!("{}", rng.gen_range(lo..=hi)),
    }
}

/// Fill every placeholder in a template, left to right
///
/// Templates without placeholders are returned unchanged. An unclosed `{` is
/// copied literally.
pub fn fill_template<R: Rng + ?Sized>(template: &str, rng: &mut R) -> String {
    if !template.contains('{') {
        return template.to_string();
    }

    let range = range_for(template);
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let precision = parse_placeholder(&after[..close]);
                out.push_str(&render_value(range, precision, rng));
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

/// Per-channel template table
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: HashMap<String, Vec<String>>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        let templates = CHANNEL_TEMPLATES
            .iter()
            .map(|(channel, list)| {
                (
                    channel.to_string(),
                    list.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Self { templates }
    }
}

impl TemplateSet {
    /// Create a table with no templates (every channel gets the generic message)
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Add or replace the templates for one channel
    pub fn insert<I, S>(&mut self, channel: impl Into<String>, templates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates
            .insert(channel.into(), templates.into_iter().map(Into::into).collect());
    }

    /// Templates for a channel, if any
    pub fn get(&self, channel: &str) -> Option<&[String]> {
        self.templates
            .get(channel)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    /// Pick a template for the channel and fill it
    pub fn random_message<R: Rng + ?Sized>(&self, channel: &str, rng: &mut R) -> String {
        match self.get(channel) {
            Some(list) => {
                let template = &list[rng.gen_range(0..list.len())];
                fill_template(template, rng)
            }
            None => format!("Sample message from {}", channel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn number_in(text: &str, prefix: &str, suffix: &str) -> f64 {
        text.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .unwrap_or_else(|| panic!("unexpected message: {}", text))
            .parse()
            .unwrap()
    }

    #[test]
    fn test_range_selection() {
        assert_eq!(range_for("Gyro angle: {:.1f} degrees"), FillRange::Float(-180.0, 180.0));
        assert_eq!(range_for("Battery voltage: {:.1f}V"), FillRange::Float(11.5, 12.8));
        assert_eq!(range_for("Target velocity reached: {} RPM"), FillRange::Int(4000, 6000));
        assert_eq!(range_for("Free memory: {}MB"), FillRange::Int(100, 500));
        // Rule order matters: "current position" hits the position rule first
        assert_eq!(
            range_for("Elevator current position: {:.1f} inches"),
            FillRange::Float(0.0, 10.0)
        );
        assert_eq!(range_for("Elevator power: {:.1f}V"), FALLBACK_RANGE);
    }

    #[test]
    fn test_fill_voltage() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let text = fill_template("Battery voltage: {:.1f}V", &mut rng);
            let value = number_in(&text, "Battery voltage: ", "V");
            assert!((11.5..=12.8).contains(&value), "{}", text);
        }
    }

    #[test]
    fn test_fill_angle() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let text = fill_template("Gyro angle: {:.1f} degrees", &mut rng);
            let value = number_in(&text, "Gyro angle: ", " degrees");
            assert!((-180.0..=180.0).contains(&value), "{}", text);
        }
    }

    #[test]
    fn test_fill_fallback_integer() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let text = fill_template("Widget count {}", &mut rng);
            let value = number_in(&text, "Widget count ", "");
            assert!((1.0..=100.0).contains(&value));
            assert_eq!(value.fract(), 0.0);
        }
    }

    #[test]
    fn test_fill_two_placeholders() {
        let mut rng = StdRng::seed_from_u64(5);
        let text = fill_template("Odometry position updated: ({:.2f}, {:.2f})", &mut rng);
        let inner = text
            .strip_prefix("Odometry position updated: (")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap();
        let coords: Vec<f64> = inner.split(", ").map(|v| v.parse().unwrap()).collect();
        assert_eq!(coords.len(), 2);
        assert!(coords.iter().all(|c| (0.0..=10.0).contains(c)));
    }

    #[test]
    fn test_template_without_placeholders_is_unchanged() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(fill_template("Shot executed", &mut rng), "Shot executed");
        assert_eq!(fill_template("open { brace", &mut rng), "open { brace");
    }

    #[test]
    fn test_random_message_for_unknown_channel() {
        let mut rng = StdRng::seed_from_u64(9);
        let set = TemplateSet::default();
        assert_eq!(
            set.random_message("climber", &mut rng),
            "Sample message from climber"
        );
    }

    #[test]
    fn test_default_set_covers_default_channels() {
        let set = TemplateSet::default();
        for channel in crate::config::DEFAULT_CHANNELS {
            assert_eq!(set.get(channel).map(<[String]>::len), Some(5), "{}", channel);
        }
    }
}
