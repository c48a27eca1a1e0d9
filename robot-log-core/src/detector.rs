//! Change detection
//!
//! Turns raw channel samples into events. A channel value is only reported
//! when it differs from the last value seen on that channel, so a publisher
//! that keeps the same string in its slot produces a single event.

use crate::types::Event;
use std::collections::HashMap;

/// Remove a leading `[...]` token and the separator that follows it
///
/// The cut runs from the opening bracket through the first `]` plus one more
/// character. A string that starts with `[` but never closes it is returned
/// unchanged.
pub fn strip_timestamp_prefix(raw: &str) -> &str {
    if !raw.starts_with('[') {
        return raw;
    }

    let Some(close) = raw.find(']') else {
        return raw;
    };

    let after_bracket = &raw[close + 1..];
    let mut chars = after_bracket.chars();
    chars.next();
    chars.as_str()
}

/// Tracks the last raw value per channel and emits one event per change
#[derive(Debug, Default)]
pub struct ChangeDetector {
    /// Last observed raw value per channel ("" = never seen)
    last_values: HashMap<String, String>,
}

impl ChangeDetector {
    /// Create an empty detector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with the given channels pre-registered
    pub fn with_channels<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut detector = Self::new();
        for channel in channels {
            detector.register_channel(channel.as_ref());
        }
        detector
    }

    /// Register a channel; registering a known channel does nothing
    pub fn register_channel(&mut self, channel: &str) {
        if !self.last_values.contains_key(channel) {
            log::debug!("Registering channel: {}", channel);
            self.last_values.insert(channel.to_string(), String::new());
        }
    }

    /// Check whether a channel has been registered or observed
    pub fn is_registered(&self, channel: &str) -> bool {
        self.last_values.contains_key(channel)
    }

    /// Number of known channels
    pub fn channel_count(&self) -> usize {
        self.last_values.len()
    }

    /// Last raw value seen on a channel, if any
    pub fn last_value(&self, channel: &str) -> Option<&str> {
        self.last_values
            .get(channel)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Feed one raw sample
    ///
    /// # Returns
    /// * `Some(Event)` if the value is non-empty and differs from the last one
    /// * `None` for empty values and repeats
    pub fn observe(&mut self, channel: &str, raw_value: &str) -> Option<Event> {
        if raw_value.is_empty() {
            return None;
        }

        match self.last_values.get_mut(channel) {
            Some(last) if last.as_str() == raw_value => return None,
            Some(last) => {
                last.clear();
                last.push_str(raw_value);
            }
            None => {
                self.last_values
                    .insert(channel.to_string(), raw_value.to_string());
            }
        }

        let text = strip_timestamp_prefix(raw_value);
        log::trace!("Change on {}: {:?}", channel, text);
        Some(Event::new(channel, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix() {
        assert_eq!(
            strip_timestamp_prefix("[12:00:00.000] Motor speeds normalized"),
            "Motor speeds normalized"
        );
        assert_eq!(strip_timestamp_prefix("no bracket here"), "no bracket here");
    }

    #[test]
    fn test_strip_prefix_malformed_bracket() {
        assert_eq!(
            strip_timestamp_prefix("[12:00:00 unterminated"),
            "[12:00:00 unterminated"
        );
    }

    #[test]
    fn test_strip_prefix_edge_cases() {
        // Closing bracket is the last character: nothing remains
        assert_eq!(strip_timestamp_prefix("[only]"), "");
        // Separator after the bracket is dropped whatever it is
        assert_eq!(strip_timestamp_prefix("[t]xbody"), "body");
        // Multi-byte separator does not split a code point
        assert_eq!(strip_timestamp_prefix("[t]°C rising"), "C rising");
        // Bracket not at the start is left alone
        assert_eq!(strip_timestamp_prefix("a [b] c"), "a [b] c");
    }

    #[test]
    fn test_observe_emits_on_change_only() {
        let mut detector = ChangeDetector::with_channels(["drivetrain", "error"]);

        let first = detector.observe("drivetrain", "[00:00:01.000] A");
        let repeat = detector.observe("drivetrain", "[00:00:01.000] A");
        let second = detector.observe("drivetrain", "[00:00:03.000] B");

        assert_eq!(first.unwrap().text, "A");
        assert!(repeat.is_none());
        assert_eq!(second.unwrap().text, "B");
    }

    #[test]
    fn test_raw_value_equality_decides_change() {
        // Change is judged on the raw slot value, prefix included, so the
        // same body re-sent under a new robot timestamp is a new event
        let mut detector = ChangeDetector::with_channels(["drivetrain", "error"]);
        let texts: Vec<String> = [
            "[00:00:01.000] A",
            "[00:00:02.000] A",
            "[00:00:03.000] B",
        ]
        .iter()
        .filter_map(|raw| detector.observe("drivetrain", raw))
        .map(|event| event.text)
        .collect();

        assert_eq!(texts, vec!["A", "A", "B"]);
        assert!(detector.observe("drivetrain", "[00:00:03.000] B").is_none());
    }

    #[test]
    fn test_empty_values_ignored() {
        let mut detector = ChangeDetector::new();
        assert!(detector.observe("vision", "").is_none());
        assert!(detector.last_value("vision").is_none());
    }

    #[test]
    fn test_unknown_channel_created_on_first_observation() {
        let mut detector = ChangeDetector::new();
        assert!(!detector.is_registered("climber"));

        let event = detector.observe("climber", "Climb started").unwrap();
        assert_eq!(event.channel, "climber");
        assert_eq!(event.text, "Climb started");
        assert!(detector.is_registered("climber"));
        assert_eq!(detector.last_value("climber"), Some("Climb started"));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut detector = ChangeDetector::new();
        detector.register_channel("intake");
        detector.observe("intake", "Retracting intake");
        detector.register_channel("intake");

        assert_eq!(detector.channel_count(), 1);
        // Re-registering must not reset the stored value
        assert!(detector.observe("intake", "Retracting intake").is_none());
    }

    #[test]
    fn test_one_event_per_run_of_equal_values() {
        let mut detector = ChangeDetector::new();
        let samples = ["a", "a", "", "a", "b", "b", "", "", "c", "a", "a"];
        let emitted = samples
            .iter()
            .filter_map(|raw| detector.observe("system", raw))
            .count();

        // Runs of non-empty values (empties skipped): a, b, c, a
        assert_eq!(emitted, 4);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut detector = ChangeDetector::new();
        assert!(detector.observe("intake", "same").is_some());
        assert!(detector.observe("shooter", "same").is_some());
        assert!(detector.observe("intake", "same").is_none());
    }
}
