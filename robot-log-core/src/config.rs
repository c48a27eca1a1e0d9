//! Logger configuration types
//!
//! Every field has a default so an empty config file (or none at all) yields
//! a working synthetic-mode viewer.

use crate::types::{Event, LogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Filter value that matches every channel
pub const ALL_CHANNELS: &str = "All";

/// Channels subscribed to when none are configured
pub const DEFAULT_CHANNELS: [&str; 8] = [
    "drivetrain",
    "intake",
    "shooter",
    "elevator",
    "vision",
    "auto",
    "system",
    "error",
];

/// Where channel values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Read channel values from a live telemetry table
    Live,
    /// Generate plausible fake values
    #[default]
    Synthetic,
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingMode::Live => write!(f, "live"),
            SamplingMode::Synthetic => write!(f, "synthetic"),
        }
    }
}

impl FromStr for SamplingMode {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(SamplingMode::Live),
            "synthetic" | "placeholder" => Ok(SamplingMode::Synthetic),
            other => Err(LogError::InvalidConfig(format!(
                "unknown sampling mode: {}",
                other
            ))),
        }
    }
}

/// Configuration for a logger session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Sampling strategy
    #[serde(default)]
    pub mode: SamplingMode,

    /// Time between poll ticks in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Maximum events kept in memory (<= 0 means unbounded)
    #[serde(default = "default_max_buffered")]
    pub max_buffered_events: i64,

    /// Directory that receives segment files
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,

    /// Chance per tick that the synthetic sampler produces a message
    #[serde(default = "default_probability")]
    pub synthetic_probability: f64,

    /// Channel names to subscribe to
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    /// Name of the telemetry table holding the channels
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Telemetry server address (10.TE.AM.2 convention)
    #[serde(default = "default_server_address")]
    pub server_address: String,

    /// Filter applied to the display on startup
    #[serde(default = "default_filter")]
    pub default_filter: String,
}

fn default_poll_interval() -> u64 {
    100
}

fn default_max_buffered() -> i64 {
    10_000
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("robot_logs")
}

fn default_probability() -> f64 {
    0.3
}

fn default_channels() -> Vec<String> {
    DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect()
}

fn default_table_name() -> String {
    "Logging".to_string()
}

fn default_server_address() -> String {
    "10.19.2.2".to_string()
}

fn default_filter() -> String {
    ALL_CHANNELS.to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            mode: SamplingMode::default(),
            poll_interval_ms: default_poll_interval(),
            max_buffered_events: default_max_buffered(),
            log_directory: default_log_directory(),
            synthetic_probability: default_probability(),
            channels: default_channels(),
            table_name: default_table_name(),
            server_address: default_server_address(),
            default_filter: default_filter(),
        }
    }
}

impl LoggerConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the sampling mode
    pub fn with_mode(mut self, mode: SamplingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method: set the poll interval
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Builder method: set the in-memory event limit
    pub fn with_max_buffered_events(mut self, max: i64) -> Self {
        self.max_buffered_events = max;
        self
    }

    /// Builder method: set the segment directory
    pub fn with_log_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_directory = dir.into();
        self
    }

    /// Builder method: set the synthetic message probability
    pub fn with_synthetic_probability(mut self, probability: f64) -> Self {
        self.synthetic_probability = probability;
        self
    }

    /// Builder method: replace the channel set
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method: add one channel if not already present
    pub fn add_channel(mut self, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        if !self.channels.contains(&channel) {
            self.channels.push(channel);
        }
        self
    }

    /// Builder method: set the startup filter
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Check the configuration for values the session cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.synthetic_probability) {
            return Err(LogError::InvalidConfig(format!(
                "synthetic_probability must be within [0, 1], got {}",
                self.synthetic_probability
            )));
        }

        if self.poll_interval_ms == 0 {
            return Err(LogError::InvalidConfig(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.trim().is_empty() {
                return Err(LogError::InvalidConfig(
                    "channel names must not be empty".to_string(),
                ));
            }
            if !seen.insert(channel.as_str()) {
                return Err(LogError::InvalidConfig(format!(
                    "duplicate channel: {}",
                    channel
                )));
            }
        }

        Ok(())
    }

    /// The startup filter as a [`ChannelFilter`]
    pub fn initial_filter(&self) -> ChannelFilter {
        ChannelFilter::from(self.default_filter.as_str())
    }
}

/// Which events the display (and a filtered export) should include
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelFilter {
    #[default]
    All,
    Channel(String),
}

impl ChannelFilter {
    /// Check whether an event passes this filter
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            ChannelFilter::All => true,
            ChannelFilter::Channel(channel) => event.channel == *channel,
        }
    }
}

impl From<&str> for ChannelFilter {
    fn from(value: &str) -> Self {
        if value == ALL_CHANNELS {
            ChannelFilter::All
        } else {
            ChannelFilter::Channel(value.to_string())
        }
    }
}

impl fmt::Display for ChannelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelFilter::All => write!(f, "{}", ALL_CHANNELS),
            ChannelFilter::Channel(channel) => write!(f, "{}", channel),
        }
    }
}
