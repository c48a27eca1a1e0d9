//! Core types for the robot log core library
//!
//! This module defines the event that flows through the whole pipeline, its
//! canonical text rendering, and the error type shared by every component.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the library (wall-clock local time)
pub type Timestamp = DateTime<Local>;

/// Result type for library operations
pub type Result<T> = std::result::Result<T, LogError>;

/// strftime pattern for the time-of-day part of a rendered event
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S%.3f";

/// Separator line used by segment and export headers
pub const HEADER_SEPARATOR: &str =
    "================================================================================";

/// Errors that can occur inside the core
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Telemetry connection lost: {0}")]
    ConnectionLost(String),

    #[error("No log segment is open")]
    SegmentNotOpen,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Export failed: {0}")]
    Export(String),
}

/// One normalized, timestamped log message attributed to a channel
///
/// Events are immutable once constructed. The message body never carries the
/// robot's own `[HH:MM:SS.mmm] ` prefix; that is consumed by the change
/// detector before the event is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Subsystem that produced the message (e.g. "drivetrain", "error")
    pub channel: String,
    /// Message body
    pub text: String,
    /// When the event was observed
    pub occurred_at: Timestamp,
}

impl Event {
    /// Create an event stamped with the current time
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_timestamp(channel, text, Local::now())
    }

    /// Create an event with an explicit timestamp
    pub fn with_timestamp(
        channel: impl Into<String>,
        text: impl Into<String>,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
            occurred_at,
        }
    }

    /// Time of day with millisecond precision, e.g. `14:03:07.042`
    pub fn formatted_time(&self) -> String {
        self.occurred_at.format(TIME_OF_DAY_FORMAT).to_string()
    }

    /// Split a canonical line back into its time, channel and text parts
    ///
    /// Returns `None` when the line is not in `[time] [channel] text` form
    /// (e.g. header lines of a segment file).
    pub fn parse_line(line: &str) -> Option<ParsedLine<'_>> {
        let rest = line.strip_prefix('[')?;
        let (time, rest) = rest.split_once("] [")?;
        let (channel, text) = rest.split_once("] ")?;
        Some(ParsedLine {
            time,
            channel,
            text,
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.occurred_at.format(TIME_OF_DAY_FORMAT),
            self.channel,
            self.text
        )
    }
}

/// Borrowed view of a canonical event line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub time: &'a str,
    pub channel: &'a str,
    pub text: &'a str,
}

/// Raw value read from a channel during one poll tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    pub channel: String,
    pub value: String,
}

impl RawSample {
    pub fn new(channel: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            value: value.into(),
        }
    }
}
