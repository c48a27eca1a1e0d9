//! Robot Log Core Library
//!
//! The engine behind the robot log viewer: it samples a set of named
//! telemetry channels, turns value changes into timestamped events, keeps a
//! bounded history in memory, persists every event to a segment file and
//! exports snapshots on request.
//!
//! # Architecture
//!
//! - [`sampler`] reads raw channel values (live table or synthetic data)
//! - [`detector`] emits one event per value change and strips the robot's
//!   timestamp prefix
//! - [`buffer`] keeps the most recent events in arrival order
//! - [`sink`] appends every event to the open segment file
//! - [`export`] writes a filtered snapshot to a chosen file
//! - [`session`] owns all of the above and drives one poll tick at a time
//!
//! The library does NOT render, color, or schedule anything. The caller
//! drives [`LoggerSession::poll_now`] from its own timer and receives events
//! through [`SessionObserver`].
//!
//! # Example Usage
//!
//! ```no_run
//! use robot_log_core::{ChannelFilter, LoggerConfig, LoggerSession, SharedTable};
//! use std::path::Path;
//!
//! let config = LoggerConfig::new()
//!     .with_log_directory("robot_logs")
//!     .with_max_buffered_events(5_000);
//!
//! let mut session = LoggerSession::new(config, SharedTable::new("Logging")).unwrap();
//! session.initialize().unwrap();
//!
//! for _ in 0..100 {
//!     session.poll_now();
//! }
//!
//! session.export(Path::new("errors.txt"), &ChannelFilter::from("error"));
//! ```

// Public modules
pub mod buffer;
pub mod config;
pub mod detector;
pub mod export;
pub mod publisher;
pub mod sampler;
pub mod session;
pub mod sink;
pub mod table;
pub mod types;

// Re-export main types for convenience
pub use buffer::MessageBuffer;
pub use config::{ChannelFilter, LoggerConfig, SamplingMode, ALL_CHANNELS, DEFAULT_CHANNELS};
pub use detector::{strip_timestamp_prefix, ChangeDetector};
pub use publisher::RobotLogger;
pub use sampler::{build_sampler, ChannelSampler, LiveSampler, SampleBatch, SyntheticSampler};
pub use session::{LoggerSession, SessionNotice, SessionObserver};
pub use sink::{PersistenceSink, SegmentHandle};
pub use table::{SharedTable, TelemetrySink, TelemetrySource};
pub use types::{Event, LogError, ParsedLine, RawSample, Result, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: default config produces a synthetic session
        let config = LoggerConfig::new();
        assert_eq!(config.mode, SamplingMode::Synthetic);
        assert!(!VERSION.is_empty());
    }
}
