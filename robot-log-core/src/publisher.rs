//! Robot-side log publisher
//!
//! Robot code writes short messages into one string slot per subsystem. Each
//! message is prefixed with the robot's time of day so the viewer can tell
//! two identical messages apart.

use crate::config::DEFAULT_CHANNELS;
use crate::table::TelemetrySink;
use crate::types::{Result, TIME_OF_DAY_FORMAT};
use chrono::Local;
use std::collections::HashSet;

/// Publishes log messages into a telemetry table
pub struct RobotLogger<T: TelemetrySink> {
    sink: T,
    published: HashSet<String>,
    initialized: bool,
}

impl<T: TelemetrySink> RobotLogger<T> {
    /// Wrap a telemetry sink; nothing is published until first use
    pub fn new(sink: T) -> Self {
        Self {
            sink,
            published: HashSet::new(),
            initialized: false,
        }
    }

    /// Publish the default subsystem channels (only the first call does work)
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        for channel in DEFAULT_CHANNELS {
            self.publish(channel)?;
        }
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn publish(&mut self, channel: &str) -> Result<()> {
        if !self.published.contains(channel) {
            self.sink.publish(channel)?;
            self.published.insert(channel.to_string());
        }
        Ok(())
    }

    /// Write a message to a channel, publishing the channel if it is new
    pub fn log(&mut self, channel: &str, message: &str) -> Result<()> {
        self.initialize()?;
        self.publish(channel)?;

        let formatted = format!("[{}] {}", Local::now().format(TIME_OF_DAY_FORMAT), message);
        self.sink.set(channel, &formatted)
    }

    pub fn log_drivetrain(&mut self, message: &str) -> Result<()> {
        self.log("drivetrain", message)
    }

    pub fn log_intake(&mut self, message: &str) -> Result<()> {
        self.log("intake", message)
    }

    pub fn log_shooter(&mut self, message: &str) -> Result<()> {
        self.log("shooter", message)
    }

    pub fn log_elevator(&mut self, message: &str) -> Result<()> {
        self.log("elevator", message)
    }

    pub fn log_vision(&mut self, message: &str) -> Result<()> {
        self.log("vision", message)
    }

    pub fn log_auto(&mut self, message: &str) -> Result<()> {
        self.log("auto", message)
    }

    pub fn log_system(&mut self, message: &str) -> Result<()> {
        self.log("system", message)
    }

    pub fn log_error(&mut self, message: &str) -> Result<()> {
        self.log("error", message)
    }
}
