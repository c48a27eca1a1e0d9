//! Console display
//!
//! Prints every event that passes the session's filter, one per line.
//! Connectivity and status changes go through the logger so they never mix
//! with the event stream on stdout.

use crate::config::DisplayConfig;
use robot_log_core::{Event, SessionObserver};
use std::io::{self, Write};

/// Session observer that writes events to a text stream
pub struct ConsoleDisplay<W: Write> {
    out: W,
    settings: DisplayConfig,
}

impl ConsoleDisplay<io::Stdout> {
    pub fn stdout(settings: DisplayConfig) -> Self {
        Self::new(io::stdout(), settings)
    }
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W, settings: DisplayConfig) -> Self {
        Self { out, settings }
    }

    fn render(&self, event: &Event) -> String {
        if self.settings.json {
            match serde_json::to_string(event) {
                Ok(json) => return json,
                Err(e) => log::warn!("Could not encode event as JSON: {}", e),
            }
        }
        event.to_string()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SessionObserver for ConsoleDisplay<W> {
    fn on_event(&mut self, event: &Event) {
        let line = self.render(event);
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|()| self.out.flush()) {
            log::error!("Error writing to console: {}", e);
        }
    }

    fn on_connectivity_changed(&mut self, connected: bool) {
        if !self.settings.show_connectivity {
            return;
        }
        if connected {
            log::info!("Connected");
        } else {
            log::warn!("Disconnected");
        }
    }

    fn on_status(&mut self, message: &str) {
        log::debug!("Status: {}", message);
    }
}
