//! In-process telemetry table
//!
//! A named set of string slots, one per channel. The robot-side publisher
//! writes into it and the live sampler reads from it; clones share the same
//! slots, so the two sides can live on different threads.

use crate::types::{LogError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Read side of a telemetry table (one subscription per channel)
pub trait TelemetrySource {
    /// Start receiving values for a channel
    fn subscribe(&mut self, channel: &str) -> Result<()>;

    /// Current value of a subscribed channel (`None` if nothing published yet)
    fn read(&mut self, channel: &str) -> Result<Option<String>>;

    /// Whether the source can currently be read
    fn is_reachable(&mut self) -> bool;

    /// Drop every subscription
    fn close(&mut self);
}

/// Write side of a telemetry table
pub trait TelemetrySink {
    /// Announce a channel before writing to it
    fn publish(&mut self, channel: &str) -> Result<()>;

    /// Replace the current value of a channel
    fn set(&mut self, channel: &str, value: &str) -> Result<()>;
}

#[derive(Debug)]
struct TableState {
    values: HashMap<String, String>,
    published: HashSet<String>,
    subscribed: HashSet<String>,
    reachable: bool,
}

/// Shared string table implementing both telemetry sides
#[derive(Debug, Clone)]
pub struct SharedTable {
    name: String,
    state: Arc<Mutex<TableState>>,
}

impl SharedTable {
    /// Create an empty, reachable table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(TableState {
                values: HashMap::new(),
                published: HashSet::new(),
                subscribed: HashSet::new(),
                reachable: true,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mark the table as reachable or not (simulates the link to the robot)
    pub fn set_reachable(&self, reachable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.reachable = reachable;
        }
    }

    /// Current value of a channel, ignoring subscriptions
    pub fn value(&self, channel: &str) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.values.get(channel).cloned())
    }

    /// Channels that have been published, sorted by name
    pub fn published_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self
            .state
            .lock()
            .map(|state| state.published.iter().cloned().collect())
            .unwrap_or_default();
        channels.sort();
        channels
    }

    /// Number of active subscriptions
    pub fn subscription_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.subscribed.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, TableState>> {
        self.state.lock().map_err(|_| {
            LogError::ConnectionLost(format!("table '{}' lock poisoned", self.name))
        })
    }

    fn lock_reachable(&self) -> Result<MutexGuard<'_, TableState>> {
        let state = self.lock()?;
        if !state.reachable {
            return Err(LogError::ConnectionLost(format!(
                "table '{}' is unreachable",
                self.name
            )));
        }
        Ok(state)
    }
}

impl TelemetrySource for SharedTable {
    fn subscribe(&mut self, channel: &str) -> Result<()> {
        let mut state = self.lock_reachable()?;
        state.subscribed.insert(channel.to_string());
        Ok(())
    }

    fn read(&mut self, channel: &str) -> Result<Option<String>> {
        let state = self.lock_reachable()?;
        if !state.subscribed.contains(channel) {
            return Ok(None);
        }
        Ok(state.values.get(channel).cloned())
    }

    fn is_reachable(&mut self) -> bool {
        self.lock().map(|state| state.reachable).unwrap_or(false)
    }

    fn close(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.subscribed.clear();
        }
    }
}

impl TelemetrySink for SharedTable {
    fn publish(&mut self, channel: &str) -> Result<()> {
        let mut state = self.lock_reachable()?;
        state.published.insert(channel.to_string());
        Ok(())
    }

    fn set(&mut self, channel: &str, value: &str) -> Result<()> {
        let mut state = self.lock_reachable()?;
        state.values.insert(channel.to_string(), value.to_string());
        Ok(())
    }
}
