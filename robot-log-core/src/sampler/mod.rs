//! Channel samplers
//!
//! A sampler reads the current value of every registered channel once per
//! poll tick. Two strategies sit behind the [`ChannelSampler`] trait:
//! - [`LiveSampler`] reads a telemetry table
//! - [`SyntheticSampler`] generates plausible robot messages for testing
//!
//! Deciding whether a value actually changed is left to the change detector.

use crate::config::{LoggerConfig, SamplingMode};
use crate::table::SharedTable;
use crate::types::RawSample;

pub mod live;
pub mod synthetic;
pub mod templates;

pub use live::LiveSampler;
pub use synthetic::SyntheticSampler;

/// Result of one poll tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleBatch {
    /// Channels holding a non-empty value this tick
    pub samples: Vec<RawSample>,
    /// Set when connectivity changed during this tick
    pub connectivity: Option<bool>,
}

impl SampleBatch {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.connectivity.is_none()
    }
}

/// Common interface for all sampling strategies
pub trait ChannelSampler {
    /// Sample every registered channel once
    fn poll(&mut self) -> SampleBatch;

    /// Add a channel at runtime (no-op if already registered)
    fn register_channel(&mut self, channel: &str);

    /// Tear down subscriptions
    fn disconnect(&mut self);

    /// Whether the sampler currently considers its source reachable
    fn is_connected(&self) -> bool;

    /// Which strategy this is
    fn mode(&self) -> SamplingMode;
}

/// Build the sampler selected by the configuration
///
/// The live strategy reads from `table`; the synthetic strategy ignores it.
pub fn build_sampler(config: &LoggerConfig, table: SharedTable) -> Box<dyn ChannelSampler> {
    log::info!("Building {} sampler", config.mode);
    match config.mode {
        SamplingMode::Live => Box::new(LiveSampler::connect(table, &config.channels)),
        SamplingMode::Synthetic => Box::new(SyntheticSampler::from_entropy(
            config.channels.clone(),
            config.synthetic_probability,
        )),
    }
}
