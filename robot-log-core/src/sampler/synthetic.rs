//! Synthetic sampling
//!
//! Produces at most one fake message per tick so the viewer can be exercised
//! without a robot. Messages carry the same `[HH:MM:SS.mmm] ` prefix the
//! robot-side publisher adds.

use super::templates::TemplateSet;
use super::{ChannelSampler, SampleBatch};
use crate::config::SamplingMode;
use crate::types::{RawSample, TIME_OF_DAY_FORMAT};
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sampler that manufactures templated robot messages
pub struct SyntheticSampler<R: Rng = StdRng> {
    channels: Vec<String>,
    probability: f64,
    templates: TemplateSet,
    rng: R,
}

impl SyntheticSampler<StdRng> {
    /// Create a sampler seeded from the OS
    pub fn from_entropy(channels: Vec<String>, probability: f64) -> Self {
        Self::with_rng(channels, probability, StdRng::from_entropy())
    }

    /// Create a reproducible sampler
    pub fn seeded(channels: Vec<String>, probability: f64, seed: u64) -> Self {
        Self::with_rng(channels, probability, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SyntheticSampler<R> {
    /// Create a sampler with a caller-supplied random source
    ///
    /// The probability is clamped into `[0, 1]`.
    pub fn with_rng(channels: Vec<String>, probability: f64, rng: R) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };

        Self {
            channels,
            probability,
            templates: TemplateSet::default(),
            rng,
        }
    }

    /// Replace the template table
    pub fn with_templates(mut self, templates: TemplateSet) -> Self {
        self.templates = templates;
        self
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Build one message for a channel, prefixed like a robot would send it
    pub fn generate_message(&mut self, channel: &str) -> String {
        let body = self.templates.random_message(channel, &mut self.rng);
        format!("[{}] {}", Local::now().format(TIME_OF_DAY_FORMAT), body)
    }
}

impl<R: Rng> ChannelSampler for SyntheticSampler<R> {
    fn poll(&mut self) -> SampleBatch {
        let mut batch = SampleBatch::default();

        if self.channels.is_empty() || !self.rng.gen_bool(self.probability) {
            return batch;
        }

        let index = self.rng.gen_range(0..self.channels.len());
        let channel = self.channels[index].clone();
        let value = self.generate_message(&channel);
        batch.samples.push(RawSample::new(channel, value));

        batch
    }

    fn register_channel(&mut self, channel: &str) {
        if !self.channels.iter().any(|c| c == channel) {
            self.channels.push(channel.to_string());
        }
    }

    fn disconnect(&mut self) {
        log::debug!("Synthetic sampler has no subscriptions to close");
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn mode(&self) -> SamplingMode {
        SamplingMode::Synthetic
    }
}
