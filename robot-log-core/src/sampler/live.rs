//! Live sampling from a telemetry table
//!
//! One subscription is held per registered channel. A read failure is never
//! raised to the caller: the sampler reports the connection as lost once,
//! stops reading, and probes the source on later ticks until it answers again.

use super::{ChannelSampler, SampleBatch};
use crate::config::SamplingMode;
use crate::table::TelemetrySource;
use crate::types::RawSample;

/// Sampler that reads channel values from a [`TelemetrySource`]
pub struct LiveSampler<S: TelemetrySource> {
    source: S,
    /// Subscribed channels in registration order
    channels: Vec<String>,
    connected: bool,
    /// Set by `disconnect`; a closed sampler never reconnects on its own
    closed: bool,
}

impl<S: TelemetrySource> LiveSampler<S> {
    /// Subscribe to every channel on the source
    ///
    /// A subscription failure leaves the sampler disconnected; it will retry
    /// the missing subscriptions when the source becomes reachable.
    pub fn connect<C: AsRef<str>>(source: S, channels: &[C]) -> Self {
        let mut sampler = Self {
            source,
            channels: Vec::new(),
            connected: true,
            closed: false,
        };

        for channel in channels {
            let channel = channel.as_ref();
            if sampler.channels.iter().any(|c| c == channel) {
                continue;
            }
            sampler.channels.push(channel.to_string());
        }

        if let Err(e) = sampler.subscribe_all() {
            log::error!("Error initializing telemetry subscriptions: {}", e);
            sampler.connected = false;
        } else {
            log::info!("Subscribed to {} channels", sampler.channels.len());
        }

        sampler
    }

    /// Channels currently subscribed
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Access the underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    fn subscribe_all(&mut self) -> crate::types::Result<()> {
        for channel in &self.channels {
            self.source.subscribe(channel)?;
        }
        Ok(())
    }

    /// Try to re-establish the link; returns true when it came back
    fn try_reconnect(&mut self) -> bool {
        if !self.source.is_reachable() {
            return false;
        }
        match self.subscribe_all() {
            Ok(()) => {
                log::info!("Telemetry source reachable again");
                self.connected = true;
                true
            }
            Err(e) => {
                log::debug!("Reconnect attempt failed: {}", e);
                false
            }
        }
    }
}

impl<S: TelemetrySource> ChannelSampler for LiveSampler<S> {
    fn poll(&mut self) -> SampleBatch {
        let mut batch = SampleBatch::default();

        if self.closed {
            return batch;
        }

        if !self.connected {
            if !self.try_reconnect() {
                return batch;
            }
            batch.connectivity = Some(true);
        }

        for channel in &self.channels {
            match self.source.read(channel) {
                Ok(Some(value)) if !value.is_empty() => {
                    batch.samples.push(RawSample::new(channel.clone(), value));
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Error reading telemetry: {}", e);
                    self.connected = false;
                    batch.connectivity = Some(false);
                    break;
                }
            }
        }

        batch
    }

    fn register_channel(&mut self, channel: &str) {
        if self.channels.iter().any(|c| c == channel) {
            return;
        }

        self.channels.push(channel.to_string());
        if self.connected && !self.closed {
            if let Err(e) = self.source.subscribe(channel) {
                log::warn!("Failed to subscribe to {}: {}", channel, e);
            }
        }
    }

    fn disconnect(&mut self) {
        if self.closed {
            return;
        }
        log::info!("Closing {} telemetry subscriptions", self.channels.len());
        self.source.close();
        self.channels.clear();
        self.connected = false;
        self.closed = true;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn mode(&self) -> SamplingMode {
        SamplingMode::Live
    }
}
