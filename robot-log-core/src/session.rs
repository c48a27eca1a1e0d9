//! Logger session
//!
//! The session owns every core component and runs the pipeline once per
//! poll tick:
//!
//! ```text
//! sampler -> change detector -> buffer (bounded)
//!                            -> segment file
//!                            -> observers (if the event passes the filter)
//! ```
//!
//! All work happens on the caller's thread; the caller decides how ticks are
//! scheduled. Failures inside a tick are logged and surfaced as status
//! messages, never returned.

use crate::buffer::MessageBuffer;
use crate::config::{ChannelFilter, LoggerConfig};
use crate::detector::ChangeDetector;
use crate::export;
use crate::sampler::{build_sampler, ChannelSampler};
use crate::sink::{PersistenceSink, SegmentHandle};
use crate::table::SharedTable;
use crate::types::{Event, Result};
use std::path::Path;
use std::sync::mpsc::Sender;

/// Receives notifications from a [`LoggerSession`]
///
/// Every method has an empty default so observers only implement what they
/// care about.
pub trait SessionObserver {
    /// A new event passed the active filter
    fn on_event(&mut self, _event: &Event) {}

    /// The telemetry source became reachable or unreachable
    fn on_connectivity_changed(&mut self, _connected: bool) {}

    /// Human-readable status line (e.g. "Logs cleared")
    fn on_status(&mut self, _message: &str) {}
}

/// Owned copy of a session notification, for queue-based observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    Event(Event),
    Connectivity(bool),
    Status(String),
}

impl SessionObserver for Sender<SessionNotice> {
    fn on_event(&mut self, event: &Event) {
        let _ = self.send(SessionNotice::Event(event.clone()));
    }

    fn on_connectivity_changed(&mut self, connected: bool) {
        let _ = self.send(SessionNotice::Connectivity(connected));
    }

    fn on_status(&mut self, message: &str) {
        let _ = self.send(SessionNotice::Status(message.to_string()));
    }
}

/// Top-level owner of the logging pipeline
pub struct LoggerSession {
    config: LoggerConfig,
    sampler: Box<dyn ChannelSampler>,
    detector: ChangeDetector,
    buffer: MessageBuffer,
    sink: PersistenceSink,
    filter: ChannelFilter,
    paused: bool,
    observers: Vec<Box<dyn SessionObserver>>,
    /// Last connectivity reported to observers
    connected: Option<bool>,
    /// Set once the "no open segment" warning has been logged
    warned_unpersisted: bool,
}

impl LoggerSession {
    /// Validate the configuration and build the configured sampler
    ///
    /// `table` is only read in live mode.
    pub fn new(config: LoggerConfig, table: SharedTable) -> Result<Self> {
        config.validate()?;
        let sampler = build_sampler(&config, table);
        Ok(Self::with_sampler(config, sampler))
    }

    /// Build a session around an existing sampler
    pub fn with_sampler(config: LoggerConfig, sampler: Box<dyn ChannelSampler>) -> Self {
        Self {
            detector: ChangeDetector::with_channels(&config.channels),
            buffer: MessageBuffer::new(config.max_buffered_events),
            sink: PersistenceSink::new(config.log_directory.clone()),
            filter: config.initial_filter(),
            paused: false,
            observers: Vec::new(),
            connected: None,
            warned_unpersisted: false,
            sampler,
            config,
        }
    }

    /// Register an observer
    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Open the first segment and report the initial connectivity
    pub fn initialize(&mut self) -> Result<SegmentHandle> {
        let connected = self.sampler.is_connected();
        self.emit_connectivity(connected);
        self.start_new_segment()
    }

    /// Close the current segment (if any) and open a fresh one
    pub fn start_new_segment(&mut self) -> Result<SegmentHandle> {
        match self.sink.begin_segment() {
            Ok(handle) => {
                self.warned_unpersisted = false;
                self.emit_status(format!("Logging to: {}", handle.file_name()));
                Ok(handle)
            }
            Err(e) => {
                self.emit_status(format!("Could not open log file: {}", e));
                Err(e)
            }
        }
    }

    /// Run one sampling tick; returns the number of events accepted
    pub fn poll_now(&mut self) -> usize {
        let batch = self.sampler.poll();

        if let Some(connected) = batch.connectivity {
            self.emit_connectivity(connected);
        }

        let mut accepted = 0;
        for sample in batch.samples {
            if let Some(event) = self.detector.observe(&sample.channel, &sample.value) {
                if self.push_event(event) {
                    accepted += 1;
                }
            }
        }
        accepted
    }

    /// Feed an already-normalized event through buffer, segment and display
    ///
    /// Returns `false` when the session is paused and the event was dropped.
    /// Without an open segment (before `initialize`) the event is buffered and
    /// displayed but not saved, and a warning is logged once.
    pub fn push_event(&mut self, event: Event) -> bool {
        if self.paused {
            log::trace!("Paused, dropping event from {}", event.channel);
            return false;
        }

        if self.sink.is_open() {
            if let Err(e) = self.sink.write(&event) {
                log::error!("Error writing to log file: {}", e);
                self.emit_status(format!("Error writing to log file: {}", e));
            }
        } else if !self.warned_unpersisted {
            log::warn!("No open log segment; events are not being saved (call initialize first)");
            self.warned_unpersisted = true;
        }

        if self.filter.matches(&event) {
            for observer in &mut self.observers {
                observer.on_event(&event);
            }
        }

        if let Some(evicted) = self.buffer.append(event) {
            log::trace!("Evicted oldest event from {}", evicted.channel);
        }
        true
    }

    /// Add a channel at runtime (no-op if already known)
    pub fn register_channel(&mut self, channel: &str) {
        self.detector.register_channel(channel);
        self.sampler.register_channel(channel);
    }

    /// Tear down live subscriptions
    pub fn disconnect(&mut self) {
        self.sampler.disconnect();
        if !self.sampler.is_connected() {
            self.emit_connectivity(false);
        }
    }

    /// Export buffered events matching `filter`
    pub fn export(&mut self, destination: &Path, filter: &ChannelFilter) -> bool {
        let events = self.buffer.snapshot();
        let ok = export::export(destination, &events, filter);
        if ok {
            self.emit_status(format!("Exported to: {}", destination.display()));
        } else {
            self.emit_status("Export failed".to_string());
        }
        ok
    }

    /// Export using the active display filter
    pub fn export_current(&mut self, destination: &Path) -> bool {
        let filter = self.filter.clone();
        self.export(destination, &filter)
    }

    /// Change the display filter and return the events now visible
    pub fn set_filter(&mut self, filter: ChannelFilter) -> Vec<Event> {
        log::debug!("Filter changed to {}", filter);
        self.filter = filter;
        self.visible_events()
    }

    pub fn filter(&self) -> &ChannelFilter {
        &self.filter
    }

    /// Buffered events passing the active filter, oldest first
    pub fn visible_events(&self) -> Vec<Event> {
        self.buffer.filtered(|event| self.filter.matches(event))
    }

    /// Every buffered event, oldest first
    pub fn events(&self) -> Vec<Event> {
        self.buffer.snapshot()
    }

    /// Drop every buffered event (the segment file is untouched)
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.emit_status("Logs cleared".to_string());
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Flip the pause flag and return the new state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of buffered events
    pub fn message_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn current_segment(&self) -> Option<&SegmentHandle> {
        self.sink.current_segment()
    }

    /// Segment files on disk, newest first
    pub fn list_segments(&self) -> Result<Vec<std::path::PathBuf>> {
        self.sink.list_segments()
    }

    /// Last connectivity reported (`None` before `initialize`)
    pub fn connectivity(&self) -> Option<bool> {
        self.connected
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Disconnect the sampler and close the segment
    ///
    /// Runs even after a connection loss so live subscriptions are released.
    pub fn shutdown(&mut self) {
        self.disconnect();
        self.sink.end_segment();
    }

    fn emit_connectivity(&mut self, connected: bool) {
        if self.connected == Some(connected) {
            return;
        }
        self.connected = Some(connected);
        if connected {
            log::info!("Telemetry connected");
        } else {
            log::warn!("Telemetry disconnected");
        }
        for observer in &mut self.observers {
            observer.on_connectivity_changed(connected);
        }
    }

    fn emit_status(&mut self, message: String) {
        log::info!("{}", message);
        for observer in &mut self.observers {
            observer.on_status(&message);
        }
    }
}

impl Drop for LoggerSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingMode;
    use crate::sampler::SampleBatch;
    use crate::types::RawSample;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::rc::Rc;
    use std::sync::mpsc::{channel, Receiver};
    use tempfile::TempDir;

    /// Sampler that replays a fixed list of batches
    struct ScriptedSampler {
        ticks: VecDeque<SampleBatch>,
        connected: bool,
        registered: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedSampler {
        fn new(ticks: Vec<Vec<(&str, &str)>>) -> Self {
            let ticks = ticks
                .into_iter()
                .map(|samples| SampleBatch {
                    samples: samples
                        .into_iter()
                        .map(|(c, v)| RawSample::new(c, v))
                        .collect(),
                    connectivity: None,
                })
                .collect();
            Self {
                ticks,
                connected: true,
                registered: Rc::default(),
            }
        }
    }

    impl ChannelSampler for ScriptedSampler {
        fn poll(&mut self) -> SampleBatch {
            self.ticks.pop_front().unwrap_or_default()
        }

        fn register_channel(&mut self, channel: &str) {
            self.registered.borrow_mut().push(channel.to_string());
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn mode(&self) -> SamplingMode {
            SamplingMode::Live
        }
    }

    fn session_with(
        dir: &TempDir,
        max: i64,
        ticks: Vec<Vec<(&str, &str)>>,
    ) -> (LoggerSession, Receiver<SessionNotice>) {
        let config = LoggerConfig::new()
            .with_log_directory(dir.path())
            .with_max_buffered_events(max)
            .with_channels(["drivetrain", "error"]);
        let mut session =
            LoggerSession::with_sampler(config, Box::new(ScriptedSampler::new(ticks)));
        let (tx, rx) = channel();
        session.subscribe(Box::new(tx));
        (session, rx)
    }

    fn displayed(rx: &Receiver<SessionNotice>) -> Vec<String> {
        rx.try_iter()
            .filter_map(|notice| match notice {
                SessionNotice::Event(event) => Some(event.text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initialize_reports_connectivity_and_segment() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(&dir, 10, Vec::new());

        let handle = session.initialize().unwrap();
        let notices: Vec<SessionNotice> = rx.try_iter().collect();

        assert_eq!(notices[0], SessionNotice::Connectivity(true));
        assert_eq!(
            notices[1],
            SessionNotice::Status(format!("Logging to: {}", handle.file_name()))
        );
        assert_eq!(session.connectivity(), Some(true));
        assert!(handle.path.exists());
    }

    #[test]
    fn test_poll_detects_changes_only() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(
            &dir,
            10,
            vec![
                vec![("drivetrain", "[00:00:01.000] A")],
                vec![("drivetrain", "[00:00:01.000] A")],
                vec![("drivetrain", "[00:00:03.000] B"), ("error", "Brownout detected")],
            ],
        );
        session.initialize().unwrap();

        let accepted: Vec<usize> = (0..4).map(|_| session.poll_now()).collect();
        assert_eq!(accepted, vec![1, 0, 2, 0]);
        assert_eq!(displayed(&rx), vec!["A", "B", "Brownout detected"]);
        assert_eq!(session.message_count(), 3);
    }

    #[test]
    fn test_buffer_evicts_but_segment_keeps_everything() {
        let dir = TempDir::new().unwrap();
        let ticks = (1..=5)
            .map(|n| vec![("error", ["E1", "E2", "E3", "E4", "E5"][n - 1])])
            .collect();
        let (mut session, _rx) = session_with(&dir, 3, ticks);
        let handle = session.initialize().unwrap();

        for _ in 0..5 {
            session.poll_now();
        }

        let texts: Vec<String> = session.events().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["E3", "E4", "E5"]);

        let content = fs::read_to_string(&handle.path).unwrap();
        let logged: Vec<&str> = content
            .lines()
            .filter_map(|line| Event::parse_line(line).map(|p| p.text))
            .collect();
        assert_eq!(logged, vec!["E1", "E2", "E3", "E4", "E5"]);
    }

    #[test]
    fn test_filter_limits_display_not_buffer() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(
            &dir,
            0,
            vec![vec![("drivetrain", "Brake mode engaged"), ("error", "Brownout detected")]],
        );
        session.set_filter(ChannelFilter::from("error"));
        session.poll_now();

        assert_eq!(displayed(&rx), vec!["Brownout detected"]);
        assert_eq!(session.message_count(), 2);

        let visible = session.set_filter(ChannelFilter::All);
        assert_eq!(visible.len(), 2);
        assert_eq!(session.visible_events(), session.events());
    }

    #[test]
    fn test_pause_drops_events() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(
            &dir,
            0,
            vec![vec![("error", "first")], vec![("error", "second")]],
        );

        assert!(session.toggle_pause());
        assert_eq!(session.poll_now(), 0);
        session.set_paused(false);
        assert_eq!(session.poll_now(), 1);

        assert_eq!(displayed(&rx), vec!["second"]);
    }

    #[test]
    fn test_export_uses_filter() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(
            &dir,
            0,
            vec![vec![("drivetrain", "Brake mode engaged"), ("error", "Brownout detected")]],
        );
        session.poll_now();
        session.set_filter(ChannelFilter::from("error"));

        let dest = dir.path().join("export.txt");
        assert!(session.export_current(&dest));
        let content = fs::read_to_string(&dest).unwrap();
        assert!(content.contains("Total Messages: 1"));
        assert!(content.contains("[error] Brownout detected"));
        assert!(!content.contains("drivetrain"));

        let statuses: Vec<SessionNotice> = rx
            .try_iter()
            .filter(|n| matches!(n, SessionNotice::Status(_)))
            .collect();
        assert_eq!(
            statuses,
            vec![SessionNotice::Status(format!("Exported to: {}", dest.display()))]
        );
    }

    #[test]
    fn test_export_failure_reports_status() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(&dir, 0, Vec::new());
        let dest = dir.path().join("no_such_dir").join("export.txt");

        assert!(!session.export(&dest, &ChannelFilter::All));
        assert!(rx
            .try_iter()
            .any(|n| n == SessionNotice::Status("Export failed".to_string())));
    }

    #[test]
    fn test_clear_empties_buffer() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(&dir, 0, vec![vec![("error", "x")]]);
        session.poll_now();
        session.clear();

        assert_eq!(session.message_count(), 0);
        assert!(rx
            .try_iter()
            .any(|n| n == SessionNotice::Status("Logs cleared".to_string())));
    }

    #[test]
    fn test_disconnect_emits_once() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(&dir, 0, Vec::new());
        session.initialize().unwrap();
        session.disconnect();
        session.disconnect();

        let connectivity: Vec<SessionNotice> = rx
            .try_iter()
            .filter(|n| matches!(n, SessionNotice::Connectivity(_)))
            .collect();
        assert_eq!(
            connectivity,
            vec![
                SessionNotice::Connectivity(true),
                SessionNotice::Connectivity(false)
            ]
        );
    }

    #[test]
    fn test_register_channel_reaches_sampler() {
        let dir = TempDir::new().unwrap();
        let sampler = ScriptedSampler::new(Vec::new());
        let registered = Rc::clone(&sampler.registered);
        let mut session = LoggerSession::with_sampler(
            LoggerConfig::new().with_log_directory(dir.path()),
            Box::new(sampler),
        );

        session.register_channel("climber");
        assert_eq!(*registered.borrow(), vec!["climber".to_string()]);
    }

    #[test]
    fn test_events_before_initialize_are_kept_but_not_saved() {
        let dir = TempDir::new().unwrap();
        let (mut session, rx) = session_with(
            &dir,
            0,
            vec![vec![("error", "early")], vec![("error", "later")]],
        );

        assert_eq!(session.poll_now(), 1);
        assert!(session.current_segment().is_none());
        assert!(session.warned_unpersisted);
        assert_eq!(displayed(&rx), vec!["early"]);

        let handle = session.initialize().unwrap();
        assert!(!session.warned_unpersisted);
        session.poll_now();

        let content = fs::read_to_string(&handle.path).unwrap();
        assert!(!content.contains("early"));
        assert!(content.contains("[error] later"));
        assert_eq!(session.message_count(), 2);
    }

    #[test]
    fn test_shutdown_after_connection_loss_closes_subscriptions() {
        let dir = TempDir::new().unwrap();
        let table = SharedTable::new("Logging");
        let config = LoggerConfig::new()
            .with_mode(SamplingMode::Live)
            .with_log_directory(dir.path())
            .with_channels(["error"]);
        let mut session = LoggerSession::new(config, table.clone()).unwrap();
        session.initialize().unwrap();
        assert_eq!(table.subscription_count(), 1);

        table.set_reachable(false);
        session.poll_now();
        assert_eq!(session.connectivity(), Some(false));

        table.set_reachable(true);
        session.shutdown();
        assert_eq!(table.subscription_count(), 0);
    }

    #[test]
    fn test_drop_closes_segment() {
        let dir = TempDir::new().unwrap();
        let path = {
            let (mut session, _rx) = session_with(&dir, 0, vec![vec![("error", "last words")]]);
            let handle = session.initialize().unwrap();
            session.poll_now();
            handle.path
        };
        let content = fs::read_to_string(path).unwrap();
        assert!(content.trim_end().ends_with("[error] last words"));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = LoggerConfig::new().with_synthetic_probability(-0.5);
        assert!(LoggerSession::new(config, SharedTable::new("Logging")).is_err());
    }
}
