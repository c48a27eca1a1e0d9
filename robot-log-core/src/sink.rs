//! Segment persistence
//!
//! Every accepted event is appended to the currently open segment file,
//! independent of what the in-memory buffer later evicts. At most one
//! segment is open at a time and it is flushed after every write.

use crate::types::{Event, LogError, Result, Timestamp, HEADER_SEPARATOR};
use chrono::Local;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// strftime pattern for segment file names
pub const SEGMENT_FILE_FORMAT: &str = "robot_log_%Y%m%d_%H%M%S.txt";

/// Title line written at the top of every segment
pub const SEGMENT_TITLE: &str = "FRC Robot Log";

/// Identifies the open segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHandle {
    pub path: PathBuf,
    pub started_at: Timestamp,
}

impl SegmentHandle {
    /// File name of the segment (e.g. `robot_log_20240309_141500.txt`)
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

struct OpenSegment {
    handle: SegmentHandle,
    writer: BufWriter<File>,
}

/// Append-only writer for log segments
pub struct PersistenceSink {
    log_dir: PathBuf,
    current: Option<OpenSegment>,
}

impl PersistenceSink {
    /// Create a sink writing into `log_dir` (created on the first segment)
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            current: None,
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Handle of the open segment, if any
    pub fn current_segment(&self) -> Option<&SegmentHandle> {
        self.current.as_ref().map(|segment| &segment.handle)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Close any open segment and start a new one named after the current time
    pub fn begin_segment(&mut self) -> Result<SegmentHandle> {
        self.begin_segment_at(Local::now())
    }

    fn begin_segment_at(&mut self, started_at: Timestamp) -> Result<SegmentHandle> {
        self.end_segment();
        fs::create_dir_all(&self.log_dir)?;

        let path = self
            .log_dir
            .join(started_at.format(SEGMENT_FILE_FORMAT).to_string());
        log::info!("Opening log segment: {:?}", path);

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", SEGMENT_TITLE)?;
        writeln!(writer, "Started: {}", started_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(writer, "{}", HEADER_SEPARATOR)?;
        writeln!(writer)?;
        writer.flush()?;

        let handle = SegmentHandle { path, started_at };
        self.current = Some(OpenSegment {
            handle: handle.clone(),
            writer,
        });
        Ok(handle)
    }

    /// Append one event and flush
    ///
    /// A failure leaves the segment open; later writes are attempted normally.
    pub fn write(&mut self, event: &Event) -> Result<()> {
        let segment = self.current.as_mut().ok_or(LogError::SegmentNotOpen)?;
        writeln!(segment.writer, "{}", event)?;
        segment.writer.flush()?;
        Ok(())
    }

    /// Append several events and flush once
    pub fn write_many<'a, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let segment = self.current.as_mut().ok_or(LogError::SegmentNotOpen)?;
        for event in events {
            writeln!(segment.writer, "{}", event)?;
        }
        segment.writer.flush()?;
        Ok(())
    }

    /// Close the open segment; does nothing when none is open
    pub fn end_segment(&mut self) {
        if let Some(mut segment) = self.current.take() {
            log::info!("Closing log segment: {:?}", segment.handle.path);
            if let Err(e) = segment.writer.flush() {
                log::error!("Error closing log file: {}", e);
            }
        }
    }

    /// Segment files in the log directory, newest first
    pub fn list_segments(&self) -> Result<Vec<PathBuf>> {
        if !self.log_dir.exists() {
            return Ok(Vec::new());
        }

        let mut segments = Vec::new();
        for entry in fs::read_dir(&self.log_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                segments.push(path);
            }
        }
        segments.sort();
        segments.reverse();
        Ok(segments)
    }
}

impl Drop for PersistenceSink {
    fn drop(&mut self) {
        self.end_segment();
    }
}
