//! Snapshot export
//!
//! Writes a self-contained text file holding the buffered events (all of
//! them, or one channel's). The file is written next to the destination
//! under a temporary name and renamed into place once complete, so a failed
//! export never leaves a truncated file at the destination path.

use crate::config::ChannelFilter;
use crate::types::{Event, LogError, Result, Timestamp, HEADER_SEPARATOR};
use chrono::Local;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Title line written at the top of every export
pub const EXPORT_TITLE: &str = "Robot Log Export";

/// Export events passing `filter` to `destination`
///
/// Failures are logged and reported as `false`.
pub fn export(destination: &Path, events: &[Event], filter: &ChannelFilter) -> bool {
    match try_export(destination, events, filter) {
        Ok(count) => {
            log::info!("Exported {} messages to {:?}", count, destination);
            true
        }
        Err(e) => {
            log::error!("Error exporting log file: {}", e);
            false
        }
    }
}

/// Export events passing `filter` to `destination`
///
/// # Returns
/// * `Ok(count)` - number of event lines written
/// * `Err(LogError)` - the destination was not written
pub fn try_export(destination: &Path, events: &[Event], filter: &ChannelFilter) -> Result<usize> {
    let selected: Vec<&Event> = events.iter().filter(|e| filter.matches(e)).collect();
    write_export(destination, &selected, Local::now())?;
    Ok(selected.len())
}

fn temporary_path(destination: &Path) -> Result<PathBuf> {
    let file_name = destination.file_name().ok_or_else(|| {
        LogError::Export(format!("destination has no file name: {:?}", destination))
    })?;

    let mut temp_name = OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".partial");
    Ok(destination.with_file_name(temp_name))
}

fn write_export(destination: &Path, events: &[&Event], exported_at: Timestamp) -> Result<()> {
    let temp_path = temporary_path(destination)?;

    let result = write_contents(&temp_path, events, exported_at)
        .and_then(|()| fs::rename(&temp_path, destination).map_err(LogError::from));

    if result.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            log::warn!("Could not remove partial export {:?}: {}", temp_path, e);
        }
    }

    result
}

fn write_contents(path: &Path, events: &[&Event], exported_at: Timestamp) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "{}", EXPORT_TITLE)?;
    writeln!(writer, "Exported: {}", exported_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(writer, "Total Messages: {}", events.len())?;
    writeln!(writer, "{}", HEADER_SEPARATOR)?;
    writeln!(writer)?;

    for event in events {
        writeln!(writer, "{}", event)?;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
