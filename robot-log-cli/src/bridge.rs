//! Stdin bridge for live mode
//!
//! Reads `channel<TAB>value` (or `channel=value`) lines and writes each value
//! into the shared telemetry table, standing in for the robot link. The
//! value is stored as-is, so lines may carry the robot's `[HH:MM:SS.mmm] `
//! prefix.

use robot_log_core::{SharedTable, TelemetrySink};
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

/// Split a bridge line into channel and value
///
/// Returns `None` for blank lines, comments (`#`), and lines without a
/// separator or channel name.
pub fn parse_bridge_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }

    let split_at = line.find(['\t', '='])?;
    let channel = line[..split_at].trim();
    if channel.is_empty() {
        return None;
    }
    Some((channel, &line[split_at + 1..]))
}

/// Copy lines from `reader` into the table until EOF
///
/// Returns the number of values written.
pub fn run_bridge<R: BufRead>(reader: R, mut table: SharedTable) -> usize {
    let mut written = 0;

    for (number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Error reading telemetry input: {}", e);
                break;
            }
        };

        let Some((channel, value)) = parse_bridge_line(&line) else {
            if !line.trim().is_empty() && !line.starts_with('#') {
                log::warn!("Ignoring malformed line {}: {:?}", number + 1, line);
            }
            continue;
        };

        let result = table
            .publish(channel)
            .and_then(|()| table.set(channel, value));
        match result {
            Ok(()) => written += 1,
            Err(e) => log::warn!("Could not store value for {}: {}", channel, e),
        }
    }

    log::info!("Telemetry input closed after {} values", written);
    written
}

/// Run the bridge on a background thread reading stdin
pub fn spawn_stdin_bridge(table: SharedTable) -> io::Result<JoinHandle<usize>> {
    thread::Builder::new()
        .name("stdin-bridge".to_string())
        .spawn(move || run_bridge(io::stdin().lock(), table))
}
