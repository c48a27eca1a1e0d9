//! Robot Log Viewer CLI Application
//!
//! This is the console front end for the robot log viewer.
//! It uses the robot-log-core library and adds:
//! - Command-line and TOML configuration
//! - The poll timer driving the logger session
//! - Console display of live events (text or JSON)
//! - A stdin bridge feeding the live telemetry table

use anyhow::{bail, Context, Result};
use clap::Parser;
use robot_log_core::{LoggerSession, SamplingMode, SharedTable};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

mod bridge;
mod config;
mod display;

use config::AppConfig;
use display::ConsoleDisplay;

/// Robot Log Viewer - watch, persist and export robot telemetry logs
#[derive(Parser, Debug)]
#[command(name = "robot-log")]
#[command(about = "Watch, persist and export robot telemetry log channels", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sampling mode: live (channel=value lines on stdin) or synthetic
    #[arg(short, long, value_name = "MODE")]
    mode: Option<SamplingMode>,

    /// Poll interval in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Maximum events kept in memory (<= 0 for unbounded)
    #[arg(long, value_name = "COUNT", allow_negative_numbers = true)]
    max_events: Option<i64>,

    /// Directory for segment files
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Chance per tick of a synthetic message (0.0 - 1.0)
    #[arg(long, value_name = "P")]
    probability: Option<f64>,

    /// Extra channel to subscribe to (can be repeated)
    #[arg(long = "channel", value_name = "NAME")]
    channels: Vec<String>,

    /// Only display this channel ("All" for every channel)
    #[arg(short, long, value_name = "CHANNEL")]
    filter: Option<String>,

    /// Stop after this many seconds (default: live mode stops when stdin
    /// closes, synthetic mode runs until interrupted and skips --export)
    #[arg(short, long, value_name = "SECS")]
    duration_secs: Option<u64>,

    /// Export the filtered buffer to this file on exit
    #[arg(short, long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// List segment files in the log directory and exit
    #[arg(long)]
    list_segments: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Robot Log Viewer v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using core library v{}", robot_log_core::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args);

    if args.list_segments {
        return list_segments(&config);
    }

    run_viewer(config, &args)
}

/// Layer command-line flags over the loaded configuration
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    let logger = &mut config.logger;

    if let Some(mode) = args.mode {
        logger.mode = mode;
    }
    if let Some(interval) = args.interval_ms {
        logger.poll_interval_ms = interval;
    }
    if let Some(max) = args.max_events {
        logger.max_buffered_events = max;
    }
    if let Some(dir) = &args.log_dir {
        logger.log_directory = dir.clone();
    }
    if let Some(probability) = args.probability {
        logger.synthetic_probability = probability;
    }
    for channel in &args.channels {
        if !logger.channels.contains(channel) {
            logger.channels.push(channel.clone());
        }
    }
    if let Some(filter) = &args.filter {
        logger.default_filter = filter.clone();
    }
    if args.json {
        config.display.json = true;
    }
}

/// Print segment files, newest first
fn list_segments(config: &AppConfig) -> Result<()> {
    let sink = robot_log_core::PersistenceSink::new(config.logger.log_directory.clone());
    let segments = sink
        .list_segments()
        .with_context(|| format!("Failed to list {:?}", config.logger.log_directory))?;

    if segments.is_empty() {
        println!("No log segments in {:?}", config.logger.log_directory);
    }
    for segment in segments {
        println!("{}", segment.display());
    }
    Ok(())
}

/// Run the poll loop until the deadline passes or live input ends
fn run_viewer(config: AppConfig, args: &Args) -> Result<()> {
    let table = SharedTable::new(config.logger.table_name.clone());

    let bridge = match config.logger.mode {
        SamplingMode::Live => {
            log::info!(
                "Live mode: reading '{}' table values from stdin (server {})",
                config.logger.table_name,
                config.logger.server_address
            );
            Some(bridge::spawn_stdin_bridge(table.clone()).context("Failed to start stdin bridge")?)
        }
        SamplingMode::Synthetic => None,
    };

    let interval = Duration::from_millis(config.logger.poll_interval_ms);
    let mut session =
        LoggerSession::new(config.logger, table).context("Invalid logger configuration")?;
    session.subscribe(Box::new(ConsoleDisplay::stdout(config.display)));
    session
        .initialize()
        .context("Failed to open log segment")?;

    let deadline = args.duration_secs.map(|secs| Instant::now() + Duration::from_secs(secs));

    loop {
        session.poll_now();

        if bridge.as_ref().is_some_and(|handle| handle.is_finished()) {
            // Pick up whatever the bridge wrote last
            session.poll_now();
            break;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }

        thread::sleep(interval);
    }

    log::info!("Captured {} messages", session.message_count());

    if let Some(destination) = &args.export {
        if !session.export_current(destination) {
            session.shutdown();
            bail!("Export to {:?} failed", destination);
        }
    }

    session.shutdown();
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
