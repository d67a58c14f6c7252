//! # CanSat Ground Station
//!
//! Console ground station for the CanSat payload radio link.
//!
//! Reads telemetry from the serial radio bridge, shows it as raw hex or
//! decoded text, and sends operator commands, simulated pressure profiles
//! and binary file uploads back up the link.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cansat_ground::config::{Config, LoggingConfig};
use cansat_ground::serial::{GroundSerial, DEFAULT_DEVICE_PATHS};
use cansat_ground::station::Station;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Prefix of the daily rolling diagnostic log
const LOG_FILE_PREFIX: &str = "ground_station.log";

/// Console lines buffered ahead of the station loop
const CONSOLE_CHANNEL_CAPACITY: usize = 32;

/// Main entry point for the ground station
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, else `config/default.toml`,
///      else built-in defaults)
///    - Set up logging to a daily rolling file
///    - Open the serial port
///
/// 2. **Main Loop**
///    - Forward stdin lines to the station
///    - Poll telemetry, send commands, run transfers
///
/// 3. **Shutdown**
///    - `exit`, end of input, or Ctrl+C
///    - Cancel any running transfer
///
/// # Errors
///
/// Returns error if:
/// - The configuration file is invalid
/// - The serial port cannot be opened
/// - Console output cannot be written
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = load_config()?;
    let _log_guard = init_logging(&config.logging)?;

    info!("CanSat ground station v{} starting...", env!("CARGO_PKG_VERSION"));

    // Configured port first, then the usual adapter paths
    let mut candidates = vec![config.serial.port.as_str()];
    candidates.extend(DEFAULT_DEVICE_PATHS.iter().filter(|p| **p != config.serial.port));
    let serial = GroundSerial::open_with_paths(&candidates, config.serial.baud_rate)
        .context("Failed to open serial port")?;
    info!("Serial port opened at: {}", serial.device_path());

    // Blocking reader thread; tokio's stdin would hold up runtime shutdown
    let (console_tx, console_rx) = mpsc::channel(CONSOLE_CHANNEL_CAPACITY);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if console_tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read console input: {}", e);
                    break;
                }
            }
        }
        debug!("Console reader finished");
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let mut station = Station::new(serial, config, std::io::stdout())?;
    station.run(console_rx, shutdown).await?;

    Ok(())
}

/// Load configuration from the command line, the default path, or defaults
fn load_config() -> Result<Config> {
    if let Some(path) = std::env::args().nth(1) {
        return Config::load(&path).with_context(|| format!("Failed to load config from {}", path));
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        return Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH));
    }

    Ok(Config::default())
}

/// Log to a daily rolling file; the console belongs to the operator
///
/// `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.dir)
        .with_context(|| format!("Failed to create log directory {}", logging.dir))?;

    let appender = tracing_appender::rolling::daily(&logging.dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(guard)
}
