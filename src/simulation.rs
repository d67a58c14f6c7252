//! # Simulated Pressure Stream
//!
//! Feeds a recorded or generated pressure profile to the payload while it is
//! in simulation mode, one SET_PRESSURE command per sample.
//!
//! Profile files are CSV with a header row:
//!
//! ```text
//! time_s,pressure_Pa
//! 0,95461.3
//! 1,89000.12
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::command::{encode_command, Command};
use crate::error::{GroundStationError, Result};
use crate::link::protocol::LinkProfile;
use crate::task::{emit_frame, pace, TaskEvent, TransferOutcome};

/// Default delay between samples (1 Hz)
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;

/// Parse profile CSV contents into pressure samples (Pa)
///
/// The first line is a header and is skipped. Blank lines are ignored.
///
/// # Errors
///
/// Returns `InvalidProfile` for rows without two columns or with a
/// non-numeric pressure
pub fn parse_pressure_profile(contents: &str) -> Result<Vec<f32>> {
    let mut samples = Vec::new();

    for (index, line) in contents.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let line_no = index + 1;
        let mut columns = line.split(',');
        let (Some(_time), Some(pressure), None) = (columns.next(), columns.next(), columns.next()) else {
            return Err(GroundStationError::InvalidProfile {
                line: line_no,
                reason: format!("expected 2 columns in {:?}", line),
            });
        };

        let pressure: f32 = pressure.trim().parse().map_err(|_| GroundStationError::InvalidProfile {
            line: line_no,
            reason: format!("invalid pressure {:?}", pressure.trim()),
        })?;
        samples.push(pressure);
    }

    Ok(samples)
}

/// A pressure profile ready to stream
#[derive(Debug)]
pub struct PressureStream {
    source: PathBuf,
    samples: Vec<f32>,
}

impl PressureStream {
    /// Load and parse a profile file
    ///
    /// # Errors
    ///
    /// Returns `File` if the file cannot be read, `InvalidProfile` if it
    /// does not parse; nothing is sent in either case
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| GroundStationError::File {
            path: path.to_path_buf(),
            source,
        })?;

        let samples = parse_pressure_profile(&contents)?;
        info!("Loaded pressure profile {} ({} samples)", path.display(), samples.len());

        Ok(Self {
            source: path.to_path_buf(),
            samples,
        })
    }

    pub fn from_samples(source: impl Into<PathBuf>, samples: Vec<f32>) -> Self {
        Self {
            source: source.into(),
            samples,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Send one SET_PRESSURE frame per sample, `interval` apart
    ///
    /// # Errors
    ///
    /// Returns `LinkClosed` if the station stops accepting frames
    pub async fn run(
        self,
        profile: LinkProfile,
        interval: Duration,
        events: mpsc::Sender<TaskEvent>,
        cancel: CancellationToken,
    ) -> Result<TransferOutcome> {
        let total = self.samples.len();
        if total == 0 {
            return Ok(TransferOutcome::Empty);
        }

        debug!("Streaming {} samples from {}", total, self.source.display());

        for (i, &pressure) in self.samples.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(TransferOutcome::Cancelled { sent: i, total });
            }

            let frame = encode_command(&Command::SetPressure(pressure), profile)?;
            emit_frame(&events, frame, format!("Sent simulated pressure: {}", pressure)).await?;

            if !pace(interval, &cancel).await && i + 1 < total {
                return Ok(TransferOutcome::Cancelled { sent: i + 1, total });
            }
        }

        Ok(TransferOutcome::Completed { sent: total })
    }
}
