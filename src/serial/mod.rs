//! # Serial Communication Module
//!
//! Handles the serial link to the CanSat radio bridge.
//!
//! This module handles:
//! - Opening the serial port (8N1, no flow control)
//! - Writing encoded frames
//! - Polling for inbound telemetry frames
//!
//! Writes are awaited to completion before the station loop continues. At
//! 9600 baud a full 66-byte uplink frame occupies the line for about 69 ms,
//! which bounds how late the next telemetry poll can be.

pub mod port_trait;

use tokio::time::Duration;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{GroundStationError, Result};
use crate::link::decoder::read_frame;
use crate::link::protocol::{FrameResult, LinkProfile};
use port_trait::{SerialPortIO, TokioSerialPort};

/// Default baud rate of the CanSat radio bridge
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters (most common for the radio bridge)
    "/dev/ttyACM0", // USB CDC devices
];

/// Ground station serial link
///
/// Owns the port and knows which link profile is spoken on it.
pub struct GroundSerial<P: SerialPortIO = TokioSerialPort> {
    /// Serial port handle
    port: P,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl<P: SerialPortIO> std::fmt::Debug for GroundSerial<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroundSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl GroundSerial<TokioSerialPort> {
    /// Open a specific serial device
    ///
    /// # Errors
    ///
    /// Returns `Serial` error if the device cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use cansat_ground::serial::GroundSerial;
    ///
    /// let serial = GroundSerial::open("/dev/ttyUSB0", 9600)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = Self::open_port(path, baud_rate)?;
        info!("Opened serial device at {} ({} baud)", path, baud_rate);

        Ok(Self {
            port: TokioSerialPort::new(port),
            device_path: path.to_string(),
        })
    }

    /// Open the first device that works out of a list of candidates
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path tried
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open(path, baud_rate) {
                Ok(serial) => return Ok(serial),
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(GroundStationError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a serial port with 8N1 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| GroundStationError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> GroundSerial<P> {
    /// Wrap an already open port
    pub fn from_port(port: P, device_path: impl Into<String>) -> Self {
        Self {
            port,
            device_path: device_path.into(),
        }
    }

    /// Write one complete encoded frame and flush it
    ///
    /// # Arguments
    ///
    /// * `frame` - Encoded frame bytes (header through checksum/terminator)
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.port.write_all(frame).await
            .map_err(|e| GroundStationError::Serial(format!("Failed to write frame: {}", e)))?;

        self.port.flush().await
            .map_err(|e| GroundStationError::Serial(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent frame ({} bytes)", frame.len());
        Ok(())
    }

    /// Poll the port for one inbound frame
    pub async fn poll_frame(&mut self, profile: LinkProfile, timeout: Duration) -> Result<FrameResult> {
        read_frame(&mut self.port, profile, timeout).await
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}
