//! # Error Types
//!
//! Custom error types for the CanSat ground station using `thiserror`.
//!
//! Three layers of failure exist:
//!
//! - [`FrameError`]: a single frame on the wire was unusable (recoverable)
//! - [`DecodeError`]: a telemetry payload was only partially decodable (recoverable)
//! - [`GroundStationError`]: everything that fails an operation outright

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the ground station
#[derive(Debug, Error)]
pub enum GroundStationError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors (open, write, flush)
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Payload does not fit in a single frame
    #[error("Payload of {len} bytes exceeds maximum frame payload of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    /// AT command text contains characters outside 7-bit ASCII
    #[error("AT command argument is not ASCII: {0:?}")]
    NonAsciiCommandArgument(String),

    /// Console input could not be mapped to a command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Uplink or simulation source file could not be read
    #[error("Cannot read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pressure profile contents are malformed
    #[error("Invalid pressure profile at line {line}: {reason}")]
    InvalidProfile { line: usize, reason: String },

    /// The station stopped accepting frames from a background task
    #[error("Link closed: station is no longer accepting frames")]
    LinkClosed,

    /// Telemetry record could not be serialized
    #[error("Telemetry log error: {0}")]
    TelemetryLog(#[from] serde_json::Error),
}

/// Reasons a frame was seen on the wire but rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// First byte was not the frame header
    #[error("Frame sync error: expected header 0xFF, got 0x{found:02X}")]
    Sync { found: u8 },

    /// Length byte was zero (it must at least cover the checksum)
    #[error("Frame length error: length byte is zero")]
    ZeroLength,

    /// Fewer bytes arrived than the length byte advertised
    #[error("Frame length error: expected {expected} bytes, received {received}")]
    Length { expected: usize, received: usize },

    /// XOR checksum over the payload does not match the trailer
    #[error("Checksum mismatch: calculated 0x{calculated:02X}, received 0x{received:02X}")]
    ChecksumMismatch { calculated: u8, received: u8 },

    /// Legacy profile frame did not end with the terminator byte
    #[error("Missing frame terminator: expected 0x0A, got {found:?}")]
    MissingTerminator { found: Option<u8> },
}

/// Partial-decode conditions reported alongside a telemetry record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload is shorter than the fixed layout; missing fields read as zero
    #[error("Truncated telemetry payload: expected {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },

    /// Enum byte is outside its table
    #[error("Out-of-range {field} value: {value}")]
    OutOfRangeEnum { field: &'static str, value: u8 },
}

/// Result type alias for the ground station
pub type Result<T> = std::result::Result<T, GroundStationError>;
