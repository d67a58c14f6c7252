//! # Link Protocol Constants and Types
//!
//! Core definitions for the ground station <-> CanSat serial link.
//!
//! ## Wire format
//!
//! ```text
//! canonical: 0xFF | length | payload[length - 1] | checksum
//! legacy:    0xFF | length | payload[length - 1] | checksum | 0x0A
//! ```
//!
//! `length` counts the payload plus the checksum byte. The checksum is the XOR
//! of the payload bytes.

use serde::{Deserialize, Serialize, Serializer};

use super::checksum::xor_checksum;
use crate::error::{FrameError, GroundStationError, Result};

/// Frame header byte (always 0xFF)
pub const FRAME_HEADER: u8 = 0xFF;

/// Terminator appended by the legacy profile
pub const LEGACY_TERMINATOR: u8 = 0x0A;

/// Width of the checksum trailer
pub const CHECKSUM_LEN: usize = 1;

/// Maximum payload size
///
/// The length byte counts payload + checksum, so it tops out at 255 - 1.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize - CHECKSUM_LEN;

/// Wire variant used on the link
///
/// Chosen once at startup from configuration; the two variants cannot be
/// mixed on one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkProfile {
    /// `0xFF | len | payload | checksum`
    #[default]
    Canonical,
    /// Canonical frame followed by a `0x0A` terminator
    Legacy,
}

impl LinkProfile {
    /// Trailer bytes that follow the checksum
    pub fn trailer(self) -> &'static [u8] {
        match self {
            LinkProfile::Canonical => &[],
            LinkProfile::Legacy => &[LEGACY_TERMINATOR],
        }
    }

    /// Total encoded size of a frame carrying `payload_len` bytes
    pub fn frame_len(self, payload_len: usize) -> usize {
        2 + payload_len + CHECKSUM_LEN + self.trailer().len()
    }
}

impl std::fmt::Display for LinkProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkProfile::Canonical => write!(f, "canonical"),
            LinkProfile::Legacy => write!(f, "legacy"),
        }
    }
}

/// Command opcodes (first payload byte of every uplink frame)
///
/// The payload echoes the last received opcode in its telemetry, so binary
/// upload opcodes also show up on the downlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Reset = 0x00,
    Launch = 0x01,
    SetPressure = 0x02,
    EnterSimulation = 0x03,
    CalibrateAltitude = 0x04,
    BinaryStart = 0x05,
    BinaryContinue = 0x06,
    BinaryEnd = 0x07,
    Servo = 0x08,
    At = 0x09,
    StartupAck = 0x0A,
}

impl Opcode {
    /// Every opcode, indexed by its byte value
    pub const ALL: [Opcode; 11] = [
        Opcode::Reset,
        Opcode::Launch,
        Opcode::SetPressure,
        Opcode::EnterSimulation,
        Opcode::CalibrateAltitude,
        Opcode::BinaryStart,
        Opcode::BinaryContinue,
        Opcode::BinaryEnd,
        Opcode::Servo,
        Opcode::At,
        Opcode::StartupAck,
    ];

    /// Look up an opcode by byte value, `None` if unassigned
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Wire value
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Protocol name as shown in logs
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Reset => "RESET",
            Opcode::Launch => "LAUNCH",
            Opcode::SetPressure => "SET_PRESSURE",
            Opcode::EnterSimulation => "ENTER_SIMULATION",
            Opcode::CalibrateAltitude => "CALIBRATE_ALTITUDE",
            Opcode::BinaryStart => "BINARY_DATA_START",
            Opcode::BinaryContinue => "BINARY_DATA_PACKET",
            Opcode::BinaryEnd => "BINARY_DATA_END",
            Opcode::Servo => "SERVO",
            Opcode::At => "AT",
            Opcode::StartupAck => "STARTUP_ACK",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Serialized by protocol name, so log files read the same as the console
impl Serialize for Opcode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A validated frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Payload data
    pub payload: Vec<u8>,

    /// XOR of the payload bytes
    pub checksum: u8,
}

impl Frame {
    /// Create a new frame, computing its checksum
    ///
    /// # Errors
    ///
    /// Returns error if payload exceeds MAX_PAYLOAD_SIZE (254 bytes)
    pub fn new(payload: Vec<u8>) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(GroundStationError::FrameTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let checksum = xor_checksum(&payload);
        Ok(Self { payload, checksum })
    }

    /// Get the length byte (payload + checksum)
    ///
    /// Cannot overflow since payload is validated to be ≤ 254 bytes
    pub fn length(&self) -> u8 {
        (self.payload.len() + CHECKSUM_LEN) as u8
    }

    /// Payload bytes rendered as space-separated uppercase hex
    pub fn hex(&self) -> String {
        self.payload
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of one attempt to pull a frame off the link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameResult {
    /// A complete frame with a valid checksum
    Frame(Frame),

    /// No bytes were available
    Idle,

    /// Bytes were seen but did not form a valid frame
    Dropped(FrameError),
}
