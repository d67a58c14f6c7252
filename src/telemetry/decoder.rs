//! # Telemetry Decoder
//!
//! Decodes frame payloads into [`TelemetryRecord`]s.
//!
//! ## Canonical layout (54 bytes)
//!
//! | Offset | Width | Field |
//! |--------|-------|-------|
//! | 0 | 1 | Packet count |
//! | 1 | 1 | Mode |
//! | 2 | 1 | State |
//! | 3 | 12 × 4 | Altitude, pressure, temperature, accel XYZ, mag XYZ, gyro XYZ (f32 LE) |
//! | 51 | 1 | Command echo |
//! | 52 | 1 | Application checksum |
//! | 53 | 1 | Upload status |
//!
//! ## Legacy layout (12 bytes)
//!
//! Packet count, mode, state, altitude, pressure, one reserved byte.
//!
//! Decoding never fails outright. Missing bytes read as zero and are reported
//! as [`DecodeError::TruncatedPayload`]; enum bytes outside their table decode
//! to `Unknown` and are reported as [`DecodeError::OutOfRangeEnum`].

use super::types::*;
use crate::error::DecodeError;
use crate::link::protocol::LinkProfile;

/// Width of one sensor float
pub const F32_WIDTH: usize = 4;

pub const PACKET_COUNT_OFFSET: usize = 0;
pub const MODE_OFFSET: usize = PACKET_COUNT_OFFSET + 1;
pub const STATE_OFFSET: usize = MODE_OFFSET + 1;
pub const SENSOR_OFFSET: usize = STATE_OFFSET + 1;

/// Sensor floats in the canonical layout
pub const CANONICAL_SENSOR_COUNT: usize = 12;

/// Sensor floats in the legacy layout (altitude, pressure)
pub const LEGACY_SENSOR_COUNT: usize = 2;

pub const COMMAND_ECHO_OFFSET: usize = SENSOR_OFFSET + CANONICAL_SENSOR_COUNT * F32_WIDTH;
pub const APP_CHECKSUM_OFFSET: usize = COMMAND_ECHO_OFFSET + 1;
pub const UPLOAD_STATUS_OFFSET: usize = APP_CHECKSUM_OFFSET + 1;

/// Canonical record size (54 bytes)
pub const CANONICAL_PAYLOAD_SIZE: usize = UPLOAD_STATUS_OFFSET + 1;

/// Legacy record size (12 bytes, the last one reserved)
pub const LEGACY_PAYLOAD_SIZE: usize = SENSOR_OFFSET + LEGACY_SENSOR_COUNT * F32_WIDTH + 1;

/// Record layout carried in telemetry frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryLayout {
    Canonical,
    Legacy,
}

impl TelemetryLayout {
    /// The layout spoken alongside a wire profile
    pub fn for_profile(profile: LinkProfile) -> Self {
        match profile {
            LinkProfile::Canonical => TelemetryLayout::Canonical,
            LinkProfile::Legacy => TelemetryLayout::Legacy,
        }
    }

    /// Minimum payload size for a complete record
    pub fn payload_size(self) -> usize {
        match self {
            TelemetryLayout::Canonical => CANONICAL_PAYLOAD_SIZE,
            TelemetryLayout::Legacy => LEGACY_PAYLOAD_SIZE,
        }
    }
}

/// A decoded record plus everything that went wrong building it
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTelemetry {
    pub record: TelemetryRecord,
    pub errors: Vec<DecodeError>,
}

impl DecodedTelemetry {
    /// True if the payload was shorter than the layout
    pub fn is_truncated(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, DecodeError::TruncatedPayload { .. }))
    }
}

/// Decode a telemetry payload
///
/// # Arguments
///
/// * `payload` - Frame payload bytes
/// * `layout` - Expected record layout
///
/// # Returns
///
/// * `DecodedTelemetry` - Record (possibly partial) and any decode errors
///
/// # Examples
///
/// ```
/// use cansat_ground::telemetry::decoder::{decode_telemetry, TelemetryLayout};
///
/// let decoded = decode_telemetry(&[0u8; 10], TelemetryLayout::Canonical);
/// assert!(decoded.is_truncated());
/// assert_eq!(decoded.record.altitude, 0.0);
/// ```
pub fn decode_telemetry(payload: &[u8], layout: TelemetryLayout) -> DecodedTelemetry {
    let mut errors = Vec::new();

    let expected = layout.payload_size();
    if payload.len() < expected {
        errors.push(DecodeError::TruncatedPayload {
            expected,
            actual: payload.len(),
        });
    }

    let byte = |offset: usize| payload.get(offset).copied().unwrap_or(0);
    let sensor = |index: usize| read_f32_le(payload, SENSOR_OFFSET + index * F32_WIDTH);

    let mode = Mode::from_byte(byte(MODE_OFFSET));
    if let Mode::Unknown(value) = mode {
        errors.push(DecodeError::OutOfRangeEnum { field: "mode", value });
    }

    let state = FlightState::from_byte(byte(STATE_OFFSET));
    if let FlightState::Unknown(value) = state {
        errors.push(DecodeError::OutOfRangeEnum { field: "state", value });
    }

    let extended = match layout {
        TelemetryLayout::Legacy => None,
        TelemetryLayout::Canonical => {
            let upload_status = UploadStatus::from_byte(byte(UPLOAD_STATUS_OFFSET));
            if let UploadStatus::Unknown(value) = upload_status {
                errors.push(DecodeError::OutOfRangeEnum { field: "upload_status", value });
            }

            let vector = |first: usize| Vector3 {
                x: sensor(first),
                y: sensor(first + 1),
                z: sensor(first + 2),
            };

            Some(ExtendedTelemetry {
                temperature: sensor(2),
                accel: vector(3),
                mag: vector(6),
                gyro: vector(9),
                command_echo: CommandEcho::from_byte(byte(COMMAND_ECHO_OFFSET)),
                app_checksum: byte(APP_CHECKSUM_OFFSET),
                upload_status,
            })
        }
    };

    let record = TelemetryRecord {
        packet_count: byte(PACKET_COUNT_OFFSET),
        mode,
        state,
        altitude: sensor(0),
        pressure: sensor(1),
        extended,
    };

    DecodedTelemetry { record, errors }
}

/// Read a little-endian f32, 0.0 if the bytes are not all there
fn read_f32_le(payload: &[u8], offset: usize) -> f32 {
    payload
        .get(offset..offset + F32_WIDTH)
        .and_then(|bytes| bytes.try_into().ok())
        .map(f32::from_le_bytes)
        .unwrap_or(0.0)
}
