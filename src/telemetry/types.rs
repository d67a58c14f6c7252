//! # Telemetry Types
//!
//! Structured downlink records and the enum tables used to decode them.

use serde::Serialize;

use crate::link::protocol::Opcode;

/// Flight software operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Simulation,
    Flight,
    /// Byte outside the mode table
    Unknown(u8),
}

impl Mode {
    const TABLE: [Mode; 2] = [Mode::Simulation, Mode::Flight];

    /// Bounds-checked lookup
    pub fn from_byte(byte: u8) -> Mode {
        Self::TABLE.get(byte as usize).copied().unwrap_or(Mode::Unknown(byte))
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Simulation => write!(f, "MODE_SIMULATION"),
            Mode::Flight => write!(f, "MODE_FLIGHT"),
            Mode::Unknown(raw) => write!(f, "UNKNOWN ({})", raw),
        }
    }
}

/// Mission state reported by the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlightState {
    LaunchPad,
    Ascent,
    Descent,
    ProbeRelease,
    Landed,
    /// Byte outside the state table
    Unknown(u8),
}

impl FlightState {
    const TABLE: [FlightState; 5] = [
        FlightState::LaunchPad,
        FlightState::Ascent,
        FlightState::Descent,
        FlightState::ProbeRelease,
        FlightState::Landed,
    ];

    /// Bounds-checked lookup
    pub fn from_byte(byte: u8) -> FlightState {
        Self::TABLE.get(byte as usize).copied().unwrap_or(FlightState::Unknown(byte))
    }
}

impl std::fmt::Display for FlightState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightState::LaunchPad => write!(f, "LAUNCH_PAD"),
            FlightState::Ascent => write!(f, "ASCENT"),
            FlightState::Descent => write!(f, "DESCENT"),
            FlightState::ProbeRelease => write!(f, "PROBE_RELEASE"),
            FlightState::Landed => write!(f, "LANDED"),
            FlightState::Unknown(raw) => write!(f, "UNKNOWN ({})", raw),
        }
    }
}

/// State of the on-board binary upload receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStatus {
    None,
    Ready,
    Uploading,
    Success,
    Failure,
    /// Byte outside the status table
    Unknown(u8),
}

impl UploadStatus {
    const TABLE: [UploadStatus; 5] = [
        UploadStatus::None,
        UploadStatus::Ready,
        UploadStatus::Uploading,
        UploadStatus::Success,
        UploadStatus::Failure,
    ];

    /// Bounds-checked lookup
    pub fn from_byte(byte: u8) -> UploadStatus {
        Self::TABLE.get(byte as usize).copied().unwrap_or(UploadStatus::Unknown(byte))
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::None => write!(f, "NONE"),
            UploadStatus::Ready => write!(f, "READY"),
            UploadStatus::Uploading => write!(f, "UPLOADING"),
            UploadStatus::Success => write!(f, "SUCCESS"),
            UploadStatus::Failure => write!(f, "FAILURE"),
            UploadStatus::Unknown(raw) => write!(f, "UNKNOWN ({})", raw),
        }
    }
}

/// Last command the payload received, as echoed in telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandEcho {
    Known(Opcode),
    Unknown(u8),
}

impl CommandEcho {
    pub fn from_byte(byte: u8) -> CommandEcho {
        Opcode::from_byte(byte).map_or(CommandEcho::Unknown(byte), CommandEcho::Known)
    }

    /// Raw opcode byte
    pub fn code(self) -> u8 {
        match self {
            CommandEcho::Known(opcode) => opcode.as_byte(),
            CommandEcho::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for CommandEcho {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandEcho::Known(opcode) => write!(f, "{} ({})", opcode.as_byte(), opcode),
            CommandEcho::Unknown(raw) => write!(f, "{} (UNKNOWN_COMMAND)", raw),
        }
    }
}

/// Three-axis sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Fields only carried by the canonical layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtendedTelemetry {
    /// Temperature in °C
    pub temperature: f32,

    /// Acceleration in m/s²
    pub accel: Vector3,

    /// Magnetic field in µT
    pub mag: Vector3,

    /// Angular rate in °/s
    pub gyro: Vector3,

    /// Last command seen by the payload
    pub command_echo: CommandEcho,

    /// Application checksum byte (opaque, passed through)
    pub app_checksum: u8,

    /// Binary upload receiver state
    pub upload_status: UploadStatus,
}

/// One downlink telemetry record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// Packet counter (wraps at 255)
    pub packet_count: u8,

    pub mode: Mode,

    pub state: FlightState,

    /// Altitude in meters
    pub altitude: f32,

    /// Pressure in pascals
    pub pressure: f32,

    /// Present for the canonical layout only
    pub extended: Option<ExtendedTelemetry>,
}

impl TelemetryRecord {
    /// All sensor floats in wire order (2 for legacy, 12 for canonical)
    pub fn sensor_values(&self) -> Vec<f32> {
        let mut values = vec![self.altitude, self.pressure];
        if let Some(ext) = &self.extended {
            values.push(ext.temperature);
            for v in [ext.accel, ext.mag, ext.gyro] {
                values.extend_from_slice(&[v.x, v.y, v.z]);
            }
        }
        values
    }
}

impl std::fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Packet Count: {} --------------------", self.packet_count)?;
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "State: {}", self.state)?;
        writeln!(f, "Altitude: {:.2} m", self.altitude)?;
        write!(f, "Pressure: {:.2} Pa", self.pressure)?;

        if let Some(ext) = &self.extended {
            writeln!(f)?;
            writeln!(f, "Temperature: {:.2} °C", ext.temperature)?;
            writeln!(
                f,
                "Accelerometer: X={:.2} m/s², Y={:.2} m/s², Z={:.2} m/s²",
                ext.accel.x, ext.accel.y, ext.accel.z
            )?;
            writeln!(
                f,
                "Magnetometer: X={:.2} µT, Y={:.2} µT, Z={:.2} µT",
                ext.mag.x, ext.mag.y, ext.mag.z
            )?;
            writeln!(
                f,
                "Gyroscope: X={:.2} °/s, Y={:.2} °/s, Z={:.2} °/s",
                ext.gyro.x, ext.gyro.y, ext.gyro.z
            )?;
            writeln!(f, "Command Echo: {}", ext.command_echo)?;
            writeln!(f, "App Checksum: {}", ext.app_checksum)?;
            write!(f, "Upload Status: {}", ext.upload_status)?;
        }

        Ok(())
    }
}
