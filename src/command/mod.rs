//! # Command Module
//!
//! Ground-to-payload commands.
//!
//! This module handles:
//! - Mapping symbolic commands to opcode + argument payloads
//! - Framing encoded commands for the link
//! - Parsing console input into commands

pub mod parser;

use bytes::{BufMut, BytesMut};

use crate::error::{GroundStationError, Result};
use crate::link::encoder::encode_frame;
use crate::link::protocol::{LinkProfile, Opcode};

/// Prefix of every AT command string
const AT_PREFIX: &str = "AT";

/// A command for the payload
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reset,
    Launch,
    /// Pressure override in pascals (simulation mode)
    SetPressure(f32),
    EnterSimulation,
    CalibrateAltitude,
    Servo,
    /// AT command arguments, without the "AT" prefix
    At(String),
    StartupAck,
    BinaryStart(Vec<u8>),
    BinaryContinue(Vec<u8>),
    BinaryEnd(Vec<u8>),
}

impl Command {
    /// Opcode byte this command is sent with
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Reset => Opcode::Reset,
            Command::Launch => Opcode::Launch,
            Command::SetPressure(_) => Opcode::SetPressure,
            Command::EnterSimulation => Opcode::EnterSimulation,
            Command::CalibrateAltitude => Opcode::CalibrateAltitude,
            Command::Servo => Opcode::Servo,
            Command::At(_) => Opcode::At,
            Command::StartupAck => Opcode::StartupAck,
            Command::BinaryStart(_) => Opcode::BinaryStart,
            Command::BinaryContinue(_) => Opcode::BinaryContinue,
            Command::BinaryEnd(_) => Opcode::BinaryEnd,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::SetPressure(value) => write!(f, "{} {}", self.opcode(), value),
            Command::At(text) => write!(f, "{}", at_text(text)),
            Command::BinaryStart(chunk) | Command::BinaryContinue(chunk) | Command::BinaryEnd(chunk) => {
                write!(f, "{} ({} bytes)", self.opcode(), chunk.len())
            }
            other => write!(f, "{}", other.opcode()),
        }
    }
}

/// Encode a command into its payload (opcode followed by arguments)
///
/// # Errors
///
/// Returns `NonAsciiCommandArgument` if AT command text is not 7-bit ASCII
///
/// # Examples
///
/// ```
/// use cansat_ground::command::{encode_command_payload, Command};
///
/// let payload = encode_command_payload(&Command::At("RESET".into())).unwrap();
/// assert_eq!(payload, b"\x09AT RESET".to_vec());
/// ```
pub fn encode_command_payload(command: &Command) -> Result<Vec<u8>> {
    let mut payload = BytesMut::with_capacity(8);
    payload.put_u8(command.opcode().as_byte());

    match command {
        Command::SetPressure(value) => payload.put_f32_le(*value),
        Command::At(text) => {
            if !text.is_ascii() {
                return Err(GroundStationError::NonAsciiCommandArgument(text.clone()));
            }
            payload.put_slice(at_text(text).as_bytes());
        }
        Command::BinaryStart(chunk) | Command::BinaryContinue(chunk) | Command::BinaryEnd(chunk) => {
            payload.put_slice(chunk);
        }
        Command::Reset
        | Command::Launch
        | Command::EnterSimulation
        | Command::CalibrateAltitude
        | Command::Servo
        | Command::StartupAck => {}
    }

    Ok(payload.to_vec())
}

/// Encode a command into a complete frame ready for the serial port
///
/// # Errors
///
/// Returns `NonAsciiCommandArgument` for non-ASCII AT text, or
/// `FrameTooLarge` if the arguments do not fit in one frame
pub fn encode_command(command: &Command, profile: LinkProfile) -> Result<Vec<u8>> {
    let payload = encode_command_payload(command)?;
    encode_frame(&payload, profile)
}

/// "AT" alone, or "AT <args>"
fn at_text(args: &str) -> String {
    let args = args.trim();
    if args.is_empty() {
        AT_PREFIX.to_string()
    } else {
        format!("{} {}", AT_PREFIX, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::decoder::decode_frame;
    use crate::link::protocol::FrameResult;

    #[test]
    fn test_simple_command_payloads() {
        let cases = [
            (Command::Reset, 0x00),
            (Command::Launch, 0x01),
            (Command::EnterSimulation, 0x03),
            (Command::CalibrateAltitude, 0x04),
            (Command::Servo, 0x08),
            (Command::StartupAck, 0x0A),
        ];

        for (command, opcode) in cases {
            assert_eq!(encode_command_payload(&command).unwrap(), vec![opcode], "{:?}", command);
        }
    }

    #[test]
    fn test_set_pressure_payload() {
        let payload = encode_command_payload(&Command::SetPressure(101_325.0)).unwrap();
        assert_eq!(payload.len(), 5);
        assert_eq!(payload[0], 0x02);
        assert_eq!(&payload[1..], &101_325.0f32.to_le_bytes());
    }

    #[test]
    fn test_set_pressure_frame_round_trip() {
        let frame = encode_command(&Command::SetPressure(101_325.0), LinkProfile::Canonical).unwrap();

        match decode_frame(&frame, LinkProfile::Canonical) {
            FrameResult::Frame(decoded) => {
                let value = f32::from_le_bytes(decoded.payload[1..5].try_into().unwrap());
                assert_eq!(value, 101_325.0);
            }
            other => panic!("Expected frame, got: {:?}", other),
        }
    }

    #[test]
    fn test_at_command_payloads() {
        assert_eq!(encode_command_payload(&Command::At(String::new())).unwrap(), b"\x09AT".to_vec());
        assert_eq!(
            encode_command_payload(&Command::At("+BAUD=9600".into())).unwrap(),
            b"\x09AT +BAUD=9600".to_vec()
        );
        assert_eq!(
            encode_command_payload(&Command::At("  +VER  ".into())).unwrap(),
            b"\x09AT +VER".to_vec()
        );
    }

    #[test]
    fn test_at_command_rejects_non_ascii() {
        let result = encode_command_payload(&Command::At("température".into()));
        match result {
            Err(GroundStationError::NonAsciiCommandArgument(text)) => assert_eq!(text, "température"),
            other => panic!("Expected NonAsciiCommandArgument, got: {:?}", other),
        }
    }

    #[test]
    fn test_at_command_too_long() {
        let result = encode_command(&Command::At("X".repeat(300)), LinkProfile::Canonical);
        assert!(matches!(result, Err(GroundStationError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_binary_commands() {
        let payload = encode_command_payload(&Command::BinaryEnd(vec![1, 2, 3])).unwrap();
        assert_eq!(payload, vec![0x07, 1, 2, 3]);

    }

    #[test]
    fn test_encode_command_frame() {
        let frame = encode_command(&Command::Launch, LinkProfile::Canonical).unwrap();
        assert_eq!(frame, vec![0xFF, 0x02, 0x01, 0x01]);

        let frame = encode_command(&Command::Launch, LinkProfile::Legacy).unwrap();
        assert_eq!(frame, vec![0xFF, 0x02, 0x01, 0x01, 0x0A]);
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::Launch.to_string(), "LAUNCH");
        assert_eq!(Command::SetPressure(1000.5).to_string(), "SET_PRESSURE 1000.5");
        assert_eq!(Command::At("+VER".into()).to_string(), "AT +VER");
        assert_eq!(Command::BinaryContinue(vec![0; 64]).to_string(), "BINARY_DATA_PACKET (64 bytes)");
    }
}
