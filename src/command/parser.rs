//! # Console Command Parser
//!
//! Turns a line typed at the ground station console into an action.
//!
//! | Input | Action |
//! |-------|--------|
//! | `reset` | Send RESET (also cancels any running transfer) |
//! | `launch` | Send LAUNCH |
//! | `pressure <value>` | Send SET_PRESSURE |
//! | `enter-sim` | Send ENTER_SIMULATION |
//! | `calibrate-altitude` | Send CALIBRATE_ALTITUDE |
//! | `servo` | Send SERVO |
//! | `AT [args]` | Send AT command |
//! | `startup-ack` | Send STARTUP_ACK |
//! | `send-sim [file]` | Stream a pressure profile |
//! | `send-bin [file]` | Upload a binary file |
//! | `cancel` | Stop the running transfer |
//! | `toggle` | Switch between raw and decoded view |
//! | `help` | Show this list |
//! | `exit` | Quit |

use std::path::PathBuf;

use super::Command;
use crate::error::{GroundStationError, Result};

/// Help text listing every console command
pub const HELP_TEXT: &str = "\
Available commands:
launch - Send launch command
pressure <value> - Set pressure value
enter-sim - Enter simulation mode
calibrate-altitude - Calibrate altitude
reset - Reset the system (cancels any running transfer)
send-sim [filename] - Start sending simulated pressure data
send-bin [filename] - Send binary file to CanSat
cancel - Stop the running transfer
servo - Send servo command
AT <args> - Send AT command
startup-ack - Send startup acknowledgment
toggle - Switch between raw and decoded view
help - Show this help
exit - Exit the application";

/// Action requested at the console
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Encode and send a single command
    Send(Command),
    /// Stream a pressure profile (None uses the configured file)
    SendSimulation(Option<PathBuf>),
    /// Upload a binary file (None uses the configured file)
    SendBinary(Option<PathBuf>),
    /// Stop the running background transfer
    Cancel,
    /// Switch the displayed log
    ToggleView,
    Help,
    Exit,
}

impl ConsoleCommand {
    /// Whether this command must stop a running background transfer first
    pub fn preempts_background(&self) -> bool {
        matches!(
            self,
            ConsoleCommand::Send(Command::Reset)
                | ConsoleCommand::SendSimulation(_)
                | ConsoleCommand::SendBinary(_)
                | ConsoleCommand::Cancel
                | ConsoleCommand::Exit
        )
    }
}

/// Parse one console line
///
/// # Errors
///
/// Returns `InvalidCommand` for empty input, unknown keywords, or bad arguments
///
/// # Examples
///
/// ```
/// use cansat_ground::command::Command;
/// use cansat_ground::command::parser::{parse_console_command, ConsoleCommand};
///
/// let cmd = parse_console_command("pressure 101325").unwrap();
/// assert_eq!(cmd, ConsoleCommand::Send(Command::SetPressure(101325.0)));
/// ```
pub fn parse_console_command(line: &str) -> Result<ConsoleCommand> {
    let mut parts = line.split_whitespace();
    let Some(keyword) = parts.next() else {
        return Err(GroundStationError::InvalidCommand("empty input".to_string()));
    };
    let args: Vec<&str> = parts.collect();

    let command = match keyword {
        "reset" => ConsoleCommand::Send(Command::Reset),
        "launch" => ConsoleCommand::Send(Command::Launch),
        "enter-sim" => ConsoleCommand::Send(Command::EnterSimulation),
        "calibrate-altitude" => ConsoleCommand::Send(Command::CalibrateAltitude),
        "servo" => ConsoleCommand::Send(Command::Servo),
        "startup-ack" => ConsoleCommand::Send(Command::StartupAck),
        "AT" => ConsoleCommand::Send(Command::At(args.join(" "))),
        "pressure" => {
            let [value] = args.as_slice() else {
                return Err(GroundStationError::InvalidCommand(
                    "usage: pressure <value>".to_string(),
                ));
            };
            let value: f32 = value.parse().map_err(|_| {
                GroundStationError::InvalidCommand(format!("Invalid pressure value: {}", value))
            })?;
            if !value.is_finite() {
                return Err(GroundStationError::InvalidCommand(format!(
                    "Invalid pressure value: {}",
                    value
                )));
            }
            ConsoleCommand::Send(Command::SetPressure(value))
        }
        "send-sim" => ConsoleCommand::SendSimulation(args.first().map(PathBuf::from)),
        "send-bin" => ConsoleCommand::SendBinary(args.first().map(PathBuf::from)),
        "cancel" => ConsoleCommand::Cancel,
        "toggle" => ConsoleCommand::ToggleView,
        "help" => ConsoleCommand::Help,
        "exit" => ConsoleCommand::Exit,
        _ => {
            return Err(GroundStationError::InvalidCommand(format!(
                "Unknown command: {}",
                line.trim()
            )))
        }
    };

    Ok(command)
}
