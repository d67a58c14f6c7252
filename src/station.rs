//! # Ground Station Loop
//!
//! Single owner of the serial port. One `tokio::select!` loop multiplexes:
//!
//! - the telemetry poll tick (read a frame, decode it, log it)
//! - console lines typed by the operator
//! - events from the running background transfer, if any
//! - shutdown (Ctrl+C)
//!
//! Every write to the port happens here, one whole frame at a time, so
//! commands and background frames never interleave on the wire.

use std::future::Future;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::command::parser::{parse_console_command, ConsoleCommand, HELP_TEXT};
use crate::command::{encode_command, Command};
use crate::config::Config;
use crate::error::{FrameError, Result};
use crate::link::protocol::FrameResult;
use crate::serial::port_trait::SerialPortIO;
use crate::serial::GroundSerial;
use crate::session::GroundSession;
use crate::simulation::PressureStream;
use crate::task::{BackgroundTask, TaskEvent};
use crate::telemetry::decoder::{decode_telemetry, TelemetryLayout};
use crate::telemetry::logger::TelemetryLogger;
use crate::uplink::session::UplinkSession;

/// Counters reported when the station stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StationStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub frames_sent: u64,
    pub read_errors: u64,
    pub write_errors: u64,
}

/// Ground station: serial link, session logs and the running transfer
pub struct Station<P: SerialPortIO, W: Write> {
    serial: GroundSerial<P>,
    config: Config,
    session: GroundSession,
    telemetry_log: Option<TelemetryLogger>,
    background: Option<BackgroundTask>,
    /// Frames written for the current background task
    background_sent: usize,
    output: W,
    stats: StationStats,
    /// Set while consecutive polls fail, so the operator is told once
    read_failing: bool,
}

impl<P: SerialPortIO, W: Write> Station<P, W> {
    /// Build a station around an open serial link
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the telemetry log directory cannot be created
    pub fn new(serial: GroundSerial<P>, config: Config, output: W) -> Result<Self> {
        let telemetry_log = if config.telemetry.enabled {
            Some(TelemetryLogger::new(&config.telemetry)?)
        } else {
            info!("Telemetry logging disabled");
            None
        };

        Ok(Self {
            serial,
            config,
            session: GroundSession::new(),
            telemetry_log,
            background: None,
            background_sent: 0,
            output,
            stats: StationStats::default(),
            read_failing: false,
        })
    }

    pub fn session(&self) -> &GroundSession {
        &self.session
    }

    pub fn stats(&self) -> StationStats {
        self.stats
    }

    /// Name of the running background transfer
    pub fn background_task(&self) -> Option<&'static str> {
        self.background.as_ref().map(BackgroundTask::name)
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Run until `exit`, end of console input, or `shutdown` completes
    ///
    /// # Errors
    ///
    /// Returns an error only if console output cannot be written. Serial
    /// failures are reported to the operator and the loop keeps running.
    pub async fn run<S>(&mut self, mut console: mpsc::Receiver<String>, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut poll = interval(Duration::from_millis(self.config.serial.poll_interval_ms));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Station running on {} ({} profile)",
            self.serial.device_path(),
            self.config.link.profile
        );
        self.session.note(format!(
            "Type commands. \"toggle\" switches raw/decoded, \"help\" lists commands, \"exit\" quits. [{}]",
            self.session.view()
        ));
        self.flush_output()?;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    self.session.note("Exiting application...");
                    break;
                }

                line = console.recv() => {
                    let Some(line) = line else {
                        debug!("Console input closed");
                        break;
                    };
                    if self.handle_line(&line).await?.is_break() {
                        self.flush_output()?;
                        break;
                    }
                }

                event = next_task_event(&mut self.background) => {
                    self.handle_task_event(event).await;
                }

                _ = poll.tick() => {
                    self.poll_once().await;
                }
            }

            self.flush_output()?;
        }

        self.stop_background();
        self.flush_output()?;
        info!(
            "Station stopped: {} frames received, {} dropped, {} sent, {} read errors, {} write errors",
            self.stats.frames_received,
            self.stats.frames_dropped,
            self.stats.frames_sent,
            self.stats.read_errors,
            self.stats.write_errors
        );
        Ok(())
    }

    /// Read at most one frame from the port and record it
    ///
    /// A port error is counted and reported; the next poll tries again.
    pub async fn poll_once(&mut self) {
        let profile = self.config.link.profile;
        let timeout = Duration::from_millis(self.config.serial.read_timeout_ms);

        let result = match self.serial.poll_frame(profile, timeout).await {
            Ok(result) => {
                if self.read_failing {
                    info!("Serial reads recovered");
                    self.session.note("Serial link recovered");
                    self.read_failing = false;
                }
                result
            }
            Err(e) => {
                self.stats.read_errors += 1;
                if self.read_failing {
                    debug!("Serial read failed: {}", e);
                } else {
                    warn!("Serial read failed: {}", e);
                    self.session.note(format!("Error: {}", e));
                    self.read_failing = true;
                }
                return;
            }
        };

        match result {
            FrameResult::Frame(frame) => {
                self.stats.frames_received += 1;
                self.session.record_frame(&frame);

                let decoded = decode_telemetry(&frame.payload, TelemetryLayout::for_profile(profile));
                for e in &decoded.errors {
                    warn!("Telemetry decode: {}", e);
                }
                self.session.record_telemetry(&decoded);

                if let Some(logger) = self.telemetry_log.as_mut() {
                    if let Err(e) = logger.log(&decoded) {
                        error!("Failed to write telemetry log: {}", e);
                    }
                }
            }
            FrameResult::Idle => {}
            FrameResult::Dropped(e @ FrameError::Sync { .. }) => {
                // One per stray byte while hunting for a header
                self.stats.frames_dropped += 1;
                trace!("Dropped frame: {}", e);
            }
            FrameResult::Dropped(e) => {
                self.stats.frames_dropped += 1;
                warn!("Dropped frame: {}", e);
                self.session.note(format!("Dropped frame: {}", e));
            }
        }
    }

    /// Act on one console line
    ///
    /// Returns `Break` when the operator asked to exit.
    pub async fn handle_line(&mut self, line: &str) -> Result<ControlFlow<()>> {
        let command = match parse_console_command(line) {
            Ok(command) => command,
            Err(e) => {
                debug!("Rejected console input {:?}: {}", line, e);
                self.session.note(e.to_string());
                return Ok(ControlFlow::Continue(()));
            }
        };

        let stopped = command.preempts_background() && self.stop_background();

        match command {
            ConsoleCommand::Send(command) => self.send_command(&command).await,
            ConsoleCommand::SendSimulation(path) => self.start_simulation(path),
            ConsoleCommand::SendBinary(path) => self.start_uplink(path),
            ConsoleCommand::Cancel if !stopped => self.session.note("No transfer running"),
            ConsoleCommand::Cancel => {}
            ConsoleCommand::ToggleView => {
                let view = self.session.toggle_view();
                writeln!(self.output, "=== {} ===", view)?;
            }
            ConsoleCommand::Help => self.session.note(HELP_TEXT),
            ConsoleCommand::Exit => {
                self.session.note("Exiting application...");
                return Ok(ControlFlow::Break(()));
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    async fn send_command(&mut self, command: &Command) {
        let frame = match encode_command(command, self.config.link.profile) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Cannot encode {}: {}", command, e);
                self.session.note(e.to_string());
                return;
            }
        };

        if let Err(e) = self.serial.send_frame(&frame).await {
            self.stats.write_errors += 1;
            warn!("Failed to send {}: {}", command, e);
            self.session.note(format!("Error sending {}: {}", command, e));
            return;
        }

        self.stats.frames_sent += 1;
        info!("Sent command: {}", command);
        self.session.note(command_feedback(command));
    }

    fn start_simulation(&mut self, path: Option<PathBuf>) {
        let path = path.unwrap_or_else(|| PathBuf::from(&self.config.simulation.profile_path));
        let stream = match PressureStream::load(&path) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Simulation not started: {}", e);
                self.session.note(format!("Error: {}", e));
                return;
            }
        };

        let profile = self.config.link.profile;
        let pacing = Duration::from_millis(self.config.simulation.interval_ms);
        self.background = Some(BackgroundTask::spawn("simulation", move |events, cancel| {
            stream.run(profile, pacing, events, cancel)
        }));
        self.background_sent = 0;
        self.session.note("Started simulated pressure transmission...");
    }

    fn start_uplink(&mut self, path: Option<PathBuf>) {
        let path = path.unwrap_or_else(|| PathBuf::from(&self.config.uplink.default_file));
        let session = match UplinkSession::load(&path) {
            Ok(session) => session,
            Err(e) => {
                warn!("Uplink not started: {}", e);
                self.session.note(format!("Error: {}", e));
                return;
            }
        };

        let profile = self.config.link.profile;
        let pacing = Duration::from_millis(self.config.uplink.pacing_ms);
        self.background = Some(BackgroundTask::spawn("uplink", move |events, cancel| {
            session.run(profile, pacing, events, cancel)
        }));
        self.background_sent = 0;
        self.session.note(format!("Started sending binary file {}...", path.display()));
    }

    /// Cancel the running transfer and discard anything it queued
    fn stop_background(&mut self) -> bool {
        let Some(task) = self.background.take() else {
            return false;
        };

        info!("Cancelling {} after {} packets", task.name(), self.background_sent);
        self.session.note(format!(
            "Cancelled {} after {} packets",
            task.name(),
            self.background_sent
        ));
        true
    }

    async fn handle_task_event(&mut self, event: Option<TaskEvent>) {
        match event {
            Some(TaskEvent::Frame { bytes, note }) => {
                if let Err(e) = self.serial.send_frame(&bytes).await {
                    // A transfer with a lost frame is useless; end it
                    self.stats.write_errors += 1;
                    let task = self.background_task().unwrap_or("transfer");
                    error!("{} failed: {}", task, e);
                    self.session.note(format!("Error during {}: {}", task, e));
                    self.stop_background();
                    return;
                }
                self.stats.frames_sent += 1;
                self.background_sent += 1;
                self.session.note(note);
            }
            Some(TaskEvent::Note(note)) => self.session.note(note),
            Some(TaskEvent::Finished { task, outcome }) => {
                info!("{} finished: {}", task, outcome);
                self.session.note(format!("Finished {}: {}", task, outcome));
                self.background = None;
            }
            Some(TaskEvent::Failed { task, error }) => {
                error!("{} failed: {}", task, error);
                self.session.note(format!("Error during {}: {}", task, error));
                self.background = None;
            }
            None => {
                warn!("Background task exited without reporting");
                self.background = None;
            }
        }
    }

    /// Write new lines of the active view to the console
    fn flush_output(&mut self) -> Result<()> {
        for line in self.session.take_new_lines() {
            writeln!(self.output, "{}", line)?;
        }
        self.output.flush()?;
        Ok(())
    }
}

/// Next event of the running task, or never if there is none
async fn next_task_event(task: &mut Option<BackgroundTask>) -> Option<TaskEvent> {
    match task {
        Some(task) => task.next_event().await,
        None => std::future::pending().await,
    }
}

/// Operator feedback line for a sent command
pub fn command_feedback(command: &Command) -> String {
    match command {
        Command::Reset => "Sent reset command".to_string(),
        Command::Launch => "Sent launch command".to_string(),
        Command::SetPressure(value) => format!("Sent pressure: {}", value),
        Command::EnterSimulation => "Entered simulation mode".to_string(),
        Command::CalibrateAltitude => "Sent calibrate altitude command".to_string(),
        Command::Servo => "Sent servo command".to_string(),
        Command::At(_) => format!("Sent AT command: {}", command),
        Command::StartupAck => "Sent startup acknowledgment".to_string(),
        other => format!("Sent {}", other),
    }
}
