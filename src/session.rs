//! # Session Logs
//!
//! The station keeps two append-only logs for the life of the process: the
//! raw view (hex dump of every received frame) and the decoded view (one
//! block of text per telemetry record). Operator feedback goes to both.
//! Only one view is shown at a time.

use crate::link::protocol::Frame;
use crate::telemetry::decoder::DecodedTelemetry;

/// Which log is shown on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Raw,
    Decoded,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Raw => write!(f, "Raw Hex Output"),
            View::Decoded => write!(f, "Decoded Info"),
        }
    }
}

/// Raw and decoded logs plus the display cursor
#[derive(Debug)]
pub struct GroundSession {
    raw: Vec<String>,
    decoded: Vec<String>,
    view: View,
    /// Lines of the active view already handed out by `take_new_lines`
    shown: usize,
}

impl Default for GroundSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GroundSession {
    /// Start with the raw view active
    pub fn new() -> Self {
        Self {
            raw: Vec::new(),
            decoded: Vec::new(),
            view: View::Raw,
            shown: 0,
        }
    }

    /// Record a received frame as a hex line in the raw log
    pub fn record_frame(&mut self, frame: &Frame) {
        self.raw.push(frame.hex());
    }

    /// Record a decoded telemetry record, with any decode problems
    pub fn record_telemetry(&mut self, decoded: &DecodedTelemetry) {
        self.decoded.extend(decoded.record.to_string().lines().map(str::to_string));
        for error in &decoded.errors {
            self.decoded.push(format!("Warning: {}", error));
        }
    }

    /// Append a line of operator feedback to both logs
    pub fn note(&mut self, line: impl Into<String>) {
        let line = line.into();
        for text in line.lines() {
            self.raw.push(text.to_string());
            self.decoded.push(text.to_string());
        }
    }

    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    pub fn decoded(&self) -> &[String] {
        &self.decoded
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Switch views; the newly active view is replayed from the start
    pub fn toggle_view(&mut self) -> View {
        self.view = match self.view {
            View::Raw => View::Decoded,
            View::Decoded => View::Raw,
        };
        self.shown = 0;
        self.view
    }

    /// Lines of the active view not yet shown
    pub fn take_new_lines(&mut self) -> &[String] {
        let lines = match self.view {
            View::Raw => &self.raw,
            View::Decoded => &self.decoded,
        };
        let start = self.shown.min(lines.len());
        self.shown = lines.len();
        &lines[start..]
    }
}
