//! # CanSat Ground Station Library
//!
//! Link protocol engine for a CanSat ground station: frames commands and
//! binary uploads for the radio link, and turns the payload's telemetry
//! frames back into records.
//!
//! - [`link`]: frame encode/decode with XOR checksum
//! - [`telemetry`]: telemetry payload decoding and JSONL logging
//! - [`command`]: uplink command payloads and the console parser
//! - [`uplink`]: paced binary file upload
//! - [`station`]: the event loop that owns the serial port

pub mod command;
pub mod config;
pub mod error;
pub mod link;
pub mod serial;
pub mod session;
pub mod simulation;
pub mod station;
pub mod task;
pub mod telemetry;
pub mod uplink;
