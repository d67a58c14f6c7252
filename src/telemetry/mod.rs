//! # Telemetry Module
//!
//! Downlink telemetry decoding and logging.
//!
//! This module handles:
//! - Decoding fixed-layout telemetry payloads into structured records
//! - Formatting records as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Retaining only the last N files

pub mod types;
pub mod decoder;
pub mod logger;
