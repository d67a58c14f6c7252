//! # Link Protocol Module
//!
//! Framing for the serial link between the ground station and the CanSat.
//!
//! This module handles:
//! - Frame encoding (header, length, payload, XOR checksum)
//! - Frame decoding from a polled byte stream
//! - XOR checksum calculation
//! - Link profile selection (canonical or legacy terminator variant)

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod checksum;
