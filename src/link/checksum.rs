//! # XOR Checksum
//!
//! Single-byte XOR fold used to detect corruption on the serial link.
//! Detects any single-bit error; it is not meant to resist tampering.

/// Calculate XOR checksum over a byte slice
///
/// # Arguments
///
/// * `data` - Bytes to fold (frame payload, or a whole uplink file)
///
/// # Returns
///
/// * `u8` - XOR of every byte, `0x00` for an empty slice
///
/// # Examples
///
/// ```
/// use cansat_ground::link::checksum::xor_checksum;
///
/// assert_eq!(xor_checksum(&[0x01, 0x02, 0x04]), 0x07);
/// assert_eq!(xor_checksum(&[]), 0x00);
/// ```
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &byte| acc ^ byte)
}
