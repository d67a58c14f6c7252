//! # Binary File Uplink
//!
//! Sends a file to the payload as a paced sequence of 64-byte chunks.
//!
//! ## Chunk plan
//!
//! ```text
//! chunk 0      BINARY_DATA_START  (0x05)  data[0..64]
//! chunk 1..n-2 BINARY_DATA_PACKET (0x06)  data[64i..64i+64]
//! chunk n-1    BINARY_DATA_END    (0x07)  data[..] + xor(whole file)
//! ```
//!
//! The START rule is applied after the END rule, so a file that fits in one
//! chunk goes out as a single START chunk: it still carries the whole-file
//! checksum, but no END opcode. The payload firmware depends on this.
//!
//! There is no acknowledgment; chunks are spaced by a fixed pacing delay.

pub mod session;

use crate::command::Command;
use crate::link::checksum::xor_checksum;
use crate::link::protocol::Opcode;

/// Bytes of file data per chunk
pub const UPLINK_CHUNK_SIZE: usize = 64;

/// Default delay between chunks
pub const DEFAULT_PACING_MS: u64 = 200;

/// One planned uplink chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkChunk {
    pub opcode: Opcode,
    /// File bytes, plus the checksum trailer on the final chunk
    pub data: Vec<u8>,
}

impl UplinkChunk {
    /// Binary upload command carrying this chunk
    pub fn command(&self) -> Command {
        let data = self.data.clone();
        match self.opcode {
            Opcode::BinaryStart => Command::BinaryStart(data),
            Opcode::BinaryEnd => Command::BinaryEnd(data),
            _ => Command::BinaryContinue(data),
        }
    }
}

/// Split a file into uplink chunks
///
/// # Arguments
///
/// * `blob` - Complete file contents
///
/// # Returns
///
/// * `Vec<UplinkChunk>` - `ceil(len / 64)` chunks, empty for an empty blob
///
/// # Examples
///
/// ```
/// use cansat_ground::uplink::plan_uplink;
/// use cansat_ground::link::protocol::Opcode;
///
/// let plan = plan_uplink(&[0u8; 100]);
/// assert_eq!(plan.len(), 2);
/// assert_eq!(plan[0].opcode, Opcode::BinaryStart);
/// assert_eq!(plan[1].opcode, Opcode::BinaryEnd);
/// ```
pub fn plan_uplink(blob: &[u8]) -> Vec<UplinkChunk> {
    let total_checksum = xor_checksum(blob);
    let count = blob.len().div_ceil(UPLINK_CHUNK_SIZE);

    blob.chunks(UPLINK_CHUNK_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            let mut opcode = Opcode::BinaryContinue;
            let mut data = chunk.to_vec();

            if i == count - 1 {
                opcode = Opcode::BinaryEnd;
                data.push(total_checksum);
            }
            if i == 0 {
                opcode = Opcode::BinaryStart;
            }

            UplinkChunk { opcode, data }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_plan_chunk_counts_and_reconstruction() {
        for len in [0usize, 1, 63, 64, 65, 128, 259, 512] {
            let data = blob(len);
            let plan = plan_uplink(&data);

            assert_eq!(plan.len(), len.div_ceil(UPLINK_CHUNK_SIZE), "chunk count for {}", len);
            if len == 0 {
                continue;
            }

            let mut rebuilt = Vec::new();
            for (i, chunk) in plan.iter().enumerate() {
                let file_bytes = if i == plan.len() - 1 {
                    &chunk.data[..chunk.data.len() - 1]
                } else {
                    &chunk.data[..]
                };
                assert!(file_bytes.len() <= UPLINK_CHUNK_SIZE);
                rebuilt.extend_from_slice(file_bytes);
            }
            assert_eq!(rebuilt, data, "reconstruction for {}", len);

            let last = plan.last().unwrap();
            assert_eq!(*last.data.last().unwrap(), xor_checksum(&data), "trailer for {}", len);
        }
    }

    #[test]
    fn test_plan_single_byte_is_start_only() {
        let plan = plan_uplink(&[0x42]);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].opcode, Opcode::BinaryStart);
        assert_eq!(plan[0].data, vec![0x42, 0x42]);
    }

    #[test]
    fn test_plan_exact_chunk_is_start_only() {
        let plan = plan_uplink(&[0x01; 64]);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].opcode, Opcode::BinaryStart);
        assert_eq!(plan[0].data.len(), 65);
    }

    #[test]
    fn test_plan_opcode_sequence() {
        let plan = plan_uplink(&blob(259));
        let opcodes: Vec<Opcode> = plan.iter().map(|c| c.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::BinaryStart,
                Opcode::BinaryContinue,
                Opcode::BinaryContinue,
                Opcode::BinaryContinue,
                Opcode::BinaryEnd,
            ]
        );
        assert_eq!(plan[4].data.len(), 3 + 1);
    }

    #[test]
    fn test_plan_two_chunks_has_no_continue() {
        let plan = plan_uplink(&blob(65));
        assert_eq!(plan[0].opcode, Opcode::BinaryStart);
        assert_eq!(plan[0].data.len(), 64);
        assert_eq!(plan[1].opcode, Opcode::BinaryEnd);
        assert_eq!(plan[1].data.len(), 2);
    }

    #[test]
    fn test_chunk_command() {
        let chunk = UplinkChunk { opcode: Opcode::BinaryContinue, data: vec![1, 2, 3] };
        assert_eq!(chunk.command(), Command::BinaryContinue(vec![1, 2, 3]));

        let plan = plan_uplink(&[0x42]);
        assert_eq!(plan[0].command(), Command::BinaryStart(vec![0x42, 0x42]));
    }
}
