//! # Frame Decoder
//!
//! Pulls frames off the polled serial stream.
//!
//! Decoding is deliberately lossy: a byte that is not the header is discarded,
//! and a frame whose bytes do not all arrive within the read timeout is
//! abandoned. Nothing is buffered between calls, so the next call starts
//! hunting for a header from wherever the stream is.

use std::io;
use tokio::time::{timeout_at, Duration, Instant};
use tracing::trace;

use super::checksum::xor_checksum;
use super::protocol::*;
use crate::error::{FrameError, GroundStationError, Result};
use crate::serial::port_trait::SerialPortIO;

/// Read one frame from the serial port
///
/// # Arguments
///
/// * `port` - Serial port to read from
/// * `profile` - Wire variant expected on the link
/// * `timeout` - Budget for each stage of the read (header, length, body)
///
/// # Returns
///
/// * `Result<FrameResult>` - `Idle` if nothing arrived, `Dropped` for a
///   rejected frame, `Frame` on success
///
/// # Errors
///
/// Returns error only if the port itself fails
pub async fn read_frame<P>(port: &mut P, profile: LinkProfile, timeout: Duration) -> Result<FrameResult>
where
    P: SerialPortIO + ?Sized,
{
    let mut header = [0u8; 1];
    if read_within(port, &mut header, timeout).await? == 0 {
        return Ok(FrameResult::Idle);
    }

    if header[0] != FRAME_HEADER {
        trace!("Discarding non-header byte 0x{:02X}", header[0]);
        return Ok(FrameResult::Dropped(FrameError::Sync { found: header[0] }));
    }

    let mut length = [0u8; 1];
    if read_within(port, &mut length, timeout).await? == 0 {
        return Ok(FrameResult::Dropped(FrameError::Length { expected: 1, received: 0 }));
    }

    let length = length[0] as usize;
    if length == 0 {
        return Ok(FrameResult::Dropped(FrameError::ZeroLength));
    }

    let mut body = vec![0u8; length + profile.trailer().len()];
    let received = read_within(port, &mut body, timeout).await?;

    Ok(validate_body(&body[..received], length, profile))
}

/// Decode one frame from an in-memory buffer
///
/// Applies the same validation as [`read_frame`] to a captured byte stream.
/// Bytes beyond the first frame are ignored.
///
/// # Examples
///
/// ```
/// use cansat_ground::link::decoder::decode_frame;
/// use cansat_ground::link::protocol::{FrameResult, LinkProfile};
///
/// let result = decode_frame(&[0xFF, 0x02, 0x01, 0x01], LinkProfile::Canonical);
/// match result {
///     FrameResult::Frame(frame) => assert_eq!(frame.payload, vec![0x01]),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn decode_frame(bytes: &[u8], profile: LinkProfile) -> FrameResult {
    let Some((&header, rest)) = bytes.split_first() else {
        return FrameResult::Idle;
    };

    if header != FRAME_HEADER {
        return FrameResult::Dropped(FrameError::Sync { found: header });
    }

    let Some((&length, rest)) = rest.split_first() else {
        return FrameResult::Dropped(FrameError::Length { expected: 1, received: 0 });
    };

    let length = length as usize;
    if length == 0 {
        return FrameResult::Dropped(FrameError::ZeroLength);
    }

    let available = rest.len().min(length + profile.trailer().len());
    validate_body(&rest[..available], length, profile)
}

/// Check a frame body (payload + checksum [+ terminator]) against its length byte
fn validate_body(body: &[u8], length: usize, profile: LinkProfile) -> FrameResult {
    if body.len() < length {
        return FrameResult::Dropped(FrameError::Length {
            expected: length,
            received: body.len(),
        });
    }

    let (payload, rest) = body.split_at(length - CHECKSUM_LEN);
    let received = rest[0];
    let calculated = xor_checksum(payload);

    if calculated != received {
        return FrameResult::Dropped(FrameError::ChecksumMismatch { calculated, received });
    }

    if let LinkProfile::Legacy = profile {
        let found = body.get(length).copied();
        if found != Some(LEGACY_TERMINATOR) {
            return FrameResult::Dropped(FrameError::MissingTerminator { found });
        }
    }

    FrameResult::Frame(Frame {
        payload: payload.to_vec(),
        checksum: received,
    })
}

/// Fill `buf` from the port until full, end of stream, or the timeout expires
///
/// Returns the number of bytes actually read.
async fn read_within<P>(port: &mut P, buf: &mut [u8], timeout: Duration) -> Result<usize>
where
    P: SerialPortIO + ?Sized,
{
    let deadline = Instant::now() + timeout;
    let mut filled = 0;

    while filled < buf.len() {
        match timeout_at(deadline, port.read(&mut buf[filled..])).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => break,
            Ok(Err(e)) => {
                return Err(GroundStationError::Serial(format!("Failed to read from port: {}", e)));
            }
            Err(_elapsed) => break,
        }
    }

    Ok(filled)
}
