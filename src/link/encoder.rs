//! # Frame Encoder
//!
//! Wraps opaque payloads into link frames.

use bytes::{BufMut, BytesMut};

use super::protocol::*;

/// Encode a payload into a complete frame
///
/// # Arguments
///
/// * `payload` - Payload bytes (at most 254)
/// * `profile` - Wire variant; legacy appends the 0x0A terminator
///
/// # Returns
///
/// * `Result<Vec<u8>>` - `0xFF | len+1 | payload | xor [| 0x0A]`
///
/// # Errors
///
/// Returns `FrameTooLarge` if the payload exceeds MAX_PAYLOAD_SIZE
///
/// # Examples
///
/// ```
/// use cansat_ground::link::encoder::encode_frame;
/// use cansat_ground::link::protocol::LinkProfile;
///
/// let frame = encode_frame(&[0x01], LinkProfile::Canonical).unwrap();
/// assert_eq!(frame, vec![0xFF, 0x02, 0x01, 0x01]);
/// ```
pub fn encode_frame(payload: &[u8], profile: LinkProfile) -> crate::error::Result<Vec<u8>> {
    let frame = Frame::new(payload.to_vec())?;
    Ok(encode(&frame, profile))
}

/// Serialize an already validated frame
pub fn encode(frame: &Frame, profile: LinkProfile) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(profile.frame_len(frame.payload.len()));
    buf.put_u8(FRAME_HEADER);
    buf.put_u8(frame.length());
    buf.put_slice(&frame.payload);
    buf.put_u8(frame.checksum);
    buf.put_slice(profile.trailer());

    buf.to_vec()
}
