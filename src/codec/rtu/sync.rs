// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response boundary recovery.
//!
//! A half-duplex capture window holds at most one request immediately
//! followed by at most one response, with nothing but timing between
//! them. Boundaries are recovered by brute force: try every candidate
//! length and accept the first one whose trailing CRC matches and
//! whose fields decode. A 16-bit CRC makes an accidental match at a
//! wrong boundary extremely unlikely.

use core::time::Duration;

use super::{MAX_FRAME_LEN, MIN_FRAME_LEN, decode, validate_crc};
use crate::frame::{Frame, FramePair};

/// Smallest capture the synchronizer accepts: two minimum-size frames.
pub const MIN_CAPTURE_LEN: usize = 10;

/// Split a raw capture into a request/response pair.
///
/// Scans the two slots in order. Each slot consumes the first
/// candidate length (ascending, from [`MIN_FRAME_LEN`] up to the
/// remaining bytes capped at [`MAX_FRAME_LEN`]) that passes both CRC
/// validation and field decoding; a slot that finds no frame ends the
/// scan. A pair with both slots filled is discarded wholesale when
/// slave id or function code disagree, even though each frame decoded
/// on its own.
///
/// Returns `None` for captures shorter than [`MIN_CAPTURE_LEN`], for
/// captures without a single recognizable frame and for inconsistent
/// pairs.
#[must_use]
pub fn split(buf: &[u8]) -> Option<FramePair> {
    if buf.len() < MIN_CAPTURE_LEN {
        return None;
    }

    let mut slots: [Option<Frame>; 2] = [None, None];
    let mut offset = 0;

    for slot in &mut slots {
        match scan_frame(&buf[offset..]) {
            Some((frame, len)) => {
                *slot = Some(frame);
                offset += len;
            }
            None => break,
        }
    }

    let [request, response] = slots;
    if request.is_none() && response.is_none() {
        #[cfg(feature = "log")]
        log::debug!("No frame recognized in {} byte capture", buf.len());
        return None;
    }

    if let (Some(req), Some(rsp)) = (&request, &response) {
        if req.slave != rsp.slave || req.function != rsp.function {
            #[cfg(feature = "log")]
            log::warn!(
                "Discarding mismatched pair: request unit {} fn {:?}, response unit {} fn {:?}",
                req.slave,
                req.function,
                rsp.slave,
                rsp.function
            );
            return None;
        }
    }

    Some(FramePair {
        request,
        response,
        round_trip: Duration::ZERO,
    })
}

/// Find the first decodable frame at the start of `buf`, returning it
/// together with its length.
fn scan_frame(buf: &[u8]) -> Option<(Frame, usize)> {
    let max_len = buf.len().min(MAX_FRAME_LEN);
    for try_len in MIN_FRAME_LEN..=max_len {
        let candidate = &buf[..try_len];
        if !matches!(validate_crc(candidate), Some((true, _))) {
            continue;
        }
        // The checksum matched; field decoding still rejects frames
        // whose layout is inconsistent with their function code.
        if let Ok(frame) = decode(candidate) {
            return Some((frame, try_len));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::rtu::crc16;
    use crate::frame::FunctionCode;

    // Append `body` plus its wire CRC (low byte first) to `buf`.
    fn push_adu(body: &[u8], buf: &mut [u8], offset: usize) -> usize {
        buf[offset..offset + body.len()].copy_from_slice(body);
        let crc = crc16(body);
        buf[offset + body.len()] = (crc & 0xFF) as u8;
        buf[offset + body.len() + 1] = (crc >> 8) as u8;
        offset + body.len() + 2
    }

    #[test]
    fn reject_short_capture() {
        assert!(split(&[]).is_none());
        assert!(split(&[0x01; 9]).is_none());
    }

    #[test]
    fn reject_noise_capture() {
        assert!(split(&[0x42; 32]).is_none());
    }

    #[test]
    fn split_request_and_response() {
        let buf = &mut [0; 64];
        let mid = push_adu(&[0x01, 0x03, 0x00, 0x0A, 0x00, 0x02], buf, 0);
        let end = push_adu(&[0x01, 0x03, 0x04, 0xAB, 0xCD, 0xEF, 0x12], buf, mid);

        let pair = split(&buf[..end]).unwrap();
        assert!(pair.is_complete());

        let req = pair.request.unwrap();
        assert_eq!(req.slave, 1);
        assert_eq!(req.function, Some(FunctionCode::ReadHoldingRegisters));
        assert_eq!(req.start_address, 10);
        assert_eq!(req.quantity, 2);
        assert!(req.payload.is_empty());

        let rsp = pair.response.unwrap();
        assert_eq!(rsp.slave, 1);
        assert_eq!(rsp.byte_count, 4);
        assert_eq!(rsp.payload.as_bytes(), &[0xAB, 0xCD, 0xEF, 0x12]);
    }

    #[test]
    fn split_request_without_response() {
        let buf = &mut [0; 32];
        let end = push_adu(&[0x01, 0x03, 0x00, 0x0A, 0x00, 0x08], buf, 0);
        // Pad so the capture clears the minimum size; the padding is
        // not a decodable frame.
        buf[end] = 0x42;
        buf[end + 1] = 0x42;

        let pair = split(&buf[..end + 2]).unwrap();
        assert!(pair.request.is_some());
        assert!(pair.response.is_none());
    }

    #[test]
    fn split_write_multiple_transaction() {
        let buf = &mut [0; 64];
        let mid = push_adu(
            &[0x11, 0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0xAA, 0xBB, 0xCC, 0xDD],
            buf,
            0,
        );
        let end = push_adu(&[0x11, 0x10, 0x00, 0x01, 0x00, 0x02], buf, mid);

        let pair = split(&buf[..end]).unwrap();
        assert!(pair.is_complete());
        let req = pair.request.unwrap();
        assert_eq!(req.payload.as_bytes(), &[0xAA, 0xBB, 0xCC, 0xDD]);
        let rsp = pair.response.unwrap();
        assert_eq!(rsp.start_address, 1);
        assert_eq!(rsp.quantity, 2);
        assert!(rsp.payload.is_empty());
    }

    #[test]
    fn reject_pair_with_slave_mismatch() {
        let buf = &mut [0; 64];
        let mid = push_adu(&[0x01, 0x03, 0x00, 0x0A, 0x00, 0x02], buf, 0);
        let end = push_adu(&[0x02, 0x03, 0x04, 0xAB, 0xCD, 0xEF, 0x12], buf, mid);

        // Both frames decode individually...
        assert!(decode(&buf[..mid]).is_ok());
        assert!(decode(&buf[mid..end]).is_ok());
        // ...but the pair is inconsistent.
        assert!(split(&buf[..end]).is_none());
    }

    #[test]
    fn reject_pair_with_function_code_mismatch() {
        let buf = &mut [0; 64];
        let mid = push_adu(&[0x01, 0x03, 0x00, 0x0A, 0x00, 0x02], buf, 0);
        let end = push_adu(&[0x01, 0x04, 0x04, 0xAB, 0xCD, 0xEF, 0x12], buf, mid);
        assert!(split(&buf[..end]).is_none());
    }

    #[test]
    fn round_trip_defaults_to_zero() {
        let buf = &mut [0; 32];
        let mid = push_adu(&[0x01, 0x03, 0x00, 0x0A, 0x00, 0x02], buf, 0);
        let end = push_adu(&[0x01, 0x03, 0x02, 0x12, 0x34], buf, mid);
        let pair = split(&buf[..end]).unwrap();
        assert_eq!(pair.round_trip, Duration::ZERO);
    }
}
