// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU frame decoding.
//!
//! RTU frames carry no length field or frame marker; a frame is only
//! delimited by its trailing CRC and inter-frame idle time. The
//! decoder therefore works on a candidate byte range and reports via
//! [`ErrorKind`] whether that range forms a complete, checksummed
//! frame.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{
    error::ErrorKind,
    frame::{Frame, FunctionCode, Payload},
};

mod sync;
pub use self::sync::{MIN_CAPTURE_LEN, split};

// [MODBUS over Serial Line Specification and Implementation Guide V1.02](http://modbus.org/docs/Modbus_over_serial_line_V1_02.pdf), page 13
// "The maximum size of a MODBUS RTU frame is 256 bytes."
pub const MAX_FRAME_LEN: usize = 256;

/// Smallest possible ADU: slave id, function code, one data byte and
/// the two CRC bytes.
pub const MIN_FRAME_LEN: usize = 5;

// Fixed ADU length shared by read requests (slave + fc + address +
// quantity + CRC), write-single frames and write-multiple
// acknowledgments.
const FIXED_ADU_LEN: usize = 8;

// Offset of the first data byte in a write-multiple request; its ADU
// is this header plus the declared byte count plus the CRC.
const WRITE_MULTIPLE_DATA_OFFSET: usize = 7;

/// Calculate the CRC (Cyclic Redundancy Check) sum.
///
/// Standard Modbus variant: initial value `0xFFFF`, reflected
/// polynomial `0xA001`. Total over any input length; the empty input
/// yields the initial value.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Verify the trailing CRC of a candidate frame.
///
/// The wire transmits the CRC low byte first. Returns `None` for
/// buffers too short to carry a checksum at all, otherwise whether the
/// received CRC matches, together with the calculated value (needed
/// for diagnostics even on mismatch).
#[must_use]
pub fn validate_crc(buf: &[u8]) -> Option<(bool, u16)> {
    if buf.len() < 3 {
        return None;
    }
    let (payload, crc_buf) = buf.split_at(buf.len() - 2);
    let calculated = crc16(payload);
    let received = LittleEndian::read_u16(crc_buf);
    Some((calculated == received, calculated))
}

/// Wire shape of a read-class frame.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadShape {
    /// Fixed 8-byte request: address and quantity.
    Request,
    /// Variable-length response: byte count and data.
    Response,
    /// An 8-byte frame that is a legal request *and* a legal 3-byte
    /// response; decoded as a request.
    Ambiguous,
}

/// Classify a read-class frame (`0x01`-`0x04`) as request or response.
///
/// The same function code is used in both directions and the two
/// layouts share no discriminator, so the only usable signal is the
/// total ADU length: requests are always exactly 8 bytes. An 8-byte
/// buffer whose count field reads 3 would also be a complete response,
/// which is reported as [`ReadShape::Ambiguous`].
#[must_use]
pub const fn classify_read_shape(adu_len: usize, count_field: u8) -> ReadShape {
    if adu_len != FIXED_ADU_LEN {
        return ReadShape::Response;
    }
    // A response ADU occupies 5 + count bytes.
    if count_field as usize + MIN_FRAME_LEN == FIXED_ADU_LEN {
        ReadShape::Ambiguous
    } else {
        ReadShape::Request
    }
}

/// Decode a single RTU frame out of `buf`.
///
/// The whole buffer must form exactly one frame: checksum first, then
/// the function-specific field layout. On a CRC mismatch the error
/// carries both the received and the calculated value. Exception
/// responses (function code above `0x80`) are flagged as
/// [`ErrorKind::InvalidFnCode`] without decoding the exception code.
///
/// A read response whose declared byte count exceeds the buffer or
/// the [`Payload`] cap is *not* rejected; the declared count is kept
/// while the copied data is clamped. Such a count cannot result from
/// an intact transmission, but the lenient behavior keeps truncated
/// captures inspectable.
pub fn decode(buf: &[u8]) -> Result<Frame, ErrorKind> {
    if buf.len() < MIN_FRAME_LEN {
        return Err(ErrorKind::LengthTooShort);
    }
    let Some((crc_ok, calculated)) = validate_crc(buf) else {
        return Err(ErrorKind::LengthTooShort);
    };
    let received = LittleEndian::read_u16(&buf[buf.len() - 2..]);
    if !crc_ok {
        return Err(ErrorKind::CrcMismatch {
            received,
            calculated,
        });
    }

    let slave = buf[0];
    let fn_code = buf[1];
    let Some(function) = FunctionCode::new(fn_code) else {
        return Err(ErrorKind::InvalidFnCode(fn_code));
    };

    let mut frame = Frame {
        slave,
        function: Some(function),
        crc: received,
        calculated_crc: calculated,
        error: ErrorKind::None,
        valid: true,
        ..Frame::default()
    };

    use FunctionCode as F;
    match function {
        F::ReadCoils | F::ReadDiscreteInputs | F::ReadHoldingRegisters | F::ReadInputRegisters => {
            match classify_read_shape(buf.len(), buf[2]) {
                ReadShape::Request | ReadShape::Ambiguous => {
                    frame.start_address = BigEndian::read_u16(&buf[2..4]);
                    frame.quantity = BigEndian::read_u16(&buf[4..6]);
                }
                ReadShape::Response => {
                    let byte_count = buf[2];
                    let available = buf.len() - MIN_FRAME_LEN;
                    let copied = (byte_count as usize).min(available);
                    frame.byte_count = byte_count;
                    frame.payload = Payload::copy_from(&buf[3..3 + copied]);
                }
            }
        }
        F::WriteSingleCoil | F::WriteSingleRegister => {
            // Identical fixed shape in both directions.
            if buf.len() != FIXED_ADU_LEN {
                return Err(ErrorKind::InvalidData(0));
            }
            frame.start_address = BigEndian::read_u16(&buf[2..4]);
            frame.payload = Payload::copy_from(&buf[4..6]);
        }
        F::WriteMultipleCoils | F::WriteMultipleRegisters => {
            if buf.len() == FIXED_ADU_LEN {
                // Acknowledgment response: echo of address and quantity.
                frame.start_address = BigEndian::read_u16(&buf[2..4]);
                frame.quantity = BigEndian::read_u16(&buf[4..6]);
            } else {
                if buf.len() < WRITE_MULTIPLE_DATA_OFFSET + 2 {
                    return Err(ErrorKind::InvalidData(0));
                }
                let byte_count = buf[6];
                if buf.len() != WRITE_MULTIPLE_DATA_OFFSET + byte_count as usize + 2 {
                    return Err(ErrorKind::InvalidData(byte_count));
                }
                frame.start_address = BigEndian::read_u16(&buf[2..4]);
                frame.quantity = BigEndian::read_u16(&buf[4..6]);
                frame.byte_count = byte_count;
                frame.payload = Payload::copy_from(
                    &buf[WRITE_MULTIPLE_DATA_OFFSET..WRITE_MULTIPLE_DATA_OFFSET + byte_count as usize],
                );
            }
        }
    }

    Ok(frame)
}
