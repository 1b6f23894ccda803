// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

/// Decoding error.
///
/// `None` is the neutral value carried by a successfully decoded
/// [`Frame`](crate::Frame); all decoder entry points report failures
/// through the remaining variants.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No error
    #[default]
    None,
    /// Buffer too short to hold a frame
    LengthTooShort,
    /// Trailing checksum does not match the frame contents
    CrcMismatch {
        /// CRC as received on the wire
        received: u16,
        /// CRC calculated over the frame
        calculated: u16,
    },
    /// Unknown or exception function code
    InvalidFnCode(u8),
    /// Frame layout inconsistent with its function code
    InvalidData(u8),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorKind::*;

        match self {
            None => write!(f, "No error"),
            LengthTooShort => write!(f, "Buffer too short"),
            CrcMismatch {
                received,
                calculated,
            } => write!(
                f,
                "Invalid CRC: received = 0x{received:0>4X}, calculated = 0x{calculated:0>4X}"
            ),
            InvalidFnCode(fn_code) => write!(f, "Invalid function code: 0x{fn_code:0>2X}"),
            InvalidData(byte_count) => write!(f, "Invalid frame data: byte count {byte_count}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn display_crc_mismatch() {
        let err = ErrorKind::CrcMismatch {
            received: 0xB663,
            calculated: 0x63B6,
        };
        assert_eq!(
            err.to_string(),
            "Invalid CRC: received = 0xB663, calculated = 0x63B6"
        );
    }

    #[test]
    fn display_fn_code() {
        assert_eq!(
            ErrorKind::InvalidFnCode(0x83).to_string(),
            "Invalid function code: 0x83"
        );
    }
}
