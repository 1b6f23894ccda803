// SPDX-License-Identifier: MIT OR Apache-2.0

use core::{fmt, time::Duration};

mod payload;

pub use self::payload::*;
use crate::error::ErrorKind;

/// Slave ID
pub type SlaveId = u8;

/// A Modbus address is represented by 16 bit (from `0` to `65535`).
pub type Address = u16;

/// Number of items to process (`0` - `65535`).
pub type Quantity = u16;

/// A Modbus function code.
///
/// Closed set: only the public function codes a sniffed
/// request/response capture is expected to carry.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    /// Modbus Function Code: `01` (`0x01`).
    ReadCoils,

    /// Modbus Function Code: `02` (`0x02`).
    ReadDiscreteInputs,

    /// Modbus Function Code: `03` (`0x03`).
    ReadHoldingRegisters,

    /// Modbus Function Code: `04` (`0x04`).
    ReadInputRegisters,

    /// Modbus Function Code: `05` (`0x05`).
    WriteSingleCoil,

    /// Modbus Function Code: `06` (`0x06`).
    WriteSingleRegister,

    /// Modbus Function Code: `15` (`0x0F`).
    WriteMultipleCoils,

    /// Modbus Function Code: `16` (`0x10`).
    WriteMultipleRegisters,
}

impl FunctionCode {
    /// Create a new [`FunctionCode`] from its wire value.
    ///
    /// Returns `None` for every code outside the supported set,
    /// including exception responses (`value > 0x80`).
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        let code = match value {
            0x01 => Self::ReadCoils,
            0x02 => Self::ReadDiscreteInputs,
            0x03 => Self::ReadHoldingRegisters,
            0x04 => Self::ReadInputRegisters,
            0x05 => Self::WriteSingleCoil,
            0x06 => Self::WriteSingleRegister,
            0x0F => Self::WriteMultipleCoils,
            0x10 => Self::WriteMultipleRegisters,
            _ => return None,
        };
        Some(code)
    }

    /// Get the [`u8`] value of the current [`FunctionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ReadCoils => 0x01,
            Self::ReadDiscreteInputs => 0x02,
            Self::ReadHoldingRegisters => 0x03,
            Self::ReadInputRegisters => 0x04,
            Self::WriteSingleCoil => 0x05,
            Self::WriteSingleRegister => 0x06,
            Self::WriteMultipleCoils => 0x0F,
            Self::WriteMultipleRegisters => 0x10,
        }
    }

    /// Human-readable name of the function code.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadCoils => "Read Coils",
            Self::ReadDiscreteInputs => "Read Discrete Inputs",
            Self::ReadHoldingRegisters => "Read Holding Registers",
            Self::ReadInputRegisters => "Read Input Registers",
            Self::WriteSingleCoil => "Write Single Coil",
            Self::WriteSingleRegister => "Write Single Register",
            Self::WriteMultipleCoils => "Write Multiple Coils",
            Self::WriteMultipleRegisters => "Write Multiple Registers",
        }
    }

    /// Returns `true` for the four read-class function codes, whose
    /// request and response layouts are only distinguishable by frame
    /// length.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(
            self,
            Self::ReadCoils
                | Self::ReadDiscreteInputs
                | Self::ReadHoldingRegisters
                | Self::ReadInputRegisters
        )
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single decoded Modbus RTU frame (ADU).
///
/// Produced fresh by every [`rtu::decode`](crate::rtu::decode) call;
/// the payload is owned, so the frame outlives the capture buffer.
/// `start_address`, `quantity` and `byte_count` are populated only
/// where the function code's wire layout carries them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Address of the device this frame belongs to.
    pub slave: SlaveId,
    /// Decoded function code.
    pub function: Option<FunctionCode>,
    /// Register/coil start address, where applicable.
    pub start_address: Address,
    /// Number of registers/coils, where applicable.
    pub quantity: Quantity,
    /// Declared data byte count, where applicable.
    ///
    /// May exceed `payload.len()` for a response whose count field
    /// overruns the buffer; see the crate-level notes on lenient
    /// byte-count handling.
    pub byte_count: u8,
    /// Owned payload bytes (at most [`MAX_PAYLOAD_LEN`]).
    pub payload: Payload,
    /// CRC as received on the wire.
    pub crc: u16,
    /// CRC calculated over the received frame.
    pub calculated_crc: u16,
    /// Why decoding failed, or [`ErrorKind::None`].
    pub error: ErrorKind,
    /// `true` if the frame passed checksum and field decoding.
    pub valid: bool,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Unit ID: {}", self.slave)?;
        match self.function {
            Some(code) => writeln!(f, "Function Code: 0x{:02X} ({code})", code.value())?,
            None => writeln!(f, "Function Code: unknown")?,
        }
        if self.valid {
            if self.start_address > 0 || self.quantity > 0 {
                writeln!(f, "Start Address: 0x{:04X}", self.start_address)?;
                writeln!(f, "Quantity: {}", self.quantity)?;
            }
            if !self.payload.is_empty() {
                write!(f, "Data ({} bytes):", self.payload.len())?;
                for byte in self.payload.as_bytes() {
                    write!(f, " {byte:02X}")?;
                }
                writeln!(f)?;
            }
            writeln!(f, "CRC: 0x{:04X} (Valid)", self.crc)
        } else {
            writeln!(
                f,
                "CRC: 0x{:04X} (Expected: 0x{:04X})",
                self.crc, self.calculated_crc
            )?;
            writeln!(f, "Error: {}", self.error)
        }
    }
}

/// A request/response transaction recovered from one half-duplex
/// capture window.
///
/// Invariant, enforced by the synchronizer: when both slots are
/// filled, slave id and function code agree between request and
/// response.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FramePair {
    /// The request frame, if one was recognized.
    pub request: Option<Frame>,
    /// The response frame, if one was recognized.
    pub response: Option<Frame>,
    /// Time between request and response, where the capture source
    /// provides it.
    pub round_trip: Duration,
}

impl FramePair {
    /// The frame that identifies this transaction, preferring the
    /// request.
    #[must_use]
    pub fn head(&self) -> Option<&Frame> {
        self.request.as_ref().or(self.response.as_ref())
    }

    /// Returns `true` if both request and response were recognized.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.request.is_some() && self.response.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn function_code_from_u8() {
        assert_eq!(FunctionCode::new(0x03), Some(FunctionCode::ReadHoldingRegisters));
        assert_eq!(FunctionCode::new(0x10), Some(FunctionCode::WriteMultipleRegisters));
        assert_eq!(FunctionCode::new(0x00), None);
        assert_eq!(FunctionCode::new(0x17), None);
        assert_eq!(FunctionCode::new(0x83), None);
    }

    #[test]
    fn function_code_into_u8() {
        assert_eq!(FunctionCode::WriteMultipleCoils.value(), 15);
        assert_eq!(FunctionCode::ReadInputRegisters.value(), 4);
    }

    #[test]
    fn function_code_roundtrip() {
        for value in 0..=u8::MAX {
            if let Some(code) = FunctionCode::new(value) {
                assert_eq!(code.value(), value);
            }
        }
    }

    #[test]
    fn read_class_codes() {
        assert!(FunctionCode::ReadCoils.is_read());
        assert!(FunctionCode::ReadInputRegisters.is_read());
        assert!(!FunctionCode::WriteSingleCoil.is_read());
        assert!(!FunctionCode::WriteMultipleRegisters.is_read());
    }

    #[test]
    fn display_valid_frame() {
        let frame = Frame {
            slave: 3,
            function: Some(FunctionCode::ReadHoldingRegisters),
            start_address: 0x000A,
            quantity: 2,
            byte_count: 0,
            payload: Payload::empty(),
            crc: 0x63B6,
            calculated_crc: 0x63B6,
            error: ErrorKind::None,
            valid: true,
        };
        let text = frame.to_string();
        assert!(text.contains("Unit ID: 3"));
        assert!(text.contains("Function Code: 0x03 (Read Holding Registers)"));
        assert!(text.contains("Start Address: 0x000A"));
        assert!(text.contains("CRC: 0x63B6 (Valid)"));
    }

    #[test]
    fn display_invalid_frame() {
        let frame = Frame {
            crc: 0x1234,
            calculated_crc: 0x63B6,
            error: ErrorKind::CrcMismatch {
                received: 0x1234,
                calculated: 0x63B6,
            },
            ..Frame::default()
        };
        let text = frame.to_string();
        assert!(text.contains("CRC: 0x1234 (Expected: 0x63B6)"));
        assert!(text.contains("Error: Invalid CRC"));
    }

    #[test]
    fn pair_head_prefers_request() {
        let request = Frame {
            slave: 1,
            ..Frame::default()
        };
        let response = Frame {
            slave: 2,
            ..Frame::default()
        };
        let pair = FramePair {
            request: Some(request),
            response: Some(response),
            round_trip: Duration::ZERO,
        };
        assert_eq!(pair.head().unwrap().slave, 1);
        assert!(pair.is_complete());

        let pair = FramePair::default();
        assert!(pair.head().is_none());
        assert!(!pair.is_complete());
    }
}
