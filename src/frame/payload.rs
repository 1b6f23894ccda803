// SPDX-License-Identifier: MIT OR Apache-2.0

use byteorder::{BigEndian, ByteOrder};
use core::fmt;

/// Maximum number of data bytes a single PDU may carry.
///
/// 256 byte ADU minus slave id, function code and the two CRC bytes.
pub const MAX_PAYLOAD_LEN: usize = 252;

/// Owned payload bytes of a decoded frame.
///
/// The storage is inline and bounded by [`MAX_PAYLOAD_LEN`], so a
/// `Payload` never aliases the capture buffer it was decoded from and
/// stays valid independently of any later decode call.
#[derive(Clone)]
pub struct Payload {
    data: [u8; MAX_PAYLOAD_LEN],
    len: usize,
}

impl Payload {
    /// An empty payload.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: [0; MAX_PAYLOAD_LEN],
            len: 0,
        }
    }

    /// Copy `bytes` into an owned payload.
    ///
    /// Input longer than [`MAX_PAYLOAD_LEN`] is truncated to the cap.
    #[must_use]
    pub fn copy_from(bytes: &[u8]) -> Self {
        let mut payload = Self::empty();
        let len = bytes.len().min(MAX_PAYLOAD_LEN);
        payload.data[..len].copy_from_slice(&bytes[..len]);
        payload.len = len;
        payload
    }

    /// The payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Number of payload bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the payload holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get a 16-bit big-endian word at word index `idx`.
    #[must_use]
    pub fn word(&self, idx: usize) -> Option<u16> {
        let byte_idx = idx * 2;
        if byte_idx + 2 > self.len {
            return None;
        }
        Some(BigEndian::read_u16(&self.data[byte_idx..byte_idx + 2]))
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Payload {}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&self.as_bytes()).finish()
    }
}

#[cfg(all(feature = "defmt", target_os = "none"))]
impl defmt::Format for Payload {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=[u8]}", self.as_bytes());
    }
}
