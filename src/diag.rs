// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compact diagnostic rendering of decoded captures.
//!
//! One transaction becomes one bounded log line, e.g.
//!
//! ```text
//! [Unit:3 FC:0x03] REQ[Addr( 2): 40011-40012] RESP[Data(  4): 0930 0154]
//! ```

use core::fmt::{self, Write};

use crate::frame::{FramePair, FunctionCode};

/// Hex dump cap per frame in a rendered line.
pub const MAX_DUMP_BYTES: usize = 128;

/// Maps a function code to the base offset added to displayed
/// register addresses.
///
/// Some device families document their register map in conventional
/// data-model numbering (`4xxxx` holding, `3xxxx` input) while the
/// wire carries zero-based PDU addresses. The profile is supplied per
/// unit by the caller; the serializer itself knows nothing about
/// specific devices.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddressingProfile {
    /// Offset added to `ReadHoldingRegisters` addresses.
    pub holding_register_base: u32,
    /// Offset added to `ReadInputRegisters` addresses.
    pub input_register_base: u32,
}

impl AddressingProfile {
    /// Display raw zero-based PDU addresses.
    pub const RAW: Self = Self {
        holding_register_base: 0,
        input_register_base: 0,
    };

    /// Conventional data-model numbering: holding registers at
    /// `40001`, input registers at `30001`.
    pub const CONVENTIONAL: Self = Self {
        holding_register_base: 40001,
        input_register_base: 30001,
    };

    /// Base offset applied when displaying addresses for `function`.
    #[must_use]
    pub const fn base(&self, function: FunctionCode) -> u32 {
        match function {
            FunctionCode::ReadHoldingRegisters => self.holding_register_base,
            FunctionCode::ReadInputRegisters => self.input_register_base,
            _ => 0,
        }
    }
}

/// Render `pair` as a single diagnostic line into `out`.
///
/// Never writes past `out` and always NUL-terminates within it; the
/// returned length excludes the terminator. Output that does not fit
/// is truncated. An empty `out` stays untouched and yields 0.
pub fn render(pair: &FramePair, profile: &AddressingProfile, out: &mut [u8]) -> usize {
    if out.is_empty() {
        return 0;
    }
    let capacity = out.len() - 1;
    let mut writer = LineWriter {
        buf: &mut out[..capacity],
        pos: 0,
    };
    render_line(&mut writer, pair, profile);
    let len = writer.pos;
    out[len] = 0;
    len
}

fn render_line(w: &mut LineWriter<'_>, pair: &FramePair, profile: &AddressingProfile) {
    let Some(head) = pair.head() else {
        return;
    };
    let fn_value = head.function.map_or(0, FunctionCode::value);
    let _ = write!(w, "[Unit:{} FC:0x{:02X}] ", head.slave, fn_value);

    if let Some(req) = &pair.request {
        let base = req.function.map_or(0, |f| profile.base(f));
        let first = base.wrapping_add(u32::from(req.start_address));
        let last = first.wrapping_add(u32::from(req.quantity)).wrapping_sub(1);
        let _ = write!(w, "REQ[Addr({:2}): {first:5}-{last:5}", req.quantity);
        if !req.payload.is_empty() {
            let _ = w.write_str(" Data:");
            write_hex(w, req.payload.as_bytes());
        }
        let _ = w.write_str("] ");
    }

    match &pair.response {
        Some(rsp) if rsp.valid => {
            let _ = write!(w, "RESP[Data({:3})", rsp.byte_count);
            if !rsp.payload.is_empty() {
                let _ = w.write_str(":");
                write_hex(w, rsp.payload.as_bytes());
            }
            let _ = w.write_str("]");
        }
        Some(_) => {
            let _ = w.write_str("RESP[ERROR:CRC]");
        }
        None if pair.request.is_some() => {
            let _ = w.write_str("RESP[TIMEOUT]");
        }
        None => {}
    }
}

// Hex dump with a separating space every two bytes, capped at
// MAX_DUMP_BYTES with a trailing ellipsis.
fn write_hex(w: &mut LineWriter<'_>, data: &[u8]) {
    for (i, byte) in data.iter().take(MAX_DUMP_BYTES).enumerate() {
        let sep = if i % 2 == 0 { " " } else { "" };
        let _ = write!(w, "{sep}{byte:02X}");
    }
    if data.len() > MAX_DUMP_BYTES {
        let _ = w.write_str(" ...");
    }
}

/// Writer that silently drops everything past the end of its buffer.
struct LineWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl fmt::Write for LineWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let available = self.buf.len() - self.pos;
        let n = s.len().min(available);
        self.buf[self.pos..self.pos + n].copy_from_slice(&s.as_bytes()[..n]);
        self.pos += n;
        Ok(())
    }
}
