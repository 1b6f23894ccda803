// SPDX-License-Identifier: MIT OR Apache-2.0

#![doc = include_str!("../README.md")]
#![no_std]

#[cfg(test)]
extern crate std;

mod codec;
mod diag;
mod error;
mod frame;

pub use codec::rtu;
pub use diag::*;
pub use error::*;
pub use frame::*;
