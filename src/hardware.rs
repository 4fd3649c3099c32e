// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! # Hardware register interface
//!
//! Register pairs are programmed through the privileged monitor, which must
//! implement [`RegisterInterface`]. [`emulated::RegisterFile`] is an in-memory
//! implementation for hosted use and tests.

use crate::registers::RegisterPair;

pub mod emulated;

/// A register pair write was refused by the monitor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HardwareError {
    pub pair: RegisterPair,
    /// Raw result code returned by the monitor.
    pub code: i32,
}

impl std::fmt::Display for HardwareError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "programming {} (descriptor 0x{:x}) failed with result {:#x}",
            self.pair,
            self.pair.descriptor(),
            self.code
        )
    }
}

impl std::error::Error for HardwareError {}

/// Sets or clears one breakpoint/watchpoint register pair.
///
/// Writes are synchronous and idempotent. `(0, 0)` disables the pair.
pub trait RegisterInterface {
    fn set_register_pair(
        &mut self,
        pair: RegisterPair,
        control: u32,
        value: u32,
    ) -> Result<(), HardwareError>;

    fn disable(&mut self, pair: RegisterPair) -> Result<(), HardwareError> {
        self.set_register_pair(pair, 0, 0)
    }
}

impl<T: RegisterInterface + ?Sized> RegisterInterface for Box<T> {
    fn set_register_pair(
        &mut self,
        pair: RegisterPair,
        control: u32,
        value: u32,
    ) -> Result<(), HardwareError> {
        (**self).set_register_pair(pair, control, value)
    }
}

impl<T: RegisterInterface + ?Sized> RegisterInterface for &mut T {
    fn set_register_pair(
        &mut self,
        pair: RegisterPair,
        control: u32,
        value: u32,
    ) -> Result<(), HardwareError> {
        (**self).set_register_pair(pair, control, value)
    }
}
