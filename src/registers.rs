// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! ARM11 MPCore debug register layouts.
//!
//! The MPCore implements six breakpoint register pairs (`BRP0`-`BRP5`), of
//! which only `BRP4` and `BRP5` can match a context ID, and two watchpoint
//! register pairs (`WRP0`, `WRP1`). A pair is a control register plus a value
//! register. Only the fields the watchpoint allocator programs are modelled
//! here.
//!
//! # Source
//! ARM DDI 0360F 13.3.7 Breakpoint Control Registers (BCR) and 13.3.9
//! Watchpoint Control Registers (WCR)

use bilge::prelude::*;

use crate::watchpoints::WatchpointKind;

/// Number of breakpoint register pairs.
pub const BREAKPOINT_PAIRS: usize = 6;
/// Number of watchpoint register pairs.
pub const WATCHPOINT_PAIRS: usize = 2;
/// First breakpoint register pair capable of context ID matching.
pub const CONTEXT_BRP_BASE: u8 = 4;
/// Width of the aligned word a single watchpoint can cover.
pub const WORD_SIZE: u32 = 4;

#[bitsize(2)]
#[derive(Copy, Clone, Default, FromBits, Debug, Eq, PartialEq)]
/// Supervisor access control, bits `[2:1]` of both `BCR` and `WCR`.
pub enum AccessPrivilege {
    #[default]
    /// Reserved encoding, the comparator never matches.
    Reserved = 0b00,
    /// Privileged modes only.
    Privileged = 0b01,
    /// User mode only.
    User = 0b10,
    /// Either privileged or user mode.
    Any = 0b11,
}

impl AccessPrivilege {
    /// Whether an access made in user mode (or not) passes this field.
    pub const fn permits(self, user_mode: bool) -> bool {
        match self {
            Self::Reserved => false,
            Self::Privileged => !user_mode,
            Self::User => user_mode,
            Self::Any => true,
        }
    }
}

#[bitsize(32)]
#[derive(Copy, Clone, Default, PartialEq, Eq, FromBits, DebugBits)]
#[doc(alias = "WCR")]
/// Watchpoint Control Register.
pub struct WatchpointControl {
    /// Watchpoint enable. (bit `[0]`)
    pub enabled: bool,
    /// Supervisor access. (bits `[2:1]`)
    pub privilege: AccessPrivilege,
    /// Load/store access that triggers the watchpoint. (bits `[4:3]`)
    pub kind: WatchpointKind,
    /// Byte address select, one bit per byte of the aligned word. (bits
    /// `[8:5]`)
    pub byte_select: u4,
    _reserved: u7,
    /// Linked `BRP` number. (bits `[19:16]`)
    pub linked_brp: u4,
    /// Enable linking with the `BRP` in [`Self::linked_brp`]. (bit `[20]`)
    pub linked: bool,
    _reserved2: u11,
}

impl WatchpointControl {
    /// Control word of a user-mode watchpoint linked to breakpoint pair
    /// `brp`.
    pub fn linked_to(brp: u8, kind: WatchpointKind, byte_select: u4) -> Self {
        let mut wcr = Self::from(0);
        wcr.set_linked(true);
        wcr.set_linked_brp(u4::new(brp));
        wcr.set_byte_select(byte_select);
        wcr.set_kind(kind);
        wcr.set_privilege(AccessPrivilege::User);
        wcr.set_enabled(true);
        wcr
    }
}

#[bitsize(32)]
#[derive(Copy, Clone, Default, PartialEq, Eq, FromBits, DebugBits)]
#[doc(alias = "BCR")]
/// Breakpoint Control Register.
pub struct BreakpointControl {
    /// Breakpoint enable. (bit `[0]`)
    pub enabled: bool,
    /// Supervisor access. (bits `[2:1]`)
    pub privilege: AccessPrivilege,
    _reserved: u2,
    /// Byte address select. (bits `[8:5]`)
    pub byte_select: u4,
    _reserved2: u7,
    /// Linked `BRP` number. (bits `[19:16]`)
    pub linked_brp: u4,
    /// Enable linking. (bit `[20]`)
    pub linked: bool,
    /// Compare the value register against the context ID instead of the
    /// instruction address. (bit `[21]`)
    pub context_id: bool,
    _reserved3: u10,
}

impl BreakpointControl {
    /// Control word of a context ID breakpoint that only exists to qualify a
    /// linked watchpoint.
    ///
    /// Byte address select must be `0b1111` and supervisor access must be
    /// [`AccessPrivilege::Any`] when a `BRP` is linked to a `WRP`.
    pub fn context_match() -> Self {
        let mut bcr = Self::from(0);
        bcr.set_context_id(true);
        bcr.set_linked(true);
        bcr.set_byte_select(u4::new(0b1111));
        bcr.set_privilege(AccessPrivilege::Any);
        bcr.set_enabled(true);
        bcr
    }
}

/// Byte address select mask for `size` bytes starting `offset` bytes into an
/// aligned word.
///
/// Callers must ensure `0 < size` and `offset + size <= 4`.
pub fn byte_select_mask(offset: u32, size: u32) -> u4 {
    debug_assert!(size > 0 && offset + size <= WORD_SIZE);
    u4::new((((1_u32 << size) - 1) << offset) as u8)
}

/// A physical breakpoint or watchpoint register pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegisterPair {
    /// `BRPn`
    Breakpoint(u8),
    /// `WRPn`
    Watchpoint(u8),
}

impl RegisterPair {
    /// Descriptor bit that selects a watchpoint pair.
    pub const WATCHPOINT_FLAG: u32 = 0x100;

    /// Context ID breakpoint pair statically assigned to watchpoint slot
    /// `slot`.
    pub const fn context_breakpoint(slot: usize) -> Self {
        Self::Breakpoint(CONTEXT_BRP_BASE + slot as u8)
    }

    /// Watchpoint pair statically assigned to watchpoint slot `slot`.
    pub const fn watchpoint(slot: usize) -> Self {
        Self::Watchpoint(slot as u8)
    }

    /// Index of the pair within its bank.
    pub const fn number(self) -> u8 {
        match self {
            Self::Breakpoint(n) | Self::Watchpoint(n) => n,
        }
    }

    /// Numeric descriptor understood by the privileged monitor.
    pub const fn descriptor(self) -> u32 {
        match self {
            Self::Breakpoint(n) => n as u32,
            Self::Watchpoint(n) => Self::WATCHPOINT_FLAG | n as u32,
        }
    }

    /// Inverse of [`Self::descriptor`].
    pub const fn from_descriptor(descriptor: u32) -> Option<Self> {
        if descriptor & !(Self::WATCHPOINT_FLAG | 0xff) != 0 {
            return None;
        }
        let n = (descriptor & 0xff) as u8;
        if descriptor & Self::WATCHPOINT_FLAG != 0 {
            Some(Self::Watchpoint(n))
        } else {
            Some(Self::Breakpoint(n))
        }
    }

    /// Whether the pair exists on the MPCore.
    pub const fn exists(self) -> bool {
        match self {
            Self::Breakpoint(n) => (n as usize) < BREAKPOINT_PAIRS,
            Self::Watchpoint(n) => (n as usize) < WATCHPOINT_PAIRS,
        }
    }
}

impl std::fmt::Display for RegisterPair {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Breakpoint(n) => write!(fmt, "BRP{n}"),
            Self::Watchpoint(n) => write!(fmt, "WRP{n}"),
        }
    }
}
