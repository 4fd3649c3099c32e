// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! Hardware watchpoint allocation.
//!
//! The MPCore has two watchpoint register pairs, each linked to one of the two
//! context ID breakpoint pairs so that a watchpoint only fires inside the
//! debugged process. [`WatchpointManager`] multiplexes these across any number
//! of [`DebugSession`](crate::session::DebugSession)s.

use bilge::prelude::*;
use nix::errno::Errno;
use serde_derive::{Deserialize, Serialize};

use crate::{hardware::HardwareError, registers, session::ContextId};

pub mod manager;
pub mod slots;

pub use manager::WatchpointManager;
pub use slots::{Slot, SlotTable, SLOT_COUNT};

#[bitsize(2)]
#[derive(Copy, Clone, Default, FromBits, Debug, Eq, PartialEq)]
/// Access kind that triggers a watchpoint.
///
/// The discriminants are the load/store field encoding of the `WCR`.
pub enum WatchpointKind {
    #[default]
    /// Slot unused. Never a valid request kind.
    Disabled = 0b00,
    /// Loads.
    Read = 0b01,
    /// Stores.
    Write = 0b10,
    /// Loads and stores.
    ReadWrite = 0b11,
}

impl WatchpointKind {
    pub const POSSIBLE_VALUES: &[Self] = &[Self::Disabled, Self::Read, Self::Write, Self::ReadWrite];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "rw",
        }
    }

    /// Whether a load (`write == false`) or store triggers this kind.
    pub const fn triggers_on(self, write: bool) -> bool {
        match self {
            Self::Disabled => false,
            Self::Read => !write,
            Self::Write => write,
            Self::ReadWrite => true,
        }
    }
}

impl std::fmt::Display for WatchpointKind {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

impl std::str::FromStr for WatchpointKind {
    type Err = Box<dyn std::error::Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" | "read" => Ok(Self::Read),
            "w" | "write" => Ok(Self::Write),
            "rw" | "a" | "access" => Ok(Self::ReadWrite),
            "any" | "disabled" => Ok(Self::Disabled),
            other => Err(Box::<dyn std::error::Error>::from(format!(
                "Unknown watchpoint kind {other:?}, expected one of r, w, rw, any"
            ))),
        }
    }
}

impl serde::Serialize for WatchpointKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A live watchpoint occupying one slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Watchpoint {
    /// Watched address, not necessarily aligned.
    pub address: u32,
    /// Width of the watched region in bytes, `1..=4`.
    pub size: u32,
    /// Never [`WatchpointKind::Disabled`].
    pub kind: WatchpointKind,
    /// Context ID of the owning session.
    pub owner: ContextId,
}

impl Watchpoint {
    /// Word-aligned base written to the `WVR`.
    pub const fn base(&self) -> u32 {
        self.address & !(registers::WORD_SIZE - 1)
    }

    /// Byte offset of [`Self::address`] inside its aligned word.
    pub const fn offset(&self) -> u32 {
        self.address & (registers::WORD_SIZE - 1)
    }

    pub fn byte_select(&self) -> u4 {
        registers::byte_select_mask(self.offset(), self.size)
    }
}

/// How a `(session, address)` query selects a slot.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MatchRule {
    /// The first occupied slot whose address equals the requested address
    /// *or* whose owner is the requesting session.
    #[default]
    AddressOrOwner,
    /// Only a slot matching both address and owner.
    Exact,
}

/// Manager configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub match_rule: MatchRule,
}

/// Why a request was rejected with [`WatchpointError::InvalidArgument`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    DisabledKind,
    ZeroSize,
    /// The region does not fit in one aligned word.
    CrossesWord { offset: u32, size: u32 },
    /// The address is already watched.
    Duplicate,
    NotFound,
    KindMismatch {
        requested: WatchpointKind,
        found: WatchpointKind,
    },
    /// Programming a register pair failed; the slot was rolled back.
    Hardware(HardwareError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WatchpointError {
    InvalidArgument(InvalidReason),
    /// Both slots are occupied, or the session's watch list is full.
    ResourceExhausted,
}

impl WatchpointError {
    /// Negative errno reported across the monitor boundary.
    pub const fn errno(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => -(Errno::EINVAL as i32),
            Self::ResourceExhausted => -(Errno::EBUSY as i32),
        }
    }

    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl std::fmt::Display for WatchpointError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(InvalidReason::DisabledKind) => {
                write!(fmt, "invalid argument: watchpoint kind is disabled")
            }
            Self::InvalidArgument(InvalidReason::ZeroSize) => {
                write!(fmt, "invalid argument: zero-sized watchpoint")
            }
            Self::InvalidArgument(InvalidReason::CrossesWord { offset, size }) => write!(
                fmt,
                "invalid argument: {size} bytes at offset {offset} cross an aligned word"
            ),
            Self::InvalidArgument(InvalidReason::Duplicate) => {
                write!(fmt, "invalid argument: address is already watched")
            }
            Self::InvalidArgument(InvalidReason::NotFound) => {
                write!(fmt, "invalid argument: no such watchpoint")
            }
            Self::InvalidArgument(InvalidReason::KindMismatch { requested, found }) => write!(
                fmt,
                "invalid argument: requested {requested} watchpoint but found {found}"
            ),
            Self::InvalidArgument(InvalidReason::Hardware(err)) => {
                write!(fmt, "invalid argument: {err}")
            }
            Self::ResourceExhausted => write!(fmt, "no free hardware watchpoint"),
        }
    }
}

impl std::error::Error for WatchpointError {}

impl From<WatchpointError> for i32 {
    fn from(err: WatchpointError) -> Self {
        err.errno()
    }
}
