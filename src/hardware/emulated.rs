// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! Emulated MPCore debug register file.

use std::collections::BTreeMap;

use log::trace;

use super::{HardwareError, RegisterInterface};
use crate::{
    registers::{
        BreakpointControl, RegisterPair, WatchpointControl, BREAKPOINT_PAIRS, WATCHPOINT_PAIRS,
        WORD_SIZE,
    },
    session::ContextId,
};

/// Result code for writes to a pair the MPCore does not implement.
pub const INVALID_PAIR: i32 = -1;

/// Contents of one register pair.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PairState {
    pub control: u32,
    pub value: u32,
}

impl PairState {
    pub const fn is_disabled(&self) -> bool {
        self.control == 0 && self.value == 0
    }
}

/// A successful [`RegisterInterface::set_register_pair`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterWrite {
    pub pair: RegisterPair,
    pub control: u32,
    pub value: u32,
}

/// A data access evaluated against the programmed watchpoints.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemoryAccess {
    pub address: u32,
    pub size: u32,
    pub write: bool,
    /// Value of `CONTEXTIDR` when the access is made.
    pub context_id: ContextId,
    pub user_mode: bool,
}

impl MemoryAccess {
    /// User-mode load.
    pub const fn read(context_id: ContextId, address: u32, size: u32) -> Self {
        Self {
            address,
            size,
            write: false,
            context_id,
            user_mode: true,
        }
    }

    /// User-mode store.
    pub const fn write(context_id: ContextId, address: u32, size: u32) -> Self {
        Self {
            write: true,
            ..Self::read(context_id, address, size)
        }
    }

    pub const fn privileged(self) -> Self {
        Self {
            user_mode: false,
            ..self
        }
    }
}

/// In-memory breakpoint and watchpoint register pairs.
///
/// Every accepted write is journaled. Writes to pairs registered with
/// [`Self::fail_on`] are refused.
#[derive(Clone, Debug, Default)]
pub struct RegisterFile {
    breakpoints: [PairState; BREAKPOINT_PAIRS],
    watchpoints: [PairState; WATCHPOINT_PAIRS],
    journal: Vec<RegisterWrite>,
    faults: BTreeMap<RegisterPair, i32>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of `pair`, `None` if it does not exist.
    pub fn pair(&self, pair: RegisterPair) -> Option<PairState> {
        match pair {
            RegisterPair::Breakpoint(n) => self.breakpoints.get(n as usize).copied(),
            RegisterPair::Watchpoint(n) => self.watchpoints.get(n as usize).copied(),
        }
    }

    /// Whether every pair is in the disabled state.
    pub fn all_disabled(&self) -> bool {
        self.breakpoints
            .iter()
            .chain(self.watchpoints.iter())
            .all(PairState::is_disabled)
    }

    pub fn writes(&self) -> &[RegisterWrite] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Refuse writes to `pair` with result `code` until
    /// [`Self::clear_faults`].
    pub fn fail_on(&mut self, pair: RegisterPair, code: i32) {
        self.faults.insert(pair, code);
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Index of the watchpoint pair that fires for `access`, if any.
    ///
    /// A linked watchpoint only fires if its `BRP` is an enabled context ID
    /// comparator holding `access.context_id`.
    pub fn check_access(&self, access: &MemoryAccess) -> Option<usize> {
        self.watchpoints.iter().position(|state| {
            let wcr = WatchpointControl::from(state.control);
            wcr.enabled()
                && wcr.privilege().permits(access.user_mode)
                && wcr.kind().triggers_on(access.write)
                && Self::bytes_selected(wcr, state.value, access)
                && (!wcr.linked() || self.context_matches(wcr.linked_brp().value(), access))
        })
    }

    fn bytes_selected(wcr: WatchpointControl, value: u32, access: &MemoryAccess) -> bool {
        let base = u64::from(value & !(WORD_SIZE - 1));
        let select = wcr.byte_select().value();
        let start = u64::from(access.address);
        let end = start + u64::from(access.size);
        (0..u64::from(WORD_SIZE))
            .filter(|lane| select & (1 << lane) != 0)
            .any(|lane| (start..end).contains(&(base + lane)))
    }

    fn context_matches(&self, brp: u8, access: &MemoryAccess) -> bool {
        let Some(state) = self.breakpoints.get(brp as usize) else {
            return false;
        };
        let bcr = BreakpointControl::from(state.control);
        bcr.enabled()
            && bcr.context_id()
            && bcr.privilege().permits(access.user_mode)
            && state.value == access.context_id.0
    }
}

impl RegisterInterface for RegisterFile {
    fn set_register_pair(
        &mut self,
        pair: RegisterPair,
        control: u32,
        value: u32,
    ) -> Result<(), HardwareError> {
        if let Some(&code) = self.faults.get(&pair) {
            trace!("refusing write to {pair}: injected fault {code:#x}");
            return Err(HardwareError { pair, code });
        }
        let state = match pair {
            RegisterPair::Breakpoint(n) => self.breakpoints.get_mut(n as usize),
            RegisterPair::Watchpoint(n) => self.watchpoints.get_mut(n as usize),
        };
        let Some(state) = state else {
            return Err(HardwareError {
                pair,
                code: INVALID_PAIR,
            });
        };
        trace!("{pair} <- control 0x{control:08x} value 0x{value:08x}");
        *state = PairState { control, value };
        self.journal.push(RegisterWrite {
            pair,
            control,
            value,
        });
        Ok(())
    }
}
