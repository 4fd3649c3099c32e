// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! The watchpoint allocator.

use std::cell::RefCell;

use log::{debug, trace, warn};
use parking_lot::ReentrantMutex;

use super::{
    InvalidReason, ManagerConfig, SlotTable, Watchpoint, WatchpointError, WatchpointKind,
    SLOT_COUNT,
};
use crate::{
    hardware::RegisterInterface,
    registers::{BreakpointControl, RegisterPair, WatchpointControl, WORD_SIZE},
    session::DebugSession,
};

struct State<R> {
    registers: R,
    table: SlotTable,
}

/// Allocates the two hardware watchpoints among debug sessions.
///
/// All operations are serialized by one re-entrant lock. The lock is
/// re-entered by [`Self::add`], which runs the duplicate check through
/// [`Self::kind`] while already holding it. No `RefCell` borrow is live across
/// a re-entrant call.
///
/// There should be exactly one manager per debug monitor; share it with
/// `Arc`.
pub struct WatchpointManager<R> {
    config: ManagerConfig,
    state: ReentrantMutex<RefCell<State<R>>>,
}

impl<R: RegisterInterface> WatchpointManager<R> {
    /// Takes ownership of the register interface and disables every register
    /// pair the manager uses.
    pub fn new(registers: R, config: ManagerConfig) -> Self {
        let manager = Self {
            config,
            state: ReentrantMutex::new(RefCell::new(State {
                registers,
                table: SlotTable::new(),
            })),
        };
        manager.reset();
        manager
    }

    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Disables all four register pairs and frees every slot.
    ///
    /// Sessions are not notified; their caches must be dropped with
    /// [`DebugSession::clear_watchpoints`].
    pub fn reset(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        for id in 0..SLOT_COUNT {
            disable_slot(&mut state.registers, id);
        }
        state.table.clear();
        debug!("watchpoints reset");
    }

    /// Watches `size` bytes at `address` for accesses of `kind` made by
    /// `session`'s process.
    ///
    /// Both register pairs of the allocated slot are programmed, or neither
    /// is.
    pub fn add(
        &self,
        session: &mut DebugSession,
        address: u32,
        size: u32,
        kind: WatchpointKind,
    ) -> Result<(), WatchpointError> {
        let guard = self.state.lock();

        if kind == WatchpointKind::Disabled {
            return Err(WatchpointError::InvalidArgument(InvalidReason::DisabledKind));
        }
        if size == 0 {
            return Err(WatchpointError::InvalidArgument(InvalidReason::ZeroSize));
        }
        let offset = address & (WORD_SIZE - 1);
        if size > WORD_SIZE - offset {
            return Err(WatchpointError::InvalidArgument(
                InvalidReason::CrossesWord { offset, size },
            ));
        }
        if guard.borrow().table.is_full() {
            return Err(WatchpointError::ResourceExhausted);
        }
        // DFSR does not tell which watchpoint fired, so two watchpoints on one
        // address cannot be told apart.
        if self.is_duplicate(session, address) {
            debug!(
                "rejecting duplicate watchpoint at 0x{address:08x} for {}",
                session.context_id()
            );
            return Err(WatchpointError::InvalidArgument(InvalidReason::Duplicate));
        }

        let mut state = guard.borrow_mut();
        let State { registers, table } = &mut *state;
        let Some(id) = table.first_free() else {
            return Err(WatchpointError::ResourceExhausted);
        };
        if !session.has_room() {
            warn!(
                "session {} already tracks {} watchpoints",
                session.context_id(),
                session.live()
            );
            return Err(WatchpointError::ResourceExhausted);
        }

        let watchpoint = Watchpoint {
            address,
            size,
            kind,
            owner: session.context_id(),
        };
        let wrp = RegisterPair::watchpoint(id);
        let brp = RegisterPair::context_breakpoint(id);
        let wcr = WatchpointControl::linked_to(brp.number(), kind, watchpoint.byte_select());
        let bcr = BreakpointControl::context_match();

        if let Err(err) = registers.set_register_pair(wrp, wcr.into(), watchpoint.base()) {
            warn!("could not program {wrp}: {err}");
            return Err(WatchpointError::InvalidArgument(InvalidReason::Hardware(
                err,
            )));
        }
        if let Err(err) = registers.set_register_pair(brp, bcr.into(), watchpoint.owner.0) {
            warn!("could not program {brp}: {err}, rolling back {wrp}");
            if let Err(rollback) = registers.disable(wrp) {
                warn!("rollback of {wrp} failed: {rollback}");
            }
            return Err(WatchpointError::InvalidArgument(InvalidReason::Hardware(
                err,
            )));
        }

        table.occupy(id, watchpoint);
        let recorded = session.record(address);
        debug_assert!(recorded);
        debug!(
            "slot {id}: watching {size} bytes at 0x{address:08x} ({kind}) for {}",
            watchpoint.owner
        );
        Ok(())
    }

    /// Removes the watchpoint `session` holds at `address`.
    ///
    /// [`WatchpointKind::Disabled`] matches any kind.
    pub fn remove(
        &self,
        session: &mut DebugSession,
        address: u32,
        kind: WatchpointKind,
    ) -> Result<(), WatchpointError> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let State { registers, table } = &mut *state;

        let Some((id, found)) = table
            .find(self.config.match_rule, session.context_id(), address)
            .map(|(id, wp)| (id, *wp))
        else {
            return Err(WatchpointError::InvalidArgument(InvalidReason::NotFound));
        };
        if kind != WatchpointKind::Disabled && found.kind != kind {
            return Err(WatchpointError::InvalidArgument(
                InvalidReason::KindMismatch {
                    requested: kind,
                    found: found.kind,
                },
            ));
        }

        disable_slot(registers, id);
        table.release(id);
        // With `MatchRule::AddressOrOwner` the slot may have been selected by
        // owner alone, in which case the session cached the slot's address.
        if !session.forget(address)
            && (found.owner != session.context_id() || !session.forget(found.address))
        {
            trace!(
                "0x{address:08x} was not in the watch list of {}",
                session.context_id()
            );
        }
        debug!(
            "slot {id}: removed watchpoint at 0x{:08x} of {}",
            found.address, found.owner
        );
        Ok(())
    }

    /// Kind of the watchpoint selected for `(session, address)`, or
    /// [`WatchpointKind::Disabled`].
    pub fn kind(&self, session: &DebugSession, address: u32) -> WatchpointKind {
        let guard = self.state.lock();
        let state = guard.borrow();
        state
            .table
            .find(self.config.match_rule, session.context_id(), address)
            .map_or(WatchpointKind::Disabled, |(_, wp)| wp.kind)
    }

    /// Number of live watchpoints.
    pub fn total(&self) -> usize {
        self.state.lock().borrow().table.total()
    }

    /// Copy of the slot table.
    pub fn snapshot(&self) -> SlotTable {
        self.state.lock().borrow().table.clone()
    }

    /// Runs `f` on the register interface with the lock held.
    ///
    /// The state stays mutably borrowed while `f` runs, so `f` must not call
    /// back into the manager: any such call panics even though the lock
    /// itself would be re-entered.
    pub fn with_registers<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state.registers)
    }

    /// Must be called with the lock held and no outstanding borrow.
    fn is_duplicate(&self, session: &DebugSession, address: u32) -> bool {
        // Re-enters the lock held by `add`.
        if self.kind(session, address) != WatchpointKind::Disabled {
            return true;
        }
        let guard = self.state.lock();
        let state = guard.borrow();
        state.table.find_address(address).is_some()
    }
}

impl<R> std::fmt::Debug for WatchpointManager<R> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = fmt.debug_struct("WatchpointManager");
        s.field("config", &self.config);
        // Re-entrant lock; a `Debug` call from inside a locked section still
        // works unless a mutable borrow is live.
        let guard = self.state.lock();
        match guard.try_borrow() {
            Ok(state) => s.field("table", &state.table),
            Err(_) => s.field("table", &"<borrowed>"),
        };
        s.finish()
    }
}

/// Best-effort: failures are logged and otherwise ignored.
fn disable_slot<R: RegisterInterface>(registers: &mut R, id: usize) {
    for pair in [
        RegisterPair::context_breakpoint(id),
        RegisterPair::watchpoint(id),
    ] {
        if let Err(err) = registers.disable(pair) {
            warn!("could not disable {pair}: {err}");
        }
    }
}
