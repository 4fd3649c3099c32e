// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! Glue for stubs built on [`gdbstub`].
//!
//! `HwWatchpoint::add_hw_watchpoint` and `remove_hw_watchpoint` report
//! failure as `Ok(false)`, which is what these helpers return for any
//! [`WatchpointError`].

use gdbstub::target::ext::breakpoints::WatchKind;
use log::error;

use crate::{
    hardware::RegisterInterface,
    session::DebugSession,
    watchpoints::{WatchpointError, WatchpointKind, WatchpointManager},
};

impl From<WatchKind> for WatchpointKind {
    fn from(kind: WatchKind) -> Self {
        match kind {
            WatchKind::Write => Self::Write,
            WatchKind::Read => Self::Read,
            WatchKind::ReadWrite => Self::ReadWrite,
        }
    }
}

fn accepted(op: &str, addr: u32, result: Result<(), WatchpointError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            error!("{op} watchpoint at 0x{addr:08x}: {err} ({})", err.errno());
            false
        }
    }
}

impl<R: RegisterInterface> WatchpointManager<R> {
    /// `Z2`/`Z3`/`Z4` packets.
    pub fn add_hw_watchpoint(
        &self,
        session: &mut DebugSession,
        addr: u32,
        len: u32,
        kind: WatchKind,
    ) -> bool {
        accepted("add", addr, self.add(session, addr, len, kind.into()))
    }

    /// `z2`/`z3`/`z4` packets.
    pub fn remove_hw_watchpoint(
        &self,
        session: &mut DebugSession,
        addr: u32,
        kind: WatchKind,
    ) -> bool {
        accepted("remove", addr, self.remove(session, addr, kind.into()))
    }
}
