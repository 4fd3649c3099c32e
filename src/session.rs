// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! Debug session state visible to the watchpoint manager.

use serde_derive::{Deserialize, Serialize};

/// Maximum number of live watchpoints a single session tracks.
pub const SESSION_WATCHPOINTS: usize = 2;

/// Handle of the debugged process, compared against the `CONTEXTIDR` by the
/// context ID breakpoints.
#[derive(
    Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct ContextId(pub u32);

impl std::fmt::Display for ContextId {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "0x{:x}", self.0)
    }
}

impl std::fmt::Debug for ContextId {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "0x{:x}", self.0)
    }
}

/// A debug session and its cache of the addresses it watches.
///
/// The cache is only mutated by
/// [`WatchpointManager`](crate::watchpoints::WatchpointManager) as a side
/// effect of this session's own add/remove calls, so the session can answer
/// [`Self::is_watching`] without taking the manager lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugSession {
    context_id: ContextId,
    watchpoints: [u32; SESSION_WATCHPOINTS],
    live: usize,
}

impl DebugSession {
    pub const fn new(context_id: ContextId) -> Self {
        Self {
            context_id,
            watchpoints: [0; SESSION_WATCHPOINTS],
            live: 0,
        }
    }

    pub const fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Number of live watchpoints.
    pub const fn live(&self) -> usize {
        self.live
    }

    /// Watched addresses, oldest first.
    pub fn watched(&self) -> &[u32] {
        &self.watchpoints[..self.live]
    }

    pub fn is_watching(&self, address: u32) -> bool {
        self.watched().contains(&address)
    }

    pub const fn has_room(&self) -> bool {
        self.live < SESSION_WATCHPOINTS
    }

    /// Drops the local cache, e.g. on detach or after the manager was reset.
    pub fn clear_watchpoints(&mut self) {
        self.watchpoints = [0; SESSION_WATCHPOINTS];
        self.live = 0;
    }

    /// Appends `address`. Returns `false` if the cache is full.
    pub(crate) fn record(&mut self, address: u32) -> bool {
        if !self.has_room() {
            return false;
        }
        self.watchpoints[self.live] = address;
        self.live += 1;
        true
    }

    /// Removes `address`, shifting the second entry down if the first one
    /// matched. Returns `false` if the address was not cached.
    pub(crate) fn forget(&mut self, address: u32) -> bool {
        if self.live > 0 && self.watchpoints[0] == address {
            self.watchpoints[0] = self.watchpoints[1];
            self.watchpoints[1] = 0;
        } else if self.live > 1 && self.watchpoints[1] == address {
            self.watchpoints[1] = 0;
        } else {
            return false;
        }
        self.live -= 1;
        true
    }
}
