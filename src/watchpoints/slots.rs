// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! Logical watchpoint slots.
//!
//! Slot `i` is statically backed by `WRPi` linked to `BRP(4+i)`.

use serde_derive::Serialize;

use super::{MatchRule, Watchpoint, WatchpointKind};
use crate::session::ContextId;

/// Number of logical watchpoint slots.
pub const SLOT_COUNT: usize = crate::registers::WATCHPOINT_PAIRS;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Slot {
    #[default]
    Free,
    Occupied(Watchpoint),
}

impl Slot {
    pub const fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    pub const fn watchpoint(&self) -> Option<&Watchpoint> {
        match self {
            Self::Free => None,
            Self::Occupied(wp) => Some(wp),
        }
    }

    /// [`WatchpointKind::Disabled`] for free slots.
    pub fn kind(&self) -> WatchpointKind {
        self.watchpoint()
            .map_or(WatchpointKind::Disabled, |wp| wp.kind)
    }
}

/// Fixed table of [`SLOT_COUNT`] slots.
///
/// `total` always equals the number of occupied slots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SlotTable {
    total: usize,
    slots: [Slot; SLOT_COUNT],
}

impl SlotTable {
    pub const fn new() -> Self {
        Self {
            total: 0,
            slots: [Slot::Free; SLOT_COUNT],
        }
    }

    /// Number of occupied slots.
    pub const fn total(&self) -> usize {
        self.total
    }

    pub const fn is_full(&self) -> bool {
        self.total == SLOT_COUNT
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn get(&self, id: usize) -> Option<&Slot> {
        self.slots.get(id)
    }

    /// Lowest-indexed free slot.
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_free)
    }

    /// First occupied slot selected by `rule` for a query by `owner` about
    /// `address`.
    pub fn find(
        &self,
        rule: MatchRule,
        owner: ContextId,
        address: u32,
    ) -> Option<(usize, &Watchpoint)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| Some((id, slot.watchpoint()?)))
            .find(|(_, wp)| match rule {
                MatchRule::AddressOrOwner => wp.address == address || wp.owner == owner,
                MatchRule::Exact => wp.address == address && wp.owner == owner,
            })
    }

    /// Occupied slot watching exactly `address`, whoever owns it.
    pub fn find_address(&self, address: u32) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.watchpoint().is_some_and(|wp| wp.address == address))
    }

    /// Fills the free slot `id`.
    pub fn occupy(&mut self, id: usize, watchpoint: Watchpoint) {
        debug_assert!(self.slots[id].is_free());
        debug_assert_ne!(watchpoint.kind, WatchpointKind::Disabled);
        self.slots[id] = Slot::Occupied(watchpoint);
        self.total += 1;
    }

    /// Frees slot `id`, returning what it held.
    pub fn release(&mut self, id: usize) -> Option<Watchpoint> {
        let Slot::Occupied(wp) = std::mem::take(&mut self.slots[id]) else {
            return None;
        };
        self.total -= 1;
        Some(wp)
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
