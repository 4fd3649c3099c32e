//
// mpcore-watchpoints
//
// Copyright 2025- Contributors to the mpcore-watchpoints project
//
// This file is part of mpcore-watchpoints.
//
// mpcore-watchpoints is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// mpcore-watchpoints is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with mpcore-watchpoints. If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later

//! Hardware watchpoint allocation for debug monitors running on ARM11
//! MPCore CPUs.
//!
//! The CPU has two watchpoint register pairs and two breakpoint register
//! pairs that can match a context ID. [`watchpoints::WatchpointManager`] links
//! them in pairs so that up to two watchpoints, each scoped to one debugged
//! process, are live system-wide.

#[cfg(feature = "gdbstub")]
pub mod gdb;
pub mod hardware;
pub mod registers;
pub mod script;
pub mod session;
pub mod watchpoints;
