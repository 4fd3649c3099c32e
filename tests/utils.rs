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

use mpcore_watchpoints::{
    hardware::emulated::{PairState, RegisterFile},
    registers::RegisterPair,
    session::{ContextId, DebugSession},
    watchpoints::{ManagerConfig, MatchRule, WatchpointManager},
};

#[macro_export]
macro_rules! assert_hex_eq {
    ($left: expr, $right: expr$(,)?) => {{
        let left: u32 = $left;
        let right: u32 = $right;
        assert_eq!(
            left,
            right,
            "Comparing {left_s} with {right_s} failed:\n0x{left:08x} {left_s}\n0x{right:08x} \
             {right_s}\n0b{left:032b} {left_s}\n0b{right:032b} {right_s}",
            left_s = stringify!($left),
            right_s = stringify!($right),
            left = left,
            right = right,
        );
    }};
}

#[allow(dead_code)]
pub fn make_test_manager(match_rule: MatchRule) -> WatchpointManager<RegisterFile> {
    let manager = WatchpointManager::new(RegisterFile::new(), ManagerConfig { match_rule });
    manager.with_registers(|r| r.clear_journal());
    manager
}

#[allow(dead_code)]
pub fn session(id: u32) -> DebugSession {
    DebugSession::new(ContextId(id))
}

#[allow(dead_code)]
pub fn pair(manager: &WatchpointManager<RegisterFile>, pair: RegisterPair) -> PairState {
    manager
        .with_registers(|r| r.pair(pair))
        .expect("register pair exists")
}
