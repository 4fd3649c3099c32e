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

use std::io::Read;

use mpcore_watchpoints::{
    hardware::emulated::RegisterFile,
    script::Interpreter,
    watchpoints::{ManagerConfig, WatchpointManager},
};

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Args::parse()?;
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    let script = match args.script {
        Some(ref path) => std::fs::read_to_string(path)
            .map_err(|err| format!("Could not read {}: {err}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut registers = RegisterFile::new();
    for pair in &args.fail_on {
        registers.fail_on(*pair, args.fault_code);
    }
    let config = ManagerConfig {
        match_rule: args.match_rule,
    };
    let manager = WatchpointManager::new(registers, config);
    log::debug!("{manager:?}");

    let mut interpreter = Interpreter::new(manager, args.json);
    for line in interpreter.run(&script)? {
        println!("{line}");
    }
    Ok(())
}
