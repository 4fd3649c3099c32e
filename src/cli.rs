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

use std::{borrow::Cow, path::PathBuf};

use clap::Parser;
use mpcore_watchpoints::{registers::RegisterPair, script::maybe_hex, watchpoints::MatchRule};

fn register_pair(s: &str) -> Result<RegisterPair, Cow<'static, str>> {
    let descriptor = maybe_hex(s)?;
    match RegisterPair::from_descriptor(descriptor) {
        Some(pair) if pair.exists() => Ok(pair),
        _ => Err(Cow::Owned(format!(
            "0x{descriptor:x} is not a register pair descriptor (expected 0-5 or 0x100-0x101)"
        ))),
    }
}

/// Run watchpoint scripts against an emulated ARM11 MPCore debug register
/// file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// How a (session, address) query selects a slot.
    #[arg(long, value_enum, default_value_t = MatchRule::AddressOrOwner)]
    pub match_rule: MatchRule,
    /// Register pair descriptor whose writes should fail, e.g. `4` for BRP4
    /// or `0x101` for WRP1. May be repeated.
    #[arg(long, value_parser = register_pair)]
    pub fail_on: Vec<RegisterPair>,
    /// Result code reported by `--fail-on` pairs.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub fault_code: i32,
    /// Print `dump` output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Script file, one command per line. Reads standard input if omitted.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments from the process environment.
    pub fn parse() -> Result<Self, String> {
        let retval = <Self as clap::Parser>::parse();
        if retval.fault_code == 0 && !retval.fail_on.is_empty() {
            return Err(
                "Invalid arguments: --fault-code 0 would report the refused writes as successful."
                    .to_string(),
            );
        }
        Ok(retval)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
