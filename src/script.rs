// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

//! Line-oriented watchpoint scripts run against the emulated register file.
//!
//! ```text
//! # comment
//! add <ctx> <addr> <size> <r|w|rw>
//! remove <ctx> <addr> [r|w|rw|any]
//! kind <ctx> <addr>
//! access <ctx> <addr> <size> <r|w> [priv]
//! reset
//! dump
//! ```
//!
//! Numbers are decimal or `0x`-prefixed hexadecimal.

use std::{borrow::Cow, collections::BTreeMap};

use log::info;

use crate::{
    hardware::emulated::{MemoryAccess, RegisterFile},
    session::{ContextId, DebugSession},
    watchpoints::{WatchpointKind, WatchpointManager},
};

/// Widest single load or store, `LDRD`/`STRD`.
pub const MAX_ACCESS_SIZE: u32 = 8;

/// Parses a decimal or `0x`-prefixed hexadecimal `u32`.
pub fn maybe_hex(s: &str) -> Result<u32, Cow<'static, str>> {
    const HEX_PREFIX: &str = "0x";
    const HEX_PREFIX_UPPER: &str = "0X";
    const HEX_PREFIX_LEN: usize = HEX_PREFIX.len();

    let result = if s.starts_with(HEX_PREFIX) || s.starts_with(HEX_PREFIX_UPPER) {
        u32::from_str_radix(&s[HEX_PREFIX_LEN..], 16)
    } else {
        s.parse::<u32>()
    };

    result.map_err(|err| Cow::Owned(format!("{s:?}: {err}")))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Add {
        context_id: ContextId,
        address: u32,
        size: u32,
        kind: WatchpointKind,
    },
    Remove {
        context_id: ContextId,
        address: u32,
        kind: WatchpointKind,
    },
    Kind {
        context_id: ContextId,
        address: u32,
    },
    Access(MemoryAccess),
    Reset,
    Dump,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub line: usize,
    pub message: Cow<'static, str>,
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ScriptError {}

impl Command {
    /// Parses one script line. Blank lines and comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, Cow<'static, str>> {
        let line = line.split('#').next().unwrap_or_default();
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&op, args)) = words.split_first() else {
            return Ok(None);
        };

        let arity = |min: usize, max: usize| -> Result<(), Cow<'static, str>> {
            if args.len() < min || args.len() > max {
                return Err(Cow::Owned(format!(
                    "{op} takes {min}..={max} arguments, got {}",
                    args.len()
                )));
            }
            Ok(())
        };
        let kind = |s: &str| -> Result<WatchpointKind, Cow<'static, str>> {
            s.parse::<WatchpointKind>()
                .map_err(|err| Cow::Owned(err.to_string()))
        };

        let command = match op {
            "add" => {
                arity(4, 4)?;
                Self::Add {
                    context_id: ContextId(maybe_hex(args[0])?),
                    address: maybe_hex(args[1])?,
                    size: maybe_hex(args[2])?,
                    kind: kind(args[3])?,
                }
            }
            "remove" => {
                arity(2, 3)?;
                Self::Remove {
                    context_id: ContextId(maybe_hex(args[0])?),
                    address: maybe_hex(args[1])?,
                    kind: args
                        .get(2)
                        .map_or(Ok(WatchpointKind::Disabled), |s| kind(s))?,
                }
            }
            "kind" => {
                arity(2, 2)?;
                Self::Kind {
                    context_id: ContextId(maybe_hex(args[0])?),
                    address: maybe_hex(args[1])?,
                }
            }
            "access" => {
                arity(4, 5)?;
                let context_id = ContextId(maybe_hex(args[0])?);
                let address = maybe_hex(args[1])?;
                let size = maybe_hex(args[2])?;
                if !(1..=MAX_ACCESS_SIZE).contains(&size) {
                    return Err(Cow::Owned(format!(
                        "access size must be 1..={MAX_ACCESS_SIZE}, got {size}"
                    )));
                }
                let access = match args[3] {
                    "r" | "read" => MemoryAccess::read(context_id, address, size),
                    "w" | "write" => MemoryAccess::write(context_id, address, size),
                    other => {
                        return Err(Cow::Owned(format!(
                            "access must be r or w, got {other:?}"
                        )))
                    }
                };
                match args.get(4) {
                    None => Self::Access(access),
                    Some(&"priv") => Self::Access(access.privileged()),
                    Some(other) => {
                        return Err(Cow::Owned(format!("expected priv, got {other:?}")))
                    }
                }
            }
            "reset" => {
                arity(0, 0)?;
                Self::Reset
            }
            "dump" => {
                arity(0, 0)?;
                Self::Dump
            }
            other => return Err(Cow::Owned(format!("unknown command {other:?}"))),
        };
        Ok(Some(command))
    }
}

/// Runs commands against a manager backed by a [`RegisterFile`].
#[derive(Debug)]
pub struct Interpreter {
    manager: WatchpointManager<RegisterFile>,
    sessions: BTreeMap<ContextId, DebugSession>,
    json: bool,
}

impl Interpreter {
    pub fn new(manager: WatchpointManager<RegisterFile>, json: bool) -> Self {
        Self {
            manager,
            sessions: BTreeMap::new(),
            json,
        }
    }

    pub fn manager(&self) -> &WatchpointManager<RegisterFile> {
        &self.manager
    }

    pub fn session(&self, context_id: ContextId) -> Option<&DebugSession> {
        self.sessions.get(&context_id)
    }

    /// Executes `command` and returns what it prints.
    pub fn execute(&mut self, command: Command) -> Result<String, serde_json::Error> {
        let outcome = |result: Result<(), crate::watchpoints::WatchpointError>| match result {
            Ok(()) => "ok".to_string(),
            Err(err) => format!("error {} ({err})", err.errno()),
        };
        let output = match command {
            Command::Add {
                context_id,
                address,
                size,
                kind,
            } => {
                let manager = &self.manager;
                let session = self
                    .sessions
                    .entry(context_id)
                    .or_insert_with(|| DebugSession::new(context_id));
                outcome(manager.add(session, address, size, kind))
            }
            Command::Remove {
                context_id,
                address,
                kind,
            } => {
                let manager = &self.manager;
                let session = self
                    .sessions
                    .entry(context_id)
                    .or_insert_with(|| DebugSession::new(context_id));
                outcome(manager.remove(session, address, kind))
            }
            Command::Kind {
                context_id,
                address,
            } => {
                let session = self
                    .sessions
                    .entry(context_id)
                    .or_insert_with(|| DebugSession::new(context_id));
                self.manager.kind(session, address).to_string()
            }
            Command::Access(access) => {
                match self.manager.with_registers(|r| r.check_access(&access)) {
                    Some(wrp) => format!("hit WRP{wrp}"),
                    None => "miss".to_string(),
                }
            }
            Command::Reset => {
                self.manager.reset();
                // Every session is torn down along with the hardware state.
                for session in self.sessions.values_mut() {
                    session.clear_watchpoints();
                }
                "ok".to_string()
            }
            Command::Dump => {
                let table = self.manager.snapshot();
                if self.json {
                    serde_json::to_string(&table)?
                } else {
                    let mut lines = vec![format!("total {}", table.total())];
                    for (id, slot) in table.slots().iter().enumerate() {
                        lines.push(match slot.watchpoint() {
                            None => format!("slot {id}: free"),
                            Some(wp) => format!(
                                "slot {id}: 0x{:08x} size {} {} owner {}",
                                wp.address, wp.size, wp.kind, wp.owner
                            ),
                        });
                    }
                    lines.join("\n")
                }
            }
        };
        Ok(output)
    }

    /// Runs every line of `script`, returning the outputs in order.
    pub fn run(&mut self, script: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let mut outputs = vec![];
        for (i, line) in script.lines().enumerate() {
            let command = Command::parse(line).map_err(|message| ScriptError {
                line: i + 1,
                message,
            })?;
            let Some(command) = command else {
                continue;
            };
            info!("{}: {}", i + 1, line.trim());
            outputs.push(self.execute(command)?);
        }
        Ok(outputs)
    }
}
