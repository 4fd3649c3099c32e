// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

use mpcore_watchpoints::{
    hardware::emulated::RegisterFile,
    registers::RegisterPair,
    script::Interpreter,
    session::ContextId,
    watchpoints::{ManagerConfig, MatchRule, WatchpointManager},
};

mod utils;

fn interpreter(match_rule: MatchRule, json: bool) -> Interpreter {
    Interpreter::new(utils::make_test_manager(match_rule), json)
}

#[test_log::test]
fn test_script_scenarios() {
    let mut interp = interpreter(MatchRule::AddressOrOwner, false);
    let output = interp
        .run(
            "# two sessions share the two slots
add 1 0x1000 4 rw
kind 1 0x1000
add 2 0x1000 1 w
add 2 0x2000 4 r
add 3 0x3000 4 w
add 3 0x2003 2 w
access 1 0x1000 4 w
access 2 0x1000 4 w
remove 2 0x2000 w
remove 2 0x2000
dump
",
        )
        .unwrap();
    assert_eq!(
        output,
        vec![
            "ok",
            "rw",
            "error -22 (invalid argument: address is already watched)",
            "ok",
            "error -16 (no free hardware watchpoint)",
            "error -22 (invalid argument: 2 bytes at offset 3 cross an aligned word)",
            "hit WRP0",
            "miss",
            "error -22 (invalid argument: requested write watchpoint but found read)",
            "ok",
            "total 1\nslot 0: 0x00001000 size 4 rw owner 0x1\nslot 1: free",
        ]
    );
    assert_eq!(interp.session(ContextId(2)).unwrap().live(), 0);
    assert_eq!(interp.session(ContextId(1)).unwrap().watched(), &[0x1000]);
}

#[test_log::test]
fn test_script_reset_clears_sessions() {
    let mut interp = interpreter(MatchRule::Exact, false);
    let output = interp
        .run("add 1 0x1000 4 r\nadd 1 0x2000 4 r\nreset\nadd 1 0x3000 4 r\nkind 1 0x1000\n")
        .unwrap();
    assert_eq!(output, vec!["ok", "ok", "ok", "ok", "disabled"]);
    assert_eq!(interp.manager().total(), 1);
}

#[test_log::test]
fn test_script_dump_json() {
    let mut interp = interpreter(MatchRule::AddressOrOwner, true);
    let output = interp.run("add 5 0x2001 2 w\ndump").unwrap();
    let table: serde_json::Value = serde_json::from_str(&output[1]).unwrap();
    assert_eq!(table["total"], 1);
    let slot = &table["slots"][0]["Occupied"];
    assert_eq!(slot["address"], 0x2001);
    assert_eq!(slot["size"], 2);
    assert_eq!(slot["kind"], "write");
    assert_eq!(slot["owner"], 5);
    assert_eq!(table["slots"][1], "Free");
}

#[test_log::test]
fn test_script_hardware_fault() {
    let mut registers = RegisterFile::new();
    registers.fail_on(RegisterPair::Breakpoint(4), -1);
    let manager = WatchpointManager::new(registers, ManagerConfig::default());
    let mut interp = Interpreter::new(manager, false);
    let output = interp.run("add 1 0x1000 4 r\ndump").unwrap();
    assert!(output[0].starts_with("error -22"), "{}", output[0]);
    assert_eq!(output[1], "total 0\nslot 0: free\nslot 1: free");
}

#[test_log::test]
fn test_script_parse_error() {
    let mut interp = interpreter(MatchRule::AddressOrOwner, false);
    let err = interp.run("add 1 0x1000 4 r\n\nbogus 1\n").unwrap_err();
    assert_eq!(err.to_string(), r#"line 3: unknown command "bogus""#);
    // Commands before the bad line ran.
    assert_eq!(interp.manager().total(), 1);
}
