// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the mpcore-watchpoints project.

use mpcore_watchpoints::{
    hardware::emulated::RegisterWrite,
    registers::RegisterPair,
    watchpoints::{InvalidReason, MatchRule, WatchpointError, WatchpointKind},
};

#[macro_use]
mod utils;

#[test_log::test]
fn test_remove_kind_mismatch() {
    let manager = utils::make_test_manager(MatchRule::AddressOrOwner);
    let mut a = utils::session(1);
    manager.add(&mut a, 0x3000, 4, WatchpointKind::Write).unwrap();
    let before = manager.snapshot();

    assert_eq!(
        manager.remove(&mut a, 0x3000, WatchpointKind::Read),
        Err(WatchpointError::InvalidArgument(
            InvalidReason::KindMismatch {
                requested: WatchpointKind::Read,
                found: WatchpointKind::Write,
            }
        ))
    );
    assert_eq!(manager.snapshot(), before);
    assert_eq!(manager.total(), 1);
    assert_eq!(a.watched(), &[0x3000]);
}

#[test_log::test]
fn test_remove_not_found() {
    let manager = utils::make_test_manager(MatchRule::AddressOrOwner);
    let mut a = utils::session(1);
    let mut b = utils::session(2);
    assert_eq!(
        manager.remove(&mut a, 0x4000, WatchpointKind::Disabled),
        Err(WatchpointError::InvalidArgument(InvalidReason::NotFound))
    );

    manager.add(&mut a, 0x3000, 4, WatchpointKind::Write).unwrap();
    manager.with_registers(|r| r.clear_journal());
    let before = manager.snapshot();
    let err = manager
        .remove(&mut b, 0x4000, WatchpointKind::Disabled)
        .unwrap_err();
    assert_eq!(err.errno(), -22);
    assert_eq!(manager.snapshot(), before);
    assert!(manager.with_registers(|r| r.writes().is_empty()));
}

#[test_log::test]
fn test_remove_disables_pairs() {
    let manager = utils::make_test_manager(MatchRule::AddressOrOwner);
    let mut a = utils::session(7);
    manager
        .add(&mut a, 0x1000, 4, WatchpointKind::ReadWrite)
        .unwrap();
    manager.with_registers(|r| r.clear_journal());

    manager
        .remove(&mut a, 0x1000, WatchpointKind::ReadWrite)
        .unwrap();
    assert_eq!(manager.total(), 0);
    assert_eq!(manager.kind(&a, 0x1000), WatchpointKind::Disabled);
    assert_eq!(a.live(), 0);
    assert_eq!(
        manager.with_registers(|r| r.writes().to_vec()),
        vec![
            RegisterWrite {
                pair: RegisterPair::Breakpoint(4),
                control: 0,
                value: 0
            },
            RegisterWrite {
                pair: RegisterPair::Watchpoint(0),
                control: 0,
                value: 0
            },
        ]
    );
    assert!(manager.with_registers(|r| r.all_disabled()));
}

#[test_log::test]
fn test_remove_any_kind() {
    let manager = utils::make_test_manager(MatchRule::AddressOrOwner);
    let mut a = utils::session(1);
    manager.add(&mut a, 0x1000, 2, WatchpointKind::Read).unwrap();
    manager
        .remove(&mut a, 0x1000, WatchpointKind::Disabled)
        .unwrap();
    assert_eq!(manager.total(), 0);
}

#[test_log::test]
fn test_remove_frees_slot_for_reuse() {
    let manager = utils::make_test_manager(MatchRule::AddressOrOwner);
    let mut a = utils::session(1);
    let mut b = utils::session(2);
    let mut c = utils::session(3);
    manager.add(&mut a, 0x1000, 4, WatchpointKind::Read).unwrap();
    manager.add(&mut b, 0x2000, 4, WatchpointKind::Read).unwrap();
    manager.remove(&mut a, 0x1000, WatchpointKind::Read).unwrap();

    manager.add(&mut c, 0x3000, 4, WatchpointKind::Write).unwrap();
    let table = manager.snapshot();
    assert_eq!(table.slots()[0].watchpoint().unwrap().address, 0x3000);
    assert_eq!(table.slots()[1].watchpoint().unwrap().address, 0x2000);
    let brp = utils::pair(&manager, RegisterPair::Breakpoint(4));
    assert_hex_eq!(brp.value, 3);
}

#[test_log::test]
fn test_remove_shifts_session_cache() {
    let manager = utils::make_test_manager(MatchRule::Exact);
    let mut a = utils::session(1);
    manager.add(&mut a, 0x1000, 4, WatchpointKind::Read).unwrap();
    manager.add(&mut a, 0x2000, 4, WatchpointKind::Write).unwrap();
    assert_eq!(a.watched(), &[0x1000, 0x2000]);

    manager.remove(&mut a, 0x1000, WatchpointKind::Read).unwrap();
    assert_eq!(a.watched(), &[0x2000]);
    assert!(a.has_room());

    manager.add(&mut a, 0x1000, 4, WatchpointKind::Read).unwrap();
    assert_eq!(a.watched(), &[0x2000, 0x1000]);
    manager.remove(&mut a, 0x1000, WatchpointKind::Read).unwrap();
    assert_eq!(a.watched(), &[0x2000]);
}

#[test_log::test]
fn test_remove_by_owner() {
    // Under the address-or-owner rule a session's own slot is selected even
    // for another address.
    let manager = utils::make_test_manager(MatchRule::AddressOrOwner);
    let mut a = utils::session(1);
    manager.add(&mut a, 0x1000, 4, WatchpointKind::Read).unwrap();
    manager
        .remove(&mut a, 0x5000, WatchpointKind::Disabled)
        .unwrap();
    assert_eq!(manager.total(), 0);
    assert_eq!(a.live(), 0);

    let manager = utils::make_test_manager(MatchRule::Exact);
    manager.add(&mut a, 0x1000, 4, WatchpointKind::Read).unwrap();
    assert_eq!(
        manager.remove(&mut a, 0x5000, WatchpointKind::Disabled),
        Err(WatchpointError::InvalidArgument(InvalidReason::NotFound))
    );
    assert_eq!(manager.total(), 1);
}

#[test_log::test]
fn test_remove_with_failing_disable() {
    let manager = utils::make_test_manager(MatchRule::AddressOrOwner);
    let mut a = utils::session(1);
    manager.add(&mut a, 0x1000, 4, WatchpointKind::Read).unwrap();
    manager.with_registers(|r| r.fail_on(RegisterPair::Watchpoint(0), -1));

    manager.remove(&mut a, 0x1000, WatchpointKind::Read).unwrap();
    assert_eq!(manager.total(), 0);
    assert!(utils::pair(&manager, RegisterPair::Breakpoint(4)).is_disabled());
}

#[test_log::test]
fn test_add_remove_restores_state() {
    let manager = utils::make_test_manager(MatchRule::AddressOrOwner);
    let mut a = utils::session(9);
    let table_before = manager.snapshot();
    let session_before = a.clone();

    manager.add(&mut a, 0x1003, 1, WatchpointKind::Write).unwrap();
    manager.remove(&mut a, 0x1003, WatchpointKind::Write).unwrap();

    assert_eq!(manager.snapshot(), table_before);
    assert_eq!(a, session_before);
    assert!(manager.with_registers(|r| r.all_disabled()));
}
