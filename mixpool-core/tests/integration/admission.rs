//! Admission gates: protocol version, registry presence, fair-use throttles,
//! denomination compatibility and entry acceptance rules.

use crate::fixtures::*;
use mixpool_core::domain::messages::PoolMessage;
use mixpool_core::domain::{PoolStateId, PoolStatusUpdate, PoolWireMessage};
use mixpool_core::foundation::Denomination;
use mixpool_core::infrastructure::validation::{InOutCheck, PoolOptions};
use std::sync::atomic::Ordering;

fn two_seat_options() -> PoolOptions {
    PoolOptions { min_participants: 2, max_participants: 2 }
}

/// Drive a harness to ACCEPTING_ENTRIES with two seated participants.
fn reach_accepting(harness: &Harness) {
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    harness.accept(&peer(2), TEST_DENOM, collateral_tx(2));
    harness.tick();
    assert_eq!(harness.coordinator.state_id(), PoolStateId::AcceptingEntries);
}

#[test]
fn test_obsolete_version_gets_reject_and_status() {
    let harness = Harness::new(PoolOptions::default());
    harness.accept(&obsolete_peer(1), TEST_DENOM, collateral_tx(1));

    let rejects = harness.transport.rejects();
    assert_eq!(rejects.len(), 1);
    assert_eq!(rejects[0].0, 1);
    assert_eq!(rejects[0].1, "dsa");
    assert_eq!(harness.statuses_for(&addr(1)), vec![(PoolStatusUpdate::Rejected, PoolMessage::ErrVersion)]);
    // no state change
    assert_eq!(harness.coordinator.session_id(), 0);
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Idle);
}

#[test]
fn test_obsolete_version_advert_gets_reject_only() {
    let harness = Harness::new(PoolOptions::default());
    let signer = harness.register_coordinator(0xB0);
    let advert = signed_advert(&signer, TEST_DENOM, outpoint(0xB0, 0), TEST_GENESIS_TIME, false);
    harness.coordinator.process_message(&obsolete_peer(9), PoolWireMessage::Queue(advert));

    assert_eq!(harness.transport.rejects().len(), 1);
    assert_eq!(harness.transport.rejects()[0].1, "dsq");
    assert!(harness.statuses_for(&addr(9)).is_empty());
    assert_eq!(harness.coordinator.queue_size(), 0);
}

#[test]
fn test_missing_own_registration_rejects_candidates() {
    let harness = Harness::new_unregistered(PoolOptions::default());
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    assert_eq!(harness.statuses_for(&addr(1)), vec![(PoolStatusUpdate::Rejected, PoolMessage::ErrMnList)]);
    assert_eq!(harness.coordinator.session_id(), 0);
}

#[test]
fn test_live_own_advert_blocks_new_session() {
    let harness = Harness::new(PoolOptions::default());
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Queue);

    // queue times out below quorum and the pool resets, but our advert lives on
    harness.clock.advance(30);
    harness.tick();
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Idle);
    assert_eq!(harness.coordinator.queue_size(), 1);

    harness.accept(&peer(2), TEST_DENOM, collateral_tx(2));
    assert_eq!(harness.statuses_for(&addr(2)), vec![(PoolStatusUpdate::Rejected, PoolMessage::ErrRecent)]);
    assert_eq!(harness.coordinator.session_id(), 0);
}

#[test]
fn test_advert_ratio_throttles_new_session() {
    let harness = Harness::new(PoolOptions::default());
    // 11 valid coordinators; threshold = last_seq + 11/5 = 5 + 2 = 7 > 6
    for seed in 0x10..0x1A {
        harness.register_coordinator(seed);
    }
    harness.metadata.set_last_advert_seq(Harness::own_coordinator_id(), 5);
    harness.metadata.set_advert_count(6);

    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    assert_eq!(harness.statuses_for(&addr(1)), vec![(PoolStatusUpdate::Rejected, PoolMessage::ErrRecent)]);
    assert_eq!(harness.coordinator.session_id(), 0);
}

#[test]
fn test_invalid_denomination_is_rejected() {
    let harness = Harness::new(PoolOptions::default());
    harness.accept(&peer(1), Denomination(0), collateral_tx(1));
    assert_eq!(harness.statuses_for(&addr(1)), vec![(PoolStatusUpdate::Rejected, PoolMessage::ErrDenom)]);
    assert_eq!(harness.coordinator.session_id(), 0);
}

#[test]
fn test_mismatched_denomination_cannot_join() {
    let harness = Harness::new(PoolOptions::default());
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    harness.accept(&peer(2), Denomination(TEST_DENOM.0 * 2), collateral_tx(2));
    assert_eq!(harness.statuses_for(&addr(2)), vec![(PoolStatusUpdate::Rejected, PoolMessage::ErrDenom)]);
    assert_eq!(harness.coordinator.participant_count(), 1);
}

#[test]
fn test_invalid_collateral_is_rejected() {
    let harness = Harness::new(PoolOptions::default());
    harness.policy.reject_collaterals.store(true, Ordering::SeqCst);
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    assert_eq!(harness.statuses_for(&addr(1)), vec![(PoolStatusUpdate::Rejected, PoolMessage::ErrInvalidCollateral)]);
    assert_eq!(harness.coordinator.session_id(), 0);
}

#[test]
fn test_entry_before_sealing_is_rejected() {
    let harness = Harness::new(PoolOptions::default());
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Queue);

    harness.submit(&peer(1), entry(1, 1, collateral_tx(1)));
    let statuses = harness.statuses_for(&addr(1));
    assert_eq!(statuses.last(), Some(&(PoolStatusUpdate::Rejected, PoolMessage::ErrSession)));
    assert_eq!(harness.coordinator.entries_count(), 0);
}

#[test]
fn test_max_inputs_boundary() {
    let harness = Harness::new(two_seat_options());
    reach_accepting(&harness);

    // exactly at the cap: accepted
    harness.submit(&peer(1), entry(1, 9, collateral_tx(1)));
    assert_eq!(harness.statuses_for(&addr(1)).last(), Some(&(PoolStatusUpdate::Accepted, PoolMessage::EntriesAdded)));
    assert_eq!(harness.coordinator.entries_count(), 1);

    // one above: rejected and the collateral is forfeited
    harness.submit(&peer(2), entry(2, 10, collateral_tx(2)));
    assert_eq!(harness.statuses_for(&addr(2)).last(), Some(&(PoolStatusUpdate::Rejected, PoolMessage::ErrMaximum)));
    assert_eq!(harness.mempool.accepted(), vec![collateral_tx(2)]);
    assert_eq!(harness.transport.relayed_txs(), vec![collateral_tx(2)]);
    assert_eq!(harness.coordinator.entries_count(), 1);
}

#[test]
fn test_duplicate_outpoint_is_rejected_without_forfeit() {
    let harness = Harness::new(two_seat_options());
    reach_accepting(&harness);

    harness.submit(&peer(1), entry(1, 1, collateral_tx(1)));
    // same tag reuses the same outpoints under a different collateral
    harness.submit(&peer(2), entry(1, 1, collateral_tx(2)));

    assert_eq!(harness.statuses_for(&addr(2)).last(), Some(&(PoolStatusUpdate::Rejected, PoolMessage::ErrAlreadyHave)));
    // ambiguous attribution: nobody is punished
    assert!(harness.mempool.accepted().is_empty());
    assert_eq!(harness.coordinator.entries_count(), 1);
}

#[test]
fn test_bundle_predicate_failure_can_forfeit() {
    let harness = Harness::new(two_seat_options());
    reach_accepting(&harness);
    *harness.policy.force_inout.lock().unwrap() =
        Some(InOutCheck::Invalid { code: PoolMessage::ErrInvalidScript, consume_collateral: true });

    harness.submit(&peer(1), entry(1, 1, collateral_tx(1)));
    assert_eq!(harness.statuses_for(&addr(1)).last(), Some(&(PoolStatusUpdate::Rejected, PoolMessage::ErrInvalidScript)));
    assert_eq!(harness.mempool.accepted(), vec![collateral_tx(1)]);
    assert_eq!(harness.coordinator.entries_count(), 0);
}

#[test]
fn test_wrong_output_amount_is_rejected() {
    let harness = Harness::new(two_seat_options());
    reach_accepting(&harness);

    let mut bad = entry(1, 1, collateral_tx(1));
    bad.outputs[0].value = TEST_DENOM_AMOUNT - 1;
    harness.submit(&peer(1), bad);

    assert_eq!(harness.statuses_for(&addr(1)).last(), Some(&(PoolStatusUpdate::Rejected, PoolMessage::ErrDenom)));
    assert!(harness.mempool.accepted().is_empty());
    assert_eq!(harness.coordinator.entries_count(), 0);
}
