//! Participant connectivity failures observed during relay.

use crate::fixtures::*;
use mixpool_core::domain::{PoolEntry, PoolStateId, Script};
use mixpool_core::infrastructure::validation::PoolOptions;

fn two_seat_options() -> PoolOptions {
    PoolOptions { min_participants: 2, max_participants: 2 }
}

fn reach_signing(harness: &Harness) -> (PoolEntry, PoolEntry) {
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    harness.accept(&peer(2), TEST_DENOM, collateral_tx(2));
    harness.tick();
    let first = entry(1, 1, collateral_tx(1));
    let second = entry(2, 1, collateral_tx(2));
    harness.submit(&peer(1), first.clone());
    harness.submit(&peer(2), second.clone());
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Signing);
    (first, second)
}

#[test]
fn test_all_participants_vanishing_resets_without_charges() {
    let harness = Harness::new(two_seat_options());
    let (first, _) = reach_signing(&harness);

    // everyone drops off after receiving the final transaction
    harness.transport.disconnect(addr(1));
    harness.transport.disconnect(addr(2));

    // the next relay attempt observes the blackout; a failed signature batch
    // triggers one
    let mut forged = harness.client_signatures(&first);
    forged[0].script_sig = Script::new(vec![0xDE, 0xAD]);
    harness.sign_final(&peer(1), forged);

    // our own networking is the likely culprit: reset, charge nobody
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Idle);
    assert_eq!(harness.coordinator.session_id(), 0);
    assert!(harness.mempool.accepted().is_empty());
    assert!(harness.transport.relayed_txs().is_empty());
}

#[test]
fn test_single_disconnect_dooms_the_session_but_keeps_it_alive() {
    let harness = Harness::new(two_seat_options());
    let (first, _) = reach_signing(&harness);

    harness.transport.disconnect(addr(2));
    let mut forged = harness.client_signatures(&first);
    forged[0].script_sig = Script::new(vec![0xDE, 0xAD]);
    harness.sign_final(&peer(1), forged);

    // the reachable participant was told the session is over; the pool itself
    // waits for the signing timeout
    assert!(!harness.statuses_for(&addr(1)).is_empty());
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Signing);
    assert!(harness.mempool.accepted().is_empty());
}

#[test]
fn test_unreachable_participant_during_final_tx_relay() {
    let harness = Harness::new(two_seat_options());
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    harness.accept(&peer(2), TEST_DENOM, collateral_tx(2));
    harness.tick();

    harness.submit(&peer(1), entry(1, 1, collateral_tx(1)));
    // participant 2 drops off right before the merge completes
    harness.transport.disconnect(addr(2));
    harness.submit(&peer(2), entry(2, 1, collateral_tx(2)));

    // the final transaction could not reach everyone; participant 1 got the
    // termination status
    assert!(harness
        .statuses_for(&addr(1))
        .iter()
        .any(|(update, _)| *update == mixpool_core::domain::PoolStatusUpdate::Rejected));
}
