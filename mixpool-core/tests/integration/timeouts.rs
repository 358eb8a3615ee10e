//! Timer-driven behavior: soft-timeout assembly with a quorum, queue teardown
//! below quorum, and the no-show forfeit.

use crate::fixtures::*;
use mixpool_core::domain::messages::PoolMessage;
use mixpool_core::domain::PoolStateId;
use mixpool_core::infrastructure::validation::PoolOptions;

#[test]
fn test_seat_holder_no_show_forfeits_and_session_completes() {
    let harness = Harness::new(PoolOptions { min_participants: 2, max_participants: 3 });

    for n in 1..=3u8 {
        harness.accept(&peer(n), TEST_DENOM, collateral_tx(n));
    }
    harness.tick();
    assert_eq!(harness.coordinator.state_id(), PoolStateId::AcceptingEntries);

    // only two of the three seat holders deliver
    let first = entry(1, 2, collateral_tx(1));
    let second = entry(2, 2, collateral_tx(2));
    harness.submit(&peer(1), first.clone());
    harness.submit(&peer(2), second.clone());
    assert_eq!(harness.coordinator.entries_count(), 2);

    // soft timeout fires at exactly last_progress + QUEUE_TIMEOUT;
    // force the charging gate open (draw <= 33)
    harness.clock.advance(30);
    harness.rng.push_values(&[0]);
    harness.tick();

    // the absentee's collateral was consumed and relayed
    assert_eq!(harness.mempool.accepted(), vec![collateral_tx(3)]);
    assert_eq!(harness.transport.relayed_txs(), vec![collateral_tx(3)]);

    // assembly proceeded with the two cooperative entries
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Signing);
    let final_tx = harness.final_tx_for(&addr(1)).expect("final tx relayed");
    assert_eq!(final_tx.inputs.len(), 4);
    assert!(harness.final_tx_for(&addr(3)).is_none());

    // then normal signing and commit
    harness.sign_final(&peer(1), harness.client_signatures(&first));
    harness.sign_final(&peer(2), harness.client_signatures(&second));

    assert_eq!(harness.coordinator.state_id(), PoolStateId::Idle);
    assert_eq!(harness.completions_for(&addr(1)), vec![PoolMessage::Success]);
    assert_eq!(harness.completions_for(&addr(2)), vec![PoolMessage::Success]);
    assert!(harness.completions_for(&addr(3)).is_empty());
    // the mixed transaction landed after the forfeited collateral
    assert_eq!(harness.mempool.accepted().len(), 2);
}

#[test]
fn test_soft_timeout_does_not_fire_early() {
    let harness = Harness::new(PoolOptions { min_participants: 2, max_participants: 3 });
    for n in 1..=3u8 {
        harness.accept(&peer(n), TEST_DENOM, collateral_tx(n));
    }
    harness.tick();
    harness.submit(&peer(1), entry(1, 1, collateral_tx(1)));
    harness.submit(&peer(2), entry(2, 1, collateral_tx(2)));

    harness.clock.advance(29);
    harness.tick();
    assert_eq!(harness.coordinator.state_id(), PoolStateId::AcceptingEntries);

    harness.clock.advance(1);
    harness.tick();
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Signing);
}

#[test]
fn test_queue_below_quorum_times_out_without_charges() {
    let harness = Harness::new(PoolOptions::default());
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    assert_eq!(harness.coordinator.state_id(), PoolStateId::Queue);

    harness.clock.advance(30);
    harness.tick();

    assert_eq!(harness.coordinator.state_id(), PoolStateId::Idle);
    assert_eq!(harness.coordinator.session_id(), 0);
    // a queue holds no entries, so there is nobody to charge
    assert!(harness.mempool.accepted().is_empty());
}

#[test]
fn test_accepting_below_quorum_times_out_and_resets() {
    let harness = Harness::new(PoolOptions { min_participants: 2, max_participants: 2 });
    harness.accept(&peer(1), TEST_DENOM, collateral_tx(1));
    harness.accept(&peer(2), TEST_DENOM, collateral_tx(2));
    harness.tick();
    assert_eq!(harness.coordinator.state_id(), PoolStateId::AcceptingEntries);

    // one entry is below the quorum of two: no assembly, plain timeout
    harness.submit(&peer(1), entry(1, 1, collateral_tx(1)));
    harness.clock.advance(30);
    harness.tick();

    assert_eq!(harness.coordinator.state_id(), PoolStateId::Idle);
    assert!(harness.final_tx_for(&addr(1)).is_none());
}
