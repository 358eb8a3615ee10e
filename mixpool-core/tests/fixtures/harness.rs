#![allow(dead_code)]

use crate::fixtures::constants::{OWN_OPERATOR_SEED, TEST_DENOM_AMOUNT, TEST_GENESIS_TIME};
use crate::fixtures::factories::{addr, operator_signer, outpoint, unlocking_script};
use mixpool_core::application::{Coordinator, CoordinatorDeps};
use mixpool_core::domain::{PoolEntry, PoolInput, PoolOutput, PoolWireMessage, Script, Transaction, TxIn};
use mixpool_core::foundation::{Amount, CoordinatorId, Denomination};
use mixpool_core::infrastructure::clock::{Clock, PoolRng};
use mixpool_core::infrastructure::crypto::{OperatorSigner, Secp256k1Signer};
use mixpool_core::infrastructure::mempool::{MemoryBroadcastStore, MemoryMempool};
use mixpool_core::infrastructure::node::NodeStatus;
use mixpool_core::infrastructure::registry::{CoordinatorEntry, MemoryPeerMetadata, MemoryRegistry};
use mixpool_core::infrastructure::script::ScriptVerifier;
use mixpool_core::infrastructure::transport::mock::MockTransport;
use mixpool_core::infrastructure::transport::PeerCtx;
use mixpool_core::infrastructure::validation::{InOutCheck, PoolOptions, PoolPolicy};
use mixpool_core::domain::messages::PoolMessage;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Wall clock under test control.
pub struct ManualClock {
    now: Mutex<i64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, secs: i64) {
        *self.now.lock().unwrap() += secs;
    }

    pub fn set(&self, now: i64) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        *self.now.lock().unwrap()
    }
}

/// RNG with a scripted prefix. Draws pop scripted values (clamped into range);
/// once the script runs dry every draw returns `upper - 1`, which skips all
/// probabilistic charging gates. Shuffles keep order so offender selection is
/// deterministic.
pub struct ScriptedRng {
    script: Mutex<VecDeque<u32>>,
}

impl ScriptedRng {
    pub fn new() -> Self {
        Self { script: Mutex::new(VecDeque::new()) }
    }

    pub fn push_values(&self, values: &[u32]) {
        self.script.lock().unwrap().extend(values.iter().copied());
    }
}

impl PoolRng for ScriptedRng {
    fn rand_int(&self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        match self.script.lock().unwrap().pop_front() {
            Some(value) => value.min(upper - 1),
            None => upper - 1,
        }
    }

    fn shuffle_txs(&self, _txs: &mut Vec<Transaction>) {}
}

/// Policy accepting positive denominations and collaterals by default, with
/// switches for the rejection paths.
pub struct TestPolicy {
    pub denom_amount: Amount,
    pub reject_collaterals: AtomicBool,
    pub force_inout: Mutex<Option<InOutCheck>>,
}

impl TestPolicy {
    pub fn new() -> Self {
        Self { denom_amount: TEST_DENOM_AMOUNT, reject_collaterals: AtomicBool::new(false), force_inout: Mutex::new(None) }
    }
}

impl PoolPolicy for TestPolicy {
    fn is_valid_denomination(&self, denomination: Denomination) -> bool {
        denomination.0 > 0
    }

    fn is_collateral_valid(&self, _collateral: &Transaction) -> bool {
        !self.reject_collaterals.load(Ordering::SeqCst)
    }

    fn check_inputs_outputs(&self, _denomination: Denomination, inputs: &[PoolInput], outputs: &[PoolOutput]) -> InOutCheck {
        if let Some(forced) = *self.force_inout.lock().unwrap() {
            return forced;
        }
        if inputs.is_empty() || outputs.is_empty() {
            return InOutCheck::Invalid { code: PoolMessage::ErrInvalidInput, consume_collateral: false };
        }
        if outputs.iter().any(|output| output.value != self.denom_amount) {
            return InOutCheck::Invalid { code: PoolMessage::ErrDenom, consume_collateral: false };
        }
        InOutCheck::Ok
    }
}

/// Accepts exactly the unlocking script derived from the locking script.
pub struct TestScriptVerifier;

impl ScriptVerifier for TestScriptVerifier {
    fn verify_input(
        &self,
        _tx: &Transaction,
        _input_index: usize,
        script_sig: &Script,
        script_pubkey: &Script,
        _flags: u32,
        _amount: Amount,
    ) -> bool {
        !script_sig.is_empty() && *script_sig == unlocking_script(script_pubkey)
    }
}

pub struct TestStatus {
    pub coordinator: AtomicBool,
    pub synced: AtomicBool,
    pub shutting_down: AtomicBool,
}

impl TestStatus {
    pub fn new() -> Self {
        Self {
            coordinator: AtomicBool::new(true),
            synced: AtomicBool::new(true),
            shutting_down: AtomicBool::new(false),
        }
    }
}

impl NodeStatus for TestStatus {
    fn is_coordinator(&self) -> bool {
        self.coordinator.load(Ordering::SeqCst)
    }

    fn is_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub coordinator: Coordinator,
    pub transport: Arc<MockTransport>,
    pub registry: Arc<MemoryRegistry>,
    pub metadata: Arc<MemoryPeerMetadata>,
    pub mempool: Arc<MemoryMempool>,
    pub broadcasts: Arc<MemoryBroadcastStore>,
    pub clock: Arc<ManualClock>,
    pub rng: Arc<ScriptedRng>,
    pub policy: Arc<TestPolicy>,
    pub status: Arc<TestStatus>,
    pub own_signer: Arc<Secp256k1Signer>,
}

impl Harness {
    pub fn own_outpoint() -> mixpool_core::domain::OutPoint {
        outpoint(0xC0, 0)
    }

    pub fn own_coordinator_id() -> CoordinatorId {
        CoordinatorId::new([0xC0; 32])
    }

    pub fn new(options: PoolOptions) -> Self {
        let harness = Self::new_unregistered(options);
        harness.registry.register(
            Self::own_outpoint(),
            CoordinatorEntry {
                id: Self::own_coordinator_id(),
                operator_pubkey: harness.own_signer.public_key(),
                addr: addr(0xC0),
            },
        );
        harness
    }

    /// A harness whose own registration is absent from the chain-tip registry.
    pub fn new_unregistered(options: PoolOptions) -> Self {
        let transport = Arc::new(MockTransport::new());
        let registry = Arc::new(MemoryRegistry::new());
        let metadata = Arc::new(MemoryPeerMetadata::new());
        let mempool = Arc::new(MemoryMempool::new());
        let broadcasts = Arc::new(MemoryBroadcastStore::new());
        let clock = Arc::new(ManualClock::new(TEST_GENESIS_TIME));
        let rng = Arc::new(ScriptedRng::new());
        let policy = Arc::new(TestPolicy::new());
        let status = Arc::new(TestStatus::new());
        let own_signer = Arc::new(operator_signer(OWN_OPERATOR_SEED));

        let deps = CoordinatorDeps {
            status: status.clone(),
            registry: registry.clone(),
            metadata: metadata.clone(),
            mempool: mempool.clone(),
            broadcasts: broadcasts.clone(),
            transport: transport.clone(),
            policy: policy.clone(),
            script_verifier: Arc::new(TestScriptVerifier),
            signer: own_signer.clone(),
            clock: clock.clone(),
            rng: rng.clone(),
        };
        let coordinator = Coordinator::new(options, Self::own_outpoint(), deps);

        Self { coordinator, transport, registry, metadata, mempool, broadcasts, clock, rng, policy, status, own_signer }
    }

    /// Register another coordinator and return its operator signer.
    pub fn register_coordinator(&self, seed: u8) -> Secp256k1Signer {
        let signer = operator_signer(seed);
        self.registry.register(
            outpoint(seed, 0),
            CoordinatorEntry { id: CoordinatorId::new([seed; 32]), operator_pubkey: signer.public_key(), addr: addr(seed) },
        );
        signer
    }

    pub fn accept(&self, peer: &PeerCtx, denomination: Denomination, collateral: Transaction) {
        self.coordinator.process_message(peer, PoolWireMessage::Accept { denomination, collateral });
    }

    pub fn submit(&self, peer: &PeerCtx, entry: PoolEntry) {
        self.coordinator.process_message(peer, PoolWireMessage::Entry(entry));
    }

    pub fn sign_final(&self, peer: &PeerCtx, inputs: Vec<TxIn>) {
        self.coordinator.process_message(peer, PoolWireMessage::SignFinal(inputs));
    }

    pub fn tick(&self) {
        self.coordinator.do_maintenance();
    }

    /// The final transaction last pushed to this participant, if any.
    pub fn final_tx_for(&self, participant: &SocketAddr) -> Option<Transaction> {
        self.transport.pushed_to(participant).into_iter().rev().find_map(|message| match message {
            PoolWireMessage::FinalTx { tx, .. } => Some(tx),
            _ => None,
        })
    }

    /// Status updates pushed to this participant as `(update, message)` pairs.
    pub fn statuses_for(&self, participant: &SocketAddr) -> Vec<(mixpool_core::domain::PoolStatusUpdate, PoolMessage)> {
        self.transport
            .pushed_to(participant)
            .into_iter()
            .filter_map(|message| match message {
                PoolWireMessage::StatusUpdate(status) => Some((status.update, status.message)),
                _ => None,
            })
            .collect()
    }

    /// Completion notices pushed to this participant.
    pub fn completions_for(&self, participant: &SocketAddr) -> Vec<PoolMessage> {
        self.transport
            .pushed_to(participant)
            .into_iter()
            .filter_map(|message| match message {
                PoolWireMessage::Complete { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Sign every one of this entry's inputs the way its owner would, against
    /// the relayed final transaction.
    pub fn client_signatures(&self, entry: &PoolEntry) -> Vec<TxIn> {
        entry
            .inputs
            .iter()
            .map(|input| {
                let mut txin = input.as_tx_in();
                txin.script_sig = unlocking_script(&input.prev_script);
                txin
            })
            .collect()
    }
}
