//! Coordinator state and inbound message handling.
//!
//! One logical state machine per process. Inbound handlers take the session
//! lock for their whole duration; the advert registry has its own lock and is
//! only ever acquired without blocking, so peer-relay floods cannot stall
//! local admission.

use crate::domain::assembly::{build_pool_transaction, find_input_index};
use crate::domain::entry::PoolEntry;
use crate::domain::messages::{PoolMessage, PoolStatusUpdate, PoolWireMessage};
use crate::domain::queue::QueueAdvert;
use crate::domain::session::{MixSession, PoolPhase};
use crate::domain::tx::{OutPoint, Script, Transaction, TxIn};
use crate::foundation::{
    Denomination, SessionId, MIN_PROTO_VERSION, MISBEHAVIOR_BAD_ADVERT_SIG, PARTICIPANT_MAX_INPUTS, SESSION_ID_MAX,
};
use crate::infrastructure::clock::{Clock, PoolRng};
use crate::infrastructure::crypto::{verify_signature, OperatorSigner};
use crate::infrastructure::mempool::{BroadcastTxStore, MempoolSubmitter};
use crate::infrastructure::node::NodeStatus;
use crate::infrastructure::registry::{CoordinatorRegistry, PeerMetadata};
use crate::infrastructure::script::{ScriptVerifier, SCRIPT_VERIFY_P2SH, SCRIPT_VERIFY_STRICTENC};
use crate::infrastructure::transport::{PeerCtx, Transport};
use crate::infrastructure::validation::{InOutCheck, PoolOptions, PoolPolicy};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};

/// Everything the coordinator needs from the host process.
pub struct CoordinatorDeps {
    pub status: Arc<dyn NodeStatus>,
    pub registry: Arc<dyn CoordinatorRegistry>,
    pub metadata: Arc<dyn PeerMetadata>,
    pub mempool: Arc<dyn MempoolSubmitter>,
    pub broadcasts: Arc<dyn BroadcastTxStore>,
    pub transport: Arc<dyn Transport>,
    pub policy: Arc<dyn PoolPolicy>,
    pub script_verifier: Arc<dyn ScriptVerifier>,
    pub signer: Arc<dyn OperatorSigner>,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<dyn PoolRng>,
}

pub struct Coordinator {
    pub(crate) options: PoolOptions,
    /// The collateral outpoint this coordinator is registered under.
    pub(crate) own_outpoint: OutPoint,
    /// `None` = idle. Handlers hold this lock for their whole run.
    pub(crate) session: Mutex<Option<MixSession>>,
    /// Active adverts, own and relayed. Non-blocking access only.
    pub(crate) queue: Mutex<Vec<QueueAdvert>>,
    pub(crate) deps: CoordinatorDeps,
}

impl Coordinator {
    pub fn new(options: PoolOptions, own_outpoint: OutPoint, deps: CoordinatorDeps) -> Self {
        Self { options, own_outpoint, session: Mutex::new(None), queue: Mutex::new(Vec::new()), deps }
    }

    /// Single entry point for the four inbound message kinds. Messages from
    /// peers arrive here already decoded; anything outbound-only is dropped.
    pub fn process_message(&self, peer: &PeerCtx, message: PoolWireMessage) {
        if !self.deps.status.is_coordinator() {
            return;
        }
        if !self.deps.status.is_synced() {
            return;
        }

        match message {
            PoolWireMessage::Accept { denomination, collateral } => self.process_accept(peer, denomination, collateral),
            PoolWireMessage::Queue(advert) => self.process_queue(peer, advert),
            PoolWireMessage::Entry(entry) => self.process_entry(peer, entry),
            PoolWireMessage::SignFinal(inputs) => self.process_sign_final(peer, inputs),
            other => {
                debug!("ignoring outbound-only message command={} peer={}", other.command(), peer.id);
            }
        }
    }

    /// Version floor shared by all handlers. Emits the transport REJECT;
    /// callers add a status update where the protocol calls for one.
    fn version_ok(&self, peer: &PeerCtx, command: &str) -> bool {
        if peer.version >= MIN_PROTO_VERSION {
            return true;
        }
        debug!("{} -- peer={} using obsolete version {}", command, peer.id, peer.version);
        self.deps.transport.push_reject(peer.id, command, &format!("Version must be {MIN_PROTO_VERSION} or greater"));
        false
    }

    fn process_accept(&self, peer: &PeerCtx, denomination: Denomination, collateral: Transaction) {
        let mut slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        if !self.version_ok(peer, "dsa") {
            self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, PoolMessage::ErrVersion);
            return;
        }

        let now = self.deps.clock.now();
        if slot
            .as_ref()
            .is_some_and(|s| s.is_ready(now, self.options.min_participants, self.options.max_participants))
        {
            debug!("dsa -- queue is already full, peer={}", peer.id);
            self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, PoolMessage::ErrQueueFull);
            return;
        }

        debug!("dsa -- denomination={} peer={}", denomination, peer.id);

        let Some(own) = self.deps.registry.by_collateral(&self.own_outpoint) else {
            self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, PoolMessage::ErrMnList);
            return;
        };

        if slot.is_none() {
            {
                let Ok(queue) = self.queue.try_lock() else {
                    return;
                };
                if queue.iter().any(|advert| advert.coordinator_outpoint == self.own_outpoint) {
                    // refuse to create another queue this often
                    debug!("dsa -- last advert is still live, refusing to mix, peer={}", peer.id);
                    self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, PoolMessage::ErrRecent);
                    return;
                }
            }

            // Roughly one advertisement per fifth of the coordinator population.
            let last_seq = self.deps.metadata.last_advert_seq(&own.id);
            let threshold = last_seq + (self.deps.registry.valid_count() / 5) as i64;
            if last_seq != 0 && threshold > self.deps.metadata.advert_count() {
                debug!("dsa -- last advert too recent, must wait, peer={}", peer.id);
                self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, PoolMessage::ErrRecent);
                return;
            }
        }

        let result = if slot.is_none() {
            self.create_new_session(&mut *slot, denomination, collateral, now)
        } else {
            self.add_to_session(&mut *slot, denomination, collateral)
        };

        match result {
            Ok(code) => {
                debug!("dsa -- is compatible, please submit, peer={}", peer.id);
                self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Accepted, code);
            }
            Err(code) => {
                debug!("dsa -- not compatible with existing session, peer={}", peer.id);
                self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, code);
            }
        }
    }

    fn process_queue(&self, peer: &PeerCtx, advert: QueueAdvert) {
        if !self.version_ok(peer, "dsq") {
            return;
        }

        {
            let Ok(queue) = self.queue.try_lock() else {
                return;
            };
            for queued in queue.iter() {
                // process every advert only once
                if *queued == advert {
                    return;
                }
                if queued.ready == advert.ready && queued.coordinator_outpoint == advert.coordinator_outpoint {
                    // no way the same coordinator needs a second advert with
                    // the same readiness before the first expires
                    debug!(
                        "dsq -- peer={} is sending too many adverts for coordinator {}",
                        peer.id, advert.coordinator_outpoint
                    );
                    return;
                }
            }
        }

        debug!("dsq -- {} new", advert);

        let now = self.deps.clock.now();
        if advert.is_time_out_of_bounds(now) {
            return;
        }

        let Some(coordinator) = self.deps.registry.by_collateral(&advert.coordinator_outpoint) else {
            return;
        };

        let payload = match advert.signing_payload() {
            Ok(payload) => payload,
            Err(err) => {
                warn!("dsq -- failed to hash advert payload: {}", err);
                return;
            }
        };
        if !verify_signature(&coordinator.operator_pubkey, &payload, &advert.signature) {
            self.deps.transport.report_misbehavior(peer.id, MISBEHAVIOR_BAD_ADVERT_SIG);
            return;
        }

        if !advert.ready {
            let last_seq = self.deps.metadata.last_advert_seq(&coordinator.id);
            let threshold = last_seq + (self.deps.registry.valid_count() / 5) as i64;
            debug!(
                "dsq -- last_seq={} threshold={} advert_count={}",
                last_seq,
                threshold,
                self.deps.metadata.advert_count()
            );
            // don't allow a few nodes to dominate the queuing process
            if last_seq != 0 && threshold > self.deps.metadata.advert_count() {
                debug!("dsq -- coordinator {} is sending too many adverts", coordinator.addr);
                return;
            }
            self.deps.metadata.allow_mixing(&coordinator.id);

            info!("dsq -- new mixing queue ({}) from coordinator {}", advert, coordinator.addr);
            {
                let Ok(mut queue) = self.queue.try_lock() else {
                    return;
                };
                queue.push(advert.clone());
            }
            self.deps.transport.relay_advert(&advert);
        }
    }

    fn process_entry(&self, peer: &PeerCtx, mut entry: PoolEntry) {
        let mut slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        if !self.version_ok(peer, "dsi") {
            self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, PoolMessage::ErrVersion);
            return;
        }

        if !slot.as_ref().is_some_and(MixSession::is_accepting) {
            debug!("dsi -- session not accepting entries, peer={}", peer.id);
            self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, PoolMessage::ErrSession);
            return;
        }

        entry.addr = Some(peer.addr);
        let result = match slot.as_mut() {
            Some(session) => self.add_entry(session, entry),
            None => Err(PoolMessage::ErrSession),
        };
        match result {
            Ok(code) => {
                self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Accepted, code);
                self.check_pool(&mut *slot);
                self.relay_status(&mut *slot, PoolStatusUpdate::Accepted, PoolMessage::Noerr);
            }
            Err(code) => {
                self.push_status(&peer.addr, slot.as_ref(), PoolStatusUpdate::Rejected, code);
            }
        }
    }

    fn process_sign_final(&self, peer: &PeerCtx, inputs: Vec<TxIn>) {
        if !self.version_ok(peer, "dss") {
            return;
        }

        let mut slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        debug!("dss -- {} inputs, peer={}", inputs.len(), peer.id);

        let total = inputs.len();
        for (index, txin) in inputs.iter().enumerate() {
            if !self.add_script_sig(&mut *slot, txin) {
                let session_id = slot.as_ref().map(|s| s.id).unwrap_or(0);
                debug!("dss -- add_script_sig failed at {}/{}, session_id={}", index + 1, total, session_id);
                self.relay_status(&mut *slot, PoolStatusUpdate::Rejected, PoolMessage::Noerr);
                return;
            }
            debug!("dss -- add_script_sig {}/{} success", index + 1, total);
        }
        self.check_pool(&mut *slot);
    }

    /// A candidate is acceptable when its denomination is in the catalogue and
    /// its collateral passes the host predicate.
    fn is_acceptable(&self, denomination: Denomination, collateral: &Transaction) -> Result<(), PoolMessage> {
        if !self.deps.policy.is_valid_denomination(denomination) {
            debug!("candidate rejected: invalid denomination {}", denomination);
            return Err(PoolMessage::ErrDenom);
        }
        if !self.deps.policy.is_collateral_valid(collateral) {
            debug!("candidate rejected: collateral not valid");
            return Err(PoolMessage::ErrInvalidCollateral);
        }
        Ok(())
    }

    fn create_new_session(
        &self,
        slot: &mut Option<MixSession>,
        denomination: Denomination,
        collateral: Transaction,
        now: i64,
    ) -> Result<PoolMessage, PoolMessage> {
        self.is_acceptable(denomination, &collateral)?;

        let id = (self.deps.rng.rand_int(SESSION_ID_MAX) + 1) as SessionId;
        *slot = Some(MixSession::new(id, denomination, collateral, now));
        info!(
            "new session created session_id={} denomination={} participants=1/{}",
            id, denomination, self.options.max_participants
        );

        // broadcast that we are accepting candidates, only on the first one through
        let advert = self.signed_advert(denomination, now, false);
        self.deps.transport.relay_advert(&advert);
        if let Ok(mut queue) = self.queue.try_lock() {
            queue.push(advert);
        }

        Ok(PoolMessage::Noerr)
    }

    fn add_to_session(
        &self,
        slot: &mut Option<MixSession>,
        denomination: Denomination,
        collateral: Transaction,
    ) -> Result<PoolMessage, PoolMessage> {
        let Some(session) = slot.as_mut() else {
            return Err(PoolMessage::ErrMode);
        };
        self.is_acceptable(denomination, &collateral)?;

        // new candidates only join while the session still queues
        if !session.is_queue() {
            debug!("dsa -- incompatible mode, state={}", session.state_name());
            return Err(PoolMessage::ErrMode);
        }
        if denomination != session.denomination {
            debug!("dsa -- incompatible denomination {} != {}", denomination, session.denomination);
            return Err(PoolMessage::ErrDenom);
        }

        session.push_collateral(collateral);
        info!(
            "candidate accepted session_id={} denomination={} participants={}/{}",
            session.id,
            session.denomination,
            session.collaterals().len(),
            self.options.max_participants
        );
        Ok(PoolMessage::Noerr)
    }

    /// Add a client's inputs/outputs to the pool, or name the reason not to.
    fn add_entry(&self, session: &mut MixSession, entry: PoolEntry) -> Result<PoolMessage, PoolMessage> {
        if session.entries().len() >= session.collaterals().len() {
            debug!("add_entry -- entries are full, session_id={}", session.id);
            return Err(PoolMessage::ErrEntriesFull);
        }

        if !self.deps.policy.is_collateral_valid(&entry.collateral) {
            debug!("add_entry -- collateral not valid, session_id={}", session.id);
            return Err(PoolMessage::ErrInvalidCollateral);
        }

        if entry.inputs.len() > PARTICIPANT_MAX_INPUTS {
            debug!("add_entry -- too many inputs: {}/{}", entry.inputs.len(), PARTICIPANT_MAX_INPUTS);
            // oversized submissions are definitionally uncooperative
            self.consume_collateral(&entry.collateral);
            return Err(PoolMessage::ErrMaximum);
        }

        for input in &entry.inputs {
            for existing in session.entries() {
                if existing.inputs.iter().any(|known| known.prevout == input.prevout) {
                    debug!("add_entry -- already have input {}", input.prevout);
                    // Two peers claimed the same input. Attribution is
                    // ambiguous, someone may be spending a stranger's outpoint
                    // to force a forfeit. Do not punish.
                    return Err(PoolMessage::ErrAlreadyHave);
                }
            }
        }

        match self.deps.policy.check_inputs_outputs(session.denomination, &entry.inputs, &entry.outputs) {
            InOutCheck::Ok => {}
            InOutCheck::Invalid { code, consume_collateral } => {
                debug!("add_entry -- invalid bundle: {}", code.text());
                if consume_collateral {
                    self.consume_collateral(&entry.collateral);
                }
                return Err(code);
            }
        }

        session.push_entry(entry);
        info!("add_entry -- entry {} of {} seats, session_id={}", session.entries().len(), session.collaterals().len(), session.id);
        Ok(PoolMessage::EntriesAdded)
    }

    /// Attach one unlocking script: replay-check, verify, then write it into
    /// both the final transaction and the owning entry.
    fn add_script_sig(&self, slot: &mut Option<MixSession>, txin: &TxIn) -> bool {
        let Some(session) = slot.as_mut() else {
            return false;
        };
        if !session.is_signing() {
            debug!("add_script_sig -- not in signing phase, session_id={}", session.id);
            return false;
        }

        // byte-identical unlocking scripts are a replay, not a signature
        if session
            .entries()
            .iter()
            .any(|entry| entry.inputs.iter().any(|input| input.script_sig == txin.script_sig))
        {
            debug!("add_script_sig -- already exists, script_sig={}", txin.script_sig);
            return false;
        }

        if !self.is_input_script_sig_valid(session, txin) {
            debug!("add_script_sig -- invalid script_sig");
            return false;
        }

        let PoolPhase::Signing { entries, final_tx, .. } = &mut session.phase else {
            return false;
        };
        let Some(index) = find_input_index(final_tx, &txin.prevout) else {
            debug!("add_script_sig -- no matching input in final transaction, prevout={}", txin.prevout);
            return false;
        };
        final_tx.inputs[index].script_sig = txin.script_sig.clone();

        for entry in entries.iter_mut() {
            if entry.add_script_sig(txin) {
                debug!("add_script_sig -- attached, prevout={}", txin.prevout);
                return true;
            }
        }
        debug!("add_script_sig -- could not set signature, prevout={}", txin.prevout);
        false
    }

    /// Verify a candidate unlocking script against the transaction the pool
    /// currently holds. Amount stays 0: the script-hash rules here do not bind
    /// it, and changing it would break the hash clients signed.
    fn is_input_script_sig_valid(&self, session: &MixSession, txin: &TxIn) -> bool {
        let mut pool_tx = build_pool_transaction(session.entries());
        let Some(index) = find_input_index(&pool_tx, &txin.prevout) else {
            debug!("is_input_script_sig_valid -- no matching input in pool, prevout={}", txin.prevout);
            return false;
        };

        let mut prev_script = Script::default();
        for entry in session.entries() {
            for input in &entry.inputs {
                if input.prevout == txin.prevout {
                    prev_script = input.prev_script.clone();
                }
            }
        }

        pool_tx.inputs[index].script_sig = txin.script_sig.clone();
        let flags = SCRIPT_VERIFY_P2SH | SCRIPT_VERIFY_STRICTENC;
        if !self.deps.script_verifier.verify_input(&pool_tx, index, &txin.script_sig, &prev_script, flags, 0) {
            debug!("is_input_script_sig_valid -- verification failed on input {}", index);
            return false;
        }
        true
    }

    /// Current session id; 0 while idle.
    pub fn session_id(&self) -> SessionId {
        let slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        slot.as_ref().map(|session| session.id).unwrap_or(0)
    }

    pub fn state_id(&self) -> crate::domain::session::PoolStateId {
        let slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        slot.as_ref().map(MixSession::state_id).unwrap_or(crate::domain::session::PoolStateId::Idle)
    }

    pub fn session_denomination(&self) -> Option<Denomination> {
        let slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        slot.as_ref().map(|session| session.denomination)
    }

    /// Seats taken so far (collaterals posted).
    pub fn participant_count(&self) -> usize {
        let slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        slot.as_ref().map(|session| session.collaterals().len()).unwrap_or(0)
    }

    pub fn entries_count(&self) -> usize {
        let slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        slot.as_ref().map(|session| session.entries().len()).unwrap_or(0)
    }

    pub fn queue_size(&self) -> usize {
        self.queue.try_lock().map(|queue| queue.len()).unwrap_or(0)
    }

    /// Build and sign an advert for our own queue.
    pub(crate) fn signed_advert(&self, denomination: Denomination, now: i64, ready: bool) -> QueueAdvert {
        let mut advert = QueueAdvert::new(denomination, self.own_outpoint, now, ready);
        match advert.signing_payload().and_then(|payload| self.deps.signer.sign(&payload)) {
            Ok(signature) => advert.signature = signature,
            Err(err) => warn!("failed to sign queue advert: {}", err),
        }
        advert
    }
}
