//! Session lifecycle: phase promotion, final-transaction assembly, commit,
//! the collateral controller and the periodic maintenance tick.

use crate::application::coordinator::Coordinator;
use crate::domain::assembly::build_final_transaction;
use crate::domain::entry::signatures_complete;
use crate::domain::fees::{offenders_missing_entries, offenders_unsigned};
use crate::domain::messages::{MixBroadcastTx, PoolMessage};
use crate::domain::session::{MixSession, PoolPhase, PoolStateId};
use crate::domain::tx::Transaction;
use crate::foundation::MEMPOOL_PRIORITY_BONUS;
use log::{debug, info, warn};
use serde_json::json;

impl Coordinator {
    /// Caller-driven tick; once per second is adequate. Does nothing unless
    /// coordinator mode, chain sync and non-shutdown all hold.
    pub fn do_maintenance(&self) {
        if !self.deps.status.is_coordinator() {
            return;
        }
        if !self.deps.status.is_synced() || self.deps.status.is_shutting_down() {
            return;
        }

        {
            let mut slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
            self.check_for_complete_queue(&mut slot);
            self.check_pool(&mut slot);
            self.check_timeout(&mut slot);
        }
        self.expire_stale_adverts();
    }

    /// QUEUE -> ACCEPTING_ENTRIES once the session is ready; seals the queue
    /// with a signed `ready=true` advert so seat holders submit their entries.
    pub(crate) fn check_for_complete_queue(&self, slot: &mut Option<MixSession>) {
        let now = self.deps.clock.now();
        let Some(session) = slot.as_mut() else {
            return;
        };
        if session.is_queue() && session.is_ready(now, self.options.min_participants, self.options.max_participants) {
            session.begin_accepting(now);

            let advert = self.signed_advert(session.denomination, now, true);
            info!(
                "queue is ready, signing and relaying ({}) with {} participants",
                advert,
                session.collaterals().len()
            );
            self.deps.transport.relay_advert(&advert);
        }
    }

    /// Advance the session across phase boundaries when events or timers
    /// demand it.
    pub(crate) fn check_pool(&self, slot: &mut Option<MixSession>) {
        let now = self.deps.clock.now();
        let (seats_filled, timed_out_with_quorum, signing_done) = match slot.as_ref() {
            None => return,
            Some(session) => {
                debug!("check_pool -- state={} entries={}", session.state_name(), session.entries().len());
                (
                    session.is_accepting() && session.entries().len() == session.collaterals().len(),
                    session.is_accepting()
                        && session.has_timed_out(now)
                        && session.entries().len() >= self.options.min_participants,
                    session.is_signing() && signatures_complete(session.entries()),
                )
            }
        };

        // every seat submitted an entry: merge
        if seats_filled {
            self.create_final_transaction(slot, now);
            return;
        }

        // timed out while accepting with quorum: punish the absentees, then
        // complete the session without them
        if timed_out_with_quorum {
            if let Some(session) = slot.as_ref() {
                self.charge_fees(session);
            }
            self.create_final_transaction(slot, now);
            return;
        }

        if signing_done {
            info!("check_pool -- all inputs signed, committing");
            self.commit_final_transaction(slot);
        }
    }

    fn create_final_transaction(&self, slot: &mut Option<MixSession>, now: i64) {
        let Some(session) = slot.as_mut() else {
            return;
        };
        let final_tx = build_final_transaction(session.entries());
        info!(
            "create_final_transaction -- {} inputs / {} outputs, session_id={}",
            final_tx.inputs.len(),
            final_tx.outputs.len(),
            session.id
        );
        if !session.begin_signing(final_tx.clone(), now) {
            return;
        }
        self.relay_final_transaction(slot, &final_tx);
    }

    fn commit_final_transaction(&self, slot: &mut Option<MixSession>) {
        let Some(session) = slot.as_ref() else {
            return;
        };
        let PoolPhase::Signing { final_tx, .. } = &session.phase else {
            return;
        };
        let final_tx = final_tx.clone();

        // The per-input signed flags drove us here; re-verify the assembled
        // transaction end-to-end before handing it to the mempool.
        if !self.verify_final_transaction(session, &final_tx) {
            warn!("commit_final_transaction -- assembled transaction failed re-verification");
            self.relay_completed_transaction(slot, PoolMessage::ErrInvalidTx);
            *slot = None;
            return;
        }

        let txid = match final_tx.txid() {
            Ok(txid) => txid,
            Err(err) => {
                warn!("commit_final_transaction -- failed to hash final transaction: {}", err);
                self.relay_completed_transaction(slot, PoolMessage::ErrInvalidTx);
                *slot = None;
                return;
            }
        };

        self.deps.mempool.prioritise(txid, MEMPOOL_PRIORITY_BONUS);
        if let Err(err) = self.deps.mempool.try_accept(&final_tx) {
            warn!("commit_final_transaction -- not accepted: {}", err);
            // not much we can do in this case, just notify clients
            self.relay_completed_transaction(slot, PoolMessage::ErrInvalidTx);
            *slot = None;
            return;
        }

        let Some(session) = slot.as_ref() else {
            return;
        };
        let collaterals = session.collaterals().to_vec();

        // create and sign the coordinator broadcast, unless already known
        if !self.deps.broadcasts.contains(&txid) {
            let now = self.deps.clock.now();
            let mut broadcast = MixBroadcastTx::new(final_tx, self.own_outpoint, now);
            match broadcast.signing_payload().and_then(|payload| self.deps.signer.sign(&payload)) {
                Ok(signature) => broadcast.signature = signature,
                Err(err) => warn!("commit_final_transaction -- failed to sign broadcast: {}", err),
            }
            self.deps.broadcasts.insert(txid, broadcast);
        }

        debug!("commit_final_transaction -- transmitting broadcast, txid={:#x}", txid);
        self.deps.transport.relay_inventory(txid);

        self.relay_completed_transaction(slot, PoolMessage::Success);
        self.charge_random_fees(&collaterals);

        info!("commit_final_transaction -- completed, resetting");
        *slot = None;
    }

    fn verify_final_transaction(&self, session: &MixSession, final_tx: &Transaction) -> bool {
        use crate::infrastructure::script::{SCRIPT_VERIFY_P2SH, SCRIPT_VERIFY_STRICTENC};

        for (index, input) in final_tx.inputs.iter().enumerate() {
            let mut prev_script = None;
            for entry in session.entries() {
                for known in &entry.inputs {
                    if known.prevout == input.prevout {
                        prev_script = Some(known.prev_script.clone());
                    }
                }
            }
            let Some(prev_script) = prev_script else {
                return false;
            };
            let flags = SCRIPT_VERIFY_P2SH | SCRIPT_VERIFY_STRICTENC;
            if !self.deps.script_verifier.verify_input(final_tx, index, &input.script_sig, &prev_script, flags, 0) {
                return false;
            }
        }
        true
    }

    /// Charge collateral against uncooperative participants.
    ///
    /// The submission and signing stages are completely separate; a client
    /// that submits and then refuses to sign must pay something, or it could
    /// stall mixing forever at no cost.
    pub(crate) fn charge_fees(&self, session: &MixSession) {
        // no need to charge collateral for every offence
        if self.deps.rng.rand_int(100) > 33 {
            return;
        }

        let mut offenders = match &session.phase {
            PoolPhase::Accepting { collaterals, entries } => offenders_missing_entries(collaterals, entries),
            PoolPhase::Signing { entries, .. } => offenders_unsigned(entries),
            PoolPhase::Queue { .. } => Vec::new(),
        };

        if offenders.is_empty() {
            return;
        }

        let seats = session.collaterals().len();
        // mostly offending? charge sometimes
        if offenders.len() + 1 >= seats && self.deps.rng.rand_int(100) > 33 {
            return;
        }
        // everyone an offender? that's not right, the fault is likely ours
        if offenders.len() >= seats {
            return;
        }

        self.deps.rng.shuffle_txs(&mut offenders);
        warn!(
            "charge_fees -- found uncooperative participant (didn't {}), charging collateral",
            if session.is_signing() { "sign" } else { "send" }
        );
        self.consume_collateral(&offenders[0]);
    }

    /// Mixing carries no explicit fee; miners get paid by charging a random
    /// 1-in-10 collateral after each successful session.
    pub(crate) fn charge_random_fees(&self, collaterals: &[Transaction]) {
        for collateral in collaterals {
            if self.deps.rng.rand_int(100) > 10 {
                return;
            }
            info!("charge_random_fees -- charging random collateral");
            self.consume_collateral(collateral);
        }
    }

    pub(crate) fn consume_collateral(&self, collateral: &Transaction) {
        match self.deps.mempool.try_accept(collateral) {
            Ok(()) => {
                self.deps.transport.relay_transaction(collateral);
                debug!("consume_collateral -- collateral consumed");
            }
            Err(err) => {
                // most likely the bond was already spent
                debug!("consume_collateral -- not accepted: {}", err);
            }
        }
    }

    pub(crate) fn check_timeout(&self, slot: &mut Option<MixSession>) {
        let now = self.deps.clock.now();
        let timed_out = match slot.as_ref() {
            None => return,
            Some(session) => session.has_timed_out(now),
        };
        if !timed_out {
            return;
        }

        if let Some(session) = slot.as_ref() {
            warn!(
                "check_timeout -- {} timed out, resetting, session_id={}",
                if session.is_signing() { "signing" } else { "session" },
                session.id
            );
            self.charge_fees(session);
        }
        *slot = None;
    }

    /// Drop queue adverts past their lifetime. Non-blocking; a contended lock
    /// just means we expire on a later tick.
    pub(crate) fn expire_stale_adverts(&self) {
        let now = self.deps.clock.now();
        let Ok(mut queue) = self.queue.try_lock() else {
            return;
        };
        let before = queue.len();
        queue.retain(|advert| !advert.is_expired(now));
        if queue.len() != before {
            debug!("expire_stale_adverts -- dropped {} adverts", before - queue.len());
        }
    }

    /// Introspection snapshot for the host's RPC surface.
    pub fn json_info(&self) -> serde_json::Value {
        let queue_size = self.queue.try_lock().map(|queue| queue.len()).unwrap_or(0);
        let slot = self.session.lock().unwrap_or_else(|err| err.into_inner());
        json!({
            "queue_size": queue_size,
            "denomination": slot.as_ref().map(|s| s.denomination.0).unwrap_or(0),
            "state": slot.as_ref().map(|s| s.state_name()).unwrap_or(PoolStateId::Idle.name()),
            "entries_count": slot.as_ref().map(|s| s.entries().len()).unwrap_or(0),
        })
    }
}
