//! Participant-facing pushes: status updates, the unsigned merged transaction
//! and the completion notice.

use crate::application::coordinator::Coordinator;
use crate::domain::messages::{PoolMessage, PoolStatusUpdate, PoolWireMessage, StatusUpdate};
use crate::domain::session::{MixSession, PoolStateId};
use crate::domain::tx::Transaction;
use log::{debug, warn};
use std::net::SocketAddr;

impl Coordinator {
    /// Unicast a `(session_id, phase, 0, update, reason)` tuple. Returns false
    /// when the peer is no longer reachable.
    pub(crate) fn push_status(
        &self,
        addr: &SocketAddr,
        session: Option<&MixSession>,
        update: PoolStatusUpdate,
        message: PoolMessage,
    ) -> bool {
        let status = StatusUpdate {
            session_id: session.map(|s| s.id).unwrap_or(0),
            state: session.map(MixSession::state_id).unwrap_or(PoolStateId::Idle),
            entries_count: 0,
            update,
            message,
        };
        self.deps.transport.push_message(addr, &PoolWireMessage::StatusUpdate(status))
    }

    /// Push a status to every participant. If anyone is unreachable the
    /// session cannot complete, so the rest are told it is over; if everyone
    /// is unreachable the fault is on our side and the pool resets without
    /// charging anyone.
    pub(crate) fn relay_status(&self, slot: &mut Option<MixSession>, update: PoolStatusUpdate, message: PoolMessage) {
        let addrs: Vec<SocketAddr> = match slot.as_ref() {
            None => return,
            Some(session) => session.entries().iter().filter_map(|entry| entry.addr).collect(),
        };

        let mut disconnected = 0usize;
        if let Some(session) = slot.as_ref() {
            for addr in &addrs {
                if !self.push_status(addr, Some(session), update, message) {
                    disconnected += 1;
                }
            }
        }
        if disconnected == 0 {
            return;
        }

        if let Some(session) = slot.as_ref() {
            warn!(
                "relay_status -- can't continue, {} client(s) disconnected, session_id={} denomination={}",
                disconnected, session.id, session.denomination
            );
            // notify everyone else that this session is terminated
            for addr in &addrs {
                self.push_status(addr, Some(session), PoolStatusUpdate::Rejected, PoolMessage::Noerr);
            }
        }

        if disconnected == addrs.len() {
            // every client gone at once points at our own connectivity, not
            // theirs; reset without charging fees
            *slot = None;
        }
    }

    /// Unicast the unsigned merged transaction to every participant.
    pub(crate) fn relay_final_transaction(&self, slot: &mut Option<MixSession>, final_tx: &Transaction) {
        let (session_id, denomination, addrs) = match slot.as_ref() {
            None => return,
            Some(session) => (
                session.id,
                session.denomination,
                session.entries().iter().filter_map(|entry| entry.addr).collect::<Vec<_>>(),
            ),
        };
        debug!("relay_final_transaction -- session_id={} denomination={}", session_id, denomination);

        let message = PoolWireMessage::FinalTx { session_id, tx: final_tx.clone() };
        for addr in &addrs {
            if !self.deps.transport.push_message(addr, &message) {
                // no such node? the client disconnected or our own connection went down
                self.relay_status(slot, PoolStatusUpdate::Rejected, PoolMessage::Noerr);
                return;
            }
        }
    }

    /// Unicast the session outcome to every participant.
    pub(crate) fn relay_completed_transaction(&self, slot: &mut Option<MixSession>, message: PoolMessage) {
        let (session_id, addrs) = match slot.as_ref() {
            None => return,
            Some(session) => {
                (session.id, session.entries().iter().filter_map(|entry| entry.addr).collect::<Vec<_>>())
            }
        };
        debug!("relay_completed_transaction -- session_id={} message={}", session_id, message.text());

        let wire = PoolWireMessage::Complete { session_id, message };
        for addr in &addrs {
            if !self.deps.transport.push_message(addr, &wire) {
                self.relay_status(slot, PoolStatusUpdate::Rejected, PoolMessage::Noerr);
                return;
            }
        }
    }
}
