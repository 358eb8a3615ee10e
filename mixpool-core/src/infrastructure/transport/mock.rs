//! Recording transport for tests and embedding.

use crate::domain::messages::PoolWireMessage;
use crate::domain::queue::QueueAdvert;
use crate::domain::tx::Transaction;
use crate::foundation::TxId;
use crate::infrastructure::transport::Transport;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockTransport {
    pushed: Mutex<Vec<(SocketAddr, PoolWireMessage)>>,
    rejects: Mutex<Vec<(u64, String, String)>>,
    misbehavior: Mutex<Vec<(u64, i32)>>,
    relayed_adverts: Mutex<Vec<QueueAdvert>>,
    relayed_inventory: Mutex<Vec<TxId>>,
    relayed_txs: Mutex<Vec<Transaction>>,
    disconnected: Mutex<HashSet<SocketAddr>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make pushes to this address fail, as if the peer dropped off.
    pub fn disconnect(&self, addr: SocketAddr) {
        self.disconnected.lock().unwrap_or_else(|err| err.into_inner()).insert(addr);
    }

    pub fn reconnect(&self, addr: SocketAddr) {
        self.disconnected.lock().unwrap_or_else(|err| err.into_inner()).remove(&addr);
    }

    pub fn pushed(&self) -> Vec<(SocketAddr, PoolWireMessage)> {
        self.pushed.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    pub fn pushed_to(&self, addr: &SocketAddr) -> Vec<PoolWireMessage> {
        self.pushed
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .iter()
            .filter(|(to, _)| to == addr)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn rejects(&self) -> Vec<(u64, String, String)> {
        self.rejects.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    pub fn misbehavior_reports(&self) -> Vec<(u64, i32)> {
        self.misbehavior.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    pub fn relayed_adverts(&self) -> Vec<QueueAdvert> {
        self.relayed_adverts.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    pub fn relayed_inventory(&self) -> Vec<TxId> {
        self.relayed_inventory.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    pub fn relayed_txs(&self) -> Vec<Transaction> {
        self.relayed_txs.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.pushed.lock().unwrap_or_else(|err| err.into_inner()).clear();
        self.rejects.lock().unwrap_or_else(|err| err.into_inner()).clear();
        self.misbehavior.lock().unwrap_or_else(|err| err.into_inner()).clear();
        self.relayed_adverts.lock().unwrap_or_else(|err| err.into_inner()).clear();
        self.relayed_inventory.lock().unwrap_or_else(|err| err.into_inner()).clear();
        self.relayed_txs.lock().unwrap_or_else(|err| err.into_inner()).clear();
    }
}

impl Transport for MockTransport {
    fn push_message(&self, addr: &SocketAddr, message: &PoolWireMessage) -> bool {
        if self.disconnected.lock().unwrap_or_else(|err| err.into_inner()).contains(addr) {
            return false;
        }
        self.pushed.lock().unwrap_or_else(|err| err.into_inner()).push((*addr, message.clone()));
        true
    }

    fn push_reject(&self, peer_id: u64, command: &str, reason: &str) {
        self.rejects
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push((peer_id, command.to_string(), reason.to_string()));
    }

    fn report_misbehavior(&self, peer_id: u64, score: i32) {
        self.misbehavior.lock().unwrap_or_else(|err| err.into_inner()).push((peer_id, score));
    }

    fn relay_advert(&self, advert: &QueueAdvert) {
        self.relayed_adverts.lock().unwrap_or_else(|err| err.into_inner()).push(advert.clone());
    }

    fn relay_inventory(&self, txid: TxId) {
        self.relayed_inventory.lock().unwrap_or_else(|err| err.into_inner()).push(txid);
    }

    fn relay_transaction(&self, tx: &Transaction) {
        self.relayed_txs.lock().unwrap_or_else(|err| err.into_inner()).push(tx.clone());
    }
}
