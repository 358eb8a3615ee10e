//! Mempool acceptance and the coordinator-broadcast store.

use crate::domain::messages::MixBroadcastTx;
use crate::domain::tx::Transaction;
use crate::foundation::{Amount, TxId};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MempoolError {
    /// The mempool lock could not be taken without blocking. Callers treat
    /// this the same as a rejection and retry on a later session.
    #[error("mempool busy")]
    Busy,

    #[error("transaction rejected: {0}")]
    Rejected(String),
}

pub trait MempoolSubmitter: Send + Sync {
    fn prioritise(&self, txid: TxId, fee_bonus: Amount);

    /// Non-blocking submission; never stalls a protocol handler.
    fn try_accept(&self, tx: &Transaction) -> std::result::Result<(), MempoolError>;
}

/// Store of signed mixed-transaction broadcasts (`dstx`), keyed by txid.
pub trait BroadcastTxStore: Send + Sync {
    fn contains(&self, txid: &TxId) -> bool;
    fn insert(&self, txid: TxId, broadcast: MixBroadcastTx);
}

#[derive(Default)]
pub struct MemoryMempool {
    accepted: Mutex<Vec<Transaction>>,
    priorities: Mutex<HashMap<TxId, Amount>>,
    reject_with: Mutex<Option<String>>,
    busy: Mutex<bool>,
}

impl MemoryMempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> Vec<Transaction> {
        self.accepted.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }

    pub fn priority_of(&self, txid: &TxId) -> Option<Amount> {
        self.priorities.lock().unwrap_or_else(|err| err.into_inner()).get(txid).copied()
    }

    /// Make every following submission fail with the given reason.
    pub fn reject_all(&self, reason: impl Into<String>) {
        *self.reject_with.lock().unwrap_or_else(|err| err.into_inner()) = Some(reason.into());
    }

    pub fn set_busy(&self, busy: bool) {
        *self.busy.lock().unwrap_or_else(|err| err.into_inner()) = busy;
    }
}

impl MempoolSubmitter for MemoryMempool {
    fn prioritise(&self, txid: TxId, fee_bonus: Amount) {
        self.priorities.lock().unwrap_or_else(|err| err.into_inner()).insert(txid, fee_bonus);
    }

    fn try_accept(&self, tx: &Transaction) -> std::result::Result<(), MempoolError> {
        if *self.busy.lock().unwrap_or_else(|err| err.into_inner()) {
            return Err(MempoolError::Busy);
        }
        if let Some(reason) = self.reject_with.lock().unwrap_or_else(|err| err.into_inner()).clone() {
            return Err(MempoolError::Rejected(reason));
        }
        self.accepted.lock().unwrap_or_else(|err| err.into_inner()).push(tx.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBroadcastStore {
    broadcasts: Mutex<HashMap<TxId, MixBroadcastTx>>,
}

impl MemoryBroadcastStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, txid: &TxId) -> Option<MixBroadcastTx> {
        self.broadcasts.lock().unwrap_or_else(|err| err.into_inner()).get(txid).cloned()
    }
}

impl BroadcastTxStore for MemoryBroadcastStore {
    fn contains(&self, txid: &TxId) -> bool {
        self.broadcasts.lock().unwrap_or_else(|err| err.into_inner()).contains_key(txid)
    }

    fn insert(&self, txid: TxId, broadcast: MixBroadcastTx) {
        self.broadcasts.lock().unwrap_or_else(|err| err.into_inner()).insert(txid, broadcast);
    }
}
