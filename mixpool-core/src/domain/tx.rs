//! Minimal transaction model.
//!
//! The coordinator never evaluates scripts or computes chain state; it only
//! needs stable identities, canonical ordering and a wire encoding. Script
//! evaluation is delegated to the host through
//! [`ScriptVerifier`](crate::infrastructure::script::ScriptVerifier).

use crate::foundation::{Amount, Hash32, Result, TxId};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Raw script bytes. An empty script stands for "absent".
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script(pub Vec<u8>);

impl Script {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// A single spendable output on the chain: `(transaction-hash, output-index)`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: TxId,
    pub vout: u32,
}

impl OutPoint {
    pub const fn new(txid: TxId, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.txid.to_string();
        write!(f, "{}-{}", &hex[..16.min(hex.len())], self.vout)
    }
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(prevout: OutPoint) -> Self {
        Self { prevout, script_sig: Script::default(), sequence: u32::MAX }
    }
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(value: Amount, script_pubkey: Script) -> Self {
        Self { value, script_pubkey }
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Self { version: 1, inputs: Vec::new(), outputs: Vec::new(), lock_time: 0 }
    }
}

impl Transaction {
    /// Transaction ids must be deterministic across peers, so the id is taken
    /// over the canonical fixed-width encoding.
    pub fn txid(&self) -> Result<TxId> {
        let bytes = bincode::DefaultOptions::new().with_fixint_encoding().serialize(self)?;
        let hash: Hash32 = *blake3::hash(&bytes).as_bytes();
        Ok(TxId::from(hash))
    }
}

/// Canonical input ordering: lexicographic by `(prev-hash, prev-index)`.
/// Protocol-observable; clients locate their own inputs by it.
pub fn canonical_input_order(a: &TxIn, b: &TxIn) -> Ordering {
    a.prevout.cmp(&b.prevout)
}

/// Canonical output ordering: lexicographic by `(amount, locking-script)`.
pub fn canonical_output_order(a: &TxOut, b: &TxOut) -> Ordering {
    (a.value, &a.script_pubkey).cmp(&(b.value, &b.script_pubkey))
}
