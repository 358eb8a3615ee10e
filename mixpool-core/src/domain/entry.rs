//! One participant's contribution to a session: inputs, outputs and the
//! collateral bond held against misbehavior.

use crate::domain::tx::{OutPoint, Script, Transaction, TxIn, TxOut};
use crate::foundation::Amount;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// A mixing input. The locking script is carried alongside the outpoint so the
/// coordinator can verify unlocking scripts without chain lookups.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PoolInput {
    pub prevout: OutPoint,
    pub prev_script: Script,
    pub script_sig: Script,
    pub sequence: u32,
    /// Set once a valid unlocking script has been attached. Server-side only.
    #[serde(skip)]
    pub has_sig: bool,
}

impl PoolInput {
    pub fn new(prevout: OutPoint, prev_script: Script) -> Self {
        Self { prevout, prev_script, script_sig: Script::default(), sequence: u32::MAX, has_sig: false }
    }

    pub fn as_tx_in(&self) -> TxIn {
        TxIn { prevout: self.prevout, script_sig: self.script_sig.clone(), sequence: self.sequence }
    }
}

/// A mixing output. The amount must equal the session denomination.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PoolOutput {
    pub value: Amount,
    pub script_pubkey: Script,
}

impl PoolOutput {
    pub fn new(value: Amount, script_pubkey: Script) -> Self {
        Self { value, script_pubkey }
    }

    pub fn as_tx_out(&self) -> TxOut {
        TxOut { value: self.value, script_pubkey: self.script_pubkey.clone() }
    }
}

/// A client's transaction bundle in the mixing pool. The submitting peer's
/// address is attached by the coordinator and never travels on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub inputs: Vec<PoolInput>,
    pub collateral: Transaction,
    pub outputs: Vec<PoolOutput>,
    #[serde(skip)]
    pub addr: Option<SocketAddr>,
}

impl PoolEntry {
    pub fn new(inputs: Vec<PoolInput>, outputs: Vec<PoolOutput>, collateral: Transaction) -> Self {
        Self { inputs, collateral, outputs, addr: None }
    }

    /// Attach an unlocking script to the input matching `txin`'s outpoint.
    /// Returns false if no input matches.
    pub fn add_script_sig(&mut self, txin: &TxIn) -> bool {
        for input in &mut self.inputs {
            if input.prevout == txin.prevout {
                input.script_sig = txin.script_sig.clone();
                input.has_sig = true;
                return true;
            }
        }
        false
    }

    pub fn has_unsigned_input(&self) -> bool {
        self.inputs.iter().any(|input| !input.has_sig)
    }
}

/// True once every input of every entry carries a verified unlocking script.
pub fn signatures_complete(entries: &[PoolEntry]) -> bool {
    entries.iter().all(|entry| entry.inputs.iter().all(|input| input.has_sig))
}
