//! Merging accepted entries into the final transaction.

use crate::domain::entry::PoolEntry;
use crate::domain::tx::{canonical_input_order, canonical_output_order, OutPoint, Transaction};

/// Concatenate all entries and sort into the canonical ordering clients rely
/// on to locate their own inputs.
pub fn build_final_transaction(entries: &[PoolEntry]) -> Transaction {
    let mut tx = build_pool_transaction(entries);
    tx.inputs.sort_by(canonical_input_order);
    tx.outputs.sort_by(canonical_output_order);
    tx
}

/// The pool contents as a transaction in entry-arrival order, unlocking
/// scripts included as currently attached. This is the transaction unlocking
/// scripts are verified against.
pub fn build_pool_transaction(entries: &[PoolEntry]) -> Transaction {
    let mut tx = Transaction::default();
    for entry in entries {
        for output in &entry.outputs {
            tx.outputs.push(output.as_tx_out());
        }
        for input in &entry.inputs {
            tx.inputs.push(input.as_tx_in());
        }
    }
    tx
}

pub fn find_input_index(tx: &Transaction, prevout: &OutPoint) -> Option<usize> {
    tx.inputs.iter().position(|input| input.prevout == *prevout)
}
