//! Offender selection for the collateral controller.
//!
//! Pure selection only; the probabilistic gates and the actual forfeiture live
//! in the application layer where clock, RNG and mempool handles are available.

use crate::domain::entry::PoolEntry;
use crate::domain::tx::Transaction;

/// Seat holders that never submitted the promised entry. Matched by comparing
/// the collateral posted at admission with the collateral inside each entry.
pub fn offenders_missing_entries(collaterals: &[Transaction], entries: &[PoolEntry]) -> Vec<Transaction> {
    collaterals
        .iter()
        .filter(|collateral| !entries.iter().any(|entry| entry.collateral == **collateral))
        .cloned()
        .collect()
}

/// Participants whose entry still contains at least one unsigned input.
pub fn offenders_unsigned(entries: &[PoolEntry]) -> Vec<Transaction> {
    entries.iter().filter(|entry| entry.has_unsigned_input()).map(|entry| entry.collateral.clone()).collect()
}
