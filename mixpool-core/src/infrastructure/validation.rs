//! Host-owned validity rules and injected chain parameters.

use crate::domain::entry::{PoolInput, PoolOutput};
use crate::domain::messages::PoolMessage;
use crate::domain::tx::Transaction;
use crate::foundation::Denomination;
use serde::Deserialize;

/// Outcome of the shared input/output validity predicate. On failure the
/// predicate names the reason code and whether the submitter's collateral
/// should be forfeited.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InOutCheck {
    Ok,
    Invalid { code: PoolMessage, consume_collateral: bool },
}

/// Denomination catalogue, collateral validity and bundle validity, all
/// delegated to the host (their precise rules live with the chain).
pub trait PoolPolicy: Send + Sync {
    fn is_valid_denomination(&self, denomination: Denomination) -> bool;
    fn is_collateral_valid(&self, collateral: &Transaction) -> bool;
    fn check_inputs_outputs(
        &self,
        denomination: Denomination,
        inputs: &[PoolInput],
        outputs: &[PoolOutput],
    ) -> InOutCheck;
}

/// Chain parameters the pool treats as injected constants.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    pub min_participants: usize,
    pub max_participants: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self { min_participants: 3, max_participants: 5 }
    }
}
