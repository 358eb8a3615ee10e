//! Script-system bridge.

use crate::domain::tx::{Script, Transaction};
use crate::foundation::Amount;

pub const SCRIPT_VERIFY_P2SH: u32 = 1 << 0;
pub const SCRIPT_VERIFY_STRICTENC: u32 = 1 << 1;

/// Verifies that an unlocking script satisfies a locking script in the context
/// of the given transaction and input position. The pool always passes
/// amount 0: the script-hashing rules here do not bind the input amount, and
/// changing it would change the signature hash clients committed to.
pub trait ScriptVerifier: Send + Sync {
    fn verify_input(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_sig: &Script,
        script_pubkey: &Script,
        flags: u32,
        amount: Amount,
    ) -> bool;
}
