//! Protocol constants for the mixing pool.

use crate::foundation::Amount;

/// One coin in base units.
pub const COIN: Amount = 100_000_000;

/// Minimum peer protocol version accepted by the mixing pool.
pub const MIN_PROTO_VERSION: i32 = 70206;

/// Seconds a session may sit in QUEUE or ACCEPTING_ENTRIES without progress.
pub const QUEUE_TIMEOUT_SECS: i64 = 30;

/// Seconds participants get to return signatures before the session is torn down.
pub const SIGNING_TIMEOUT_SECS: i64 = 15;

/// Queue adverts older than this are expired from the registry. Also bounds how
/// far in the future an advert timestamp may lie.
pub const ADVERT_EXPIRY_SECS: i64 = QUEUE_TIMEOUT_SECS;

/// Maximum number of inputs a single participant may contribute.
pub const PARTICIPANT_MAX_INPUTS: usize = 9;

/// Upper bound of the session id range; ids are drawn uniformly from `[1, SESSION_ID_MAX]`.
pub const SESSION_ID_MAX: u32 = 999_999;

/// Fee-priority bonus applied to the merged transaction at commit time.
pub const MEMPOOL_PRIORITY_BONUS: Amount = COIN / 10;

/// Misbehavior score reported for a queue advert with a bad operator signature.
pub const MISBEHAVIOR_BAD_ADVERT_SIG: i32 = 10;
