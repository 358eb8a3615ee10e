pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{PoolError, Result};
pub use types::{Amount, CoordinatorId, Denomination, Hash32, SessionId, TxId};
