//! Pure protocol logic (no I/O): transaction model, pool entries, queue
//! adverts, session state machine, offender selection, final-tx assembly.

pub mod assembly;
pub mod entry;
pub mod fees;
pub mod messages;
pub mod queue;
pub mod session;
pub mod tx;

pub use entry::{PoolEntry, PoolInput, PoolOutput};
pub use messages::{MixBroadcastTx, PoolMessage, PoolStatusUpdate, PoolWireMessage, StatusUpdate};
pub use queue::QueueAdvert;
pub use session::{MixSession, PoolPhase, PoolStateId};
pub use tx::{OutPoint, Script, Transaction, TxIn, TxOut};
