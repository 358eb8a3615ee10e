//! Collaborator interfaces and their in-process implementations. Everything
//! the coordinator needs from the host — chain registry, mempool, transport,
//! clock, randomness, crypto — enters through these traits.

pub mod clock;
pub mod crypto;
pub mod logging;
pub mod mempool;
pub mod node;
pub mod registry;
pub mod script;
pub mod transport;
pub mod validation;

pub use clock::{Clock, PoolRng, SystemClock, SystemRng};
pub use crypto::{verify_signature, OperatorSigner, Secp256k1Signer};
pub use mempool::{BroadcastTxStore, MemoryBroadcastStore, MemoryMempool, MempoolError, MempoolSubmitter};
pub use node::NodeStatus;
pub use registry::{CoordinatorEntry, CoordinatorRegistry, MemoryPeerMetadata, MemoryRegistry, PeerMetadata};
pub use script::{ScriptVerifier, SCRIPT_VERIFY_P2SH, SCRIPT_VERIFY_STRICTENC};
pub use transport::{PeerCtx, Transport};
pub use validation::{InOutCheck, PoolOptions, PoolPolicy};
