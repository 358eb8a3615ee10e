//! Chain-tip coordinator registry and per-coordinator mixing metadata.
//!
//! The registry itself is maintained by the host's chain machinery; the pool
//! only reads it. The metadata store tracks how recently each coordinator
//! opened a queue, which gates the fair-use advertisement ratio.

use crate::domain::tx::OutPoint;
use crate::foundation::CoordinatorId;
use secp256k1::PublicKey;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

#[derive(Clone, Debug)]
pub struct CoordinatorEntry {
    pub id: CoordinatorId,
    pub operator_pubkey: PublicKey,
    pub addr: SocketAddr,
}

/// The set of currently valid coordinators, resolved by collateral outpoint.
pub trait CoordinatorRegistry: Send + Sync {
    fn by_collateral(&self, outpoint: &OutPoint) -> Option<CoordinatorEntry>;
    fn valid_count(&self) -> usize;
}

/// Network-wide advertisement accounting.
pub trait PeerMetadata: Send + Sync {
    /// Value of the global counter when this coordinator last opened a queue;
    /// 0 if it never has.
    fn last_advert_seq(&self, id: &CoordinatorId) -> i64;

    /// Monotonic network-wide count of observed queue openings.
    fn advert_count(&self) -> i64;

    /// Record that this coordinator opened a queue: stamps its sequence number
    /// and bumps the global counter.
    fn allow_mixing(&self, id: &CoordinatorId);
}

#[derive(Default)]
pub struct MemoryRegistry {
    by_collateral: Mutex<HashMap<OutPoint, CoordinatorEntry>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, outpoint: OutPoint, entry: CoordinatorEntry) {
        let mut map = self.by_collateral.lock().unwrap_or_else(|err| err.into_inner());
        map.insert(outpoint, entry);
    }

    pub fn deregister(&self, outpoint: &OutPoint) {
        let mut map = self.by_collateral.lock().unwrap_or_else(|err| err.into_inner());
        map.remove(outpoint);
    }
}

impl CoordinatorRegistry for MemoryRegistry {
    fn by_collateral(&self, outpoint: &OutPoint) -> Option<CoordinatorEntry> {
        let map = self.by_collateral.lock().unwrap_or_else(|err| err.into_inner());
        map.get(outpoint).cloned()
    }

    fn valid_count(&self) -> usize {
        let map = self.by_collateral.lock().unwrap_or_else(|err| err.into_inner());
        map.len()
    }
}

#[derive(Default)]
pub struct MemoryPeerMetadata {
    last_seq: Mutex<HashMap<CoordinatorId, i64>>,
    counter: AtomicI64,
}

impl MemoryPeerMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/bootstrap hook: force a coordinator's recorded sequence number.
    pub fn set_last_advert_seq(&self, id: CoordinatorId, seq: i64) {
        let mut map = self.last_seq.lock().unwrap_or_else(|err| err.into_inner());
        map.insert(id, seq);
    }

    pub fn set_advert_count(&self, count: i64) {
        self.counter.store(count, Ordering::SeqCst);
    }
}

impl PeerMetadata for MemoryPeerMetadata {
    fn last_advert_seq(&self, id: &CoordinatorId) -> i64 {
        let map = self.last_seq.lock().unwrap_or_else(|err| err.into_inner());
        map.get(id).copied().unwrap_or(0)
    }

    fn advert_count(&self) -> i64 {
        self.counter.load(Ordering::SeqCst)
    }

    fn allow_mixing(&self, id: &CoordinatorId) {
        let mut map = self.last_seq.lock().unwrap_or_else(|err| err.into_inner());
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        map.insert(*id, seq);
    }
}
