//! The mixing session and its phase data.
//!
//! A session only exists while mixing is in progress; the coordinator holds
//! `Option<MixSession>` and `None` is the idle state. Each phase carries
//! exactly the data valid in that phase, so "idle implies empty" needs no
//! runtime checks.

use crate::domain::entry::PoolEntry;
use crate::domain::tx::Transaction;
use crate::foundation::{Denomination, SessionId, QUEUE_TIMEOUT_SECS, SIGNING_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};

/// Numeric phase ids as seen on the wire. `Error` and `Success` are client-side
/// phases; the coordinator never enters them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(i32)]
pub enum PoolStateId {
    Idle = 0,
    Queue = 1,
    AcceptingEntries = 2,
    Signing = 3,
    Error = 4,
    Success = 5,
}

impl PoolStateId {
    pub fn name(&self) -> &'static str {
        match self {
            PoolStateId::Idle => "idle",
            PoolStateId::Queue => "queue",
            PoolStateId::AcceptingEntries => "accepting-entries",
            PoolStateId::Signing => "signing",
            PoolStateId::Error => "error",
            PoolStateId::Success => "success",
        }
    }
}

#[derive(Clone, Debug)]
pub enum PoolPhase {
    /// Collecting collateral-backed candidates until quorum or timeout.
    Queue { collaterals: Vec<Transaction> },
    /// Sealed; seat holders submit their entries.
    Accepting { collaterals: Vec<Transaction>, entries: Vec<PoolEntry> },
    /// Merged transaction out for signing.
    Signing { collaterals: Vec<Transaction>, entries: Vec<PoolEntry>, final_tx: Transaction },
}

#[derive(Clone, Debug)]
pub struct MixSession {
    pub id: SessionId,
    pub denomination: Denomination,
    /// Timestamp of the last successful phase step, in whole seconds.
    pub last_progress_at: i64,
    pub phase: PoolPhase,
}

impl MixSession {
    /// A session is born in QUEUE on its first acceptable candidate.
    pub fn new(id: SessionId, denomination: Denomination, collateral: Transaction, now: i64) -> Self {
        Self { id, denomination, last_progress_at: now, phase: PoolPhase::Queue { collaterals: vec![collateral] } }
    }

    pub fn state_id(&self) -> PoolStateId {
        match self.phase {
            PoolPhase::Queue { .. } => PoolStateId::Queue,
            PoolPhase::Accepting { .. } => PoolStateId::AcceptingEntries,
            PoolPhase::Signing { .. } => PoolStateId::Signing,
        }
    }

    pub fn state_name(&self) -> &'static str {
        self.state_id().name()
    }

    pub fn collaterals(&self) -> &[Transaction] {
        match &self.phase {
            PoolPhase::Queue { collaterals }
            | PoolPhase::Accepting { collaterals, .. }
            | PoolPhase::Signing { collaterals, .. } => collaterals,
        }
    }

    pub fn entries(&self) -> &[PoolEntry] {
        match &self.phase {
            PoolPhase::Queue { .. } => &[],
            PoolPhase::Accepting { entries, .. } | PoolPhase::Signing { entries, .. } => entries,
        }
    }

    pub fn entries_mut(&mut self) -> &mut [PoolEntry] {
        match &mut self.phase {
            PoolPhase::Queue { .. } => &mut [],
            PoolPhase::Accepting { entries, .. } | PoolPhase::Signing { entries, .. } => entries,
        }
    }

    pub fn is_queue(&self) -> bool {
        matches!(self.phase, PoolPhase::Queue { .. })
    }

    pub fn is_accepting(&self) -> bool {
        matches!(self.phase, PoolPhase::Accepting { .. })
    }

    pub fn is_signing(&self) -> bool {
        matches!(self.phase, PoolPhase::Signing { .. })
    }

    /// Seat another candidate. Only possible while still queueing.
    pub fn push_collateral(&mut self, collateral: Transaction) -> bool {
        match &mut self.phase {
            PoolPhase::Queue { collaterals } => {
                collaterals.push(collateral);
                true
            }
            _ => false,
        }
    }

    /// Record a submitted entry. Only possible while accepting entries.
    pub fn push_entry(&mut self, entry: PoolEntry) -> bool {
        match &mut self.phase {
            PoolPhase::Accepting { entries, .. } => {
                entries.push(entry);
                true
            }
            _ => false,
        }
    }

    /// QUEUE -> ACCEPTING_ENTRIES. Returns false from any other phase.
    pub fn begin_accepting(&mut self, now: i64) -> bool {
        let phase = std::mem::replace(&mut self.phase, PoolPhase::Queue { collaterals: Vec::new() });
        match phase {
            PoolPhase::Queue { collaterals } => {
                self.phase = PoolPhase::Accepting { collaterals, entries: Vec::new() };
                self.last_progress_at = now;
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// ACCEPTING_ENTRIES -> SIGNING with the merged transaction.
    pub fn begin_signing(&mut self, final_tx: Transaction, now: i64) -> bool {
        let phase = std::mem::replace(&mut self.phase, PoolPhase::Queue { collaterals: Vec::new() });
        match phase {
            PoolPhase::Accepting { collaterals, entries } => {
                self.phase = PoolPhase::Signing { collaterals, entries, final_tx };
                self.last_progress_at = now;
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    fn timeout_secs(&self) -> i64 {
        if self.is_signing() {
            SIGNING_TIMEOUT_SECS
        } else {
            QUEUE_TIMEOUT_SECS
        }
    }

    pub fn has_timed_out(&self, now: i64) -> bool {
        now - self.last_progress_at >= self.timeout_secs()
    }

    /// The session stops taking candidates once it is sealed, full, or has
    /// reached quorum past the queue timeout.
    pub fn is_ready(&self, now: i64, min_participants: usize, max_participants: usize) -> bool {
        match &self.phase {
            PoolPhase::Accepting { .. } => true,
            PoolPhase::Queue { collaterals } => {
                collaterals.len() >= max_participants
                    || (self.has_timed_out(now) && collaterals.len() >= min_participants)
            }
            PoolPhase::Signing { .. } => false,
        }
    }
}
