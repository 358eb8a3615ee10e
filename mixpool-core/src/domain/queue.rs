//! Queue adverts: signed announcements that a coordinator is collecting
//! candidates (`ready = false`) or has sealed its session (`ready = true`).

use crate::domain::tx::OutPoint;
use crate::foundation::{Denomination, Hash32, Result, ADVERT_EXPIRY_SECS, QUEUE_TIMEOUT_SECS};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Default, Eq, Serialize, Deserialize)]
pub struct QueueAdvert {
    pub denomination: Denomination,
    pub coordinator_outpoint: OutPoint,
    pub timestamp: i64,
    pub ready: bool,
    pub signature: Vec<u8>,
}

// Advert identity excludes the signature: two adverts for the same slot are the
// same advert no matter how they were signed.
impl PartialEq for QueueAdvert {
    fn eq(&self, other: &Self) -> bool {
        self.denomination == other.denomination
            && self.coordinator_outpoint == other.coordinator_outpoint
            && self.timestamp == other.timestamp
            && self.ready == other.ready
    }
}

impl QueueAdvert {
    pub fn new(denomination: Denomination, coordinator_outpoint: OutPoint, timestamp: i64, ready: bool) -> Self {
        Self { denomination, coordinator_outpoint, timestamp, ready, signature: Vec::new() }
    }

    /// Hash the operator key signs. Must not cover the signature itself.
    pub fn signing_payload(&self) -> Result<Hash32> {
        let bytes = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .serialize(&(self.denomination, self.coordinator_outpoint, self.timestamp, self.ready))?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now - self.timestamp > ADVERT_EXPIRY_SECS
    }

    /// Adverts timestamped outside `now ± QUEUE_TIMEOUT` are not accepted.
    pub fn is_time_out_of_bounds(&self, now: i64) -> bool {
        now - self.timestamp > QUEUE_TIMEOUT_SECS || self.timestamp - now > QUEUE_TIMEOUT_SECS
    }
}

impl fmt::Display for QueueAdvert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "denomination={} time={} ready={} coordinator={}",
            self.denomination, self.timestamp, self.ready, self.coordinator_outpoint
        )
    }
}
