//! Time and randomness, injected so tests can run deterministic scenarios.

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::tx::Transaction;

/// Monotonic-enough wall clock in whole seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Uniform integers and shuffles for the probabilistic fee controller.
pub trait PoolRng: Send + Sync {
    /// Uniform draw from `[0, upper)`.
    fn rand_int(&self, upper: u32) -> u32;

    fn shuffle_txs(&self, txs: &mut Vec<Transaction>);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            Err(_) => 0,
        }
    }
}

pub struct SystemRng;

impl PoolRng for SystemRng {
    fn rand_int(&self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }

    fn shuffle_txs(&self, txs: &mut Vec<Transaction>) {
        txs.shuffle(&mut rand::thread_rng());
    }
}
