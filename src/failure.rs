//! Failure injection for the demo handler.
//!
//! The handler rolls against a [`FailurePolicy`] on every request to decide
//! whether to return a 500. The policy is an explicit dependency so tests
//! can seed it or turn it off entirely.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Decides whether a given request should fail.
pub trait FailurePolicy: Send + Sync {
    /// Returns true if this request should be answered with a server error.
    fn should_fail(&self) -> bool;
}

/// Fails roughly one in N requests using an owned, seedable RNG.
pub struct RandomFailure {
    one_in: u32,
    rng: Mutex<StdRng>,
}

impl RandomFailure {
    /// Creates a policy failing one in `one_in` requests, seeded from
    /// OS entropy. `one_in == 0` never fails.
    pub fn new(one_in: u32) -> Self {
        Self {
            one_in,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a deterministic policy from a fixed seed.
    pub fn seeded(one_in: u32, seed: u64) -> Self {
        Self {
            one_in,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl FailurePolicy for RandomFailure {
    fn should_fail(&self) -> bool {
        if self.one_in == 0 {
            return false;
        }
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            // A panic while holding the lock leaves the RNG intact.
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_range(0..self.one_in) == 0
    }
}

/// A policy that never fails.
pub struct Never;

impl FailurePolicy for Never {
    fn should_fail(&self) -> bool {
        false
    }
}
