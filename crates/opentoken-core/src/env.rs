//! Environment abstraction for deterministic testing.
//!
//! Decouples record logic from system resources (wall clock, randomness).
//! Production uses the OS clock and RNG; tests use [`SimEnv`] with a seeded
//! RNG and a clock that only moves when told to.

use chrono::{DateTime, Utc};

/// Source of time and randomness.
///
/// # Invariants
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Given the same seed, a simulated environment produces the same bytes
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time, used for record expiration and request dates.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// `len` random bytes, hex encoded.
    ///
    /// Used for error reference IDs and generated access codes.
    fn random_hex(&self, len: usize) -> String {
        let mut bytes = vec![0u8; len];
        self.random_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[cfg(feature = "test-utils")]
pub use sim::SimEnv;

#[cfg(feature = "test-utils")]
mod sim {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::Environment;

    /// Deterministic environment: seeded `ChaCha8` RNG and a manual clock.
    ///
    /// Clones share the RNG and the clock.
    #[derive(Clone)]
    pub struct SimEnv {
        rng: Arc<Mutex<ChaCha8Rng>>,
        clock: Arc<Mutex<DateTime<Utc>>>,
    }

    impl SimEnv {
        /// Seeded environment whose clock starts at 2010-01-01T00:00:00Z.
        pub fn with_seed(seed: u64) -> Self {
            let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).single().unwrap_or_default();
            Self::at(seed, start)
        }

        /// Seeded environment whose clock starts at `now`.
        pub fn at(seed: u64, now: DateTime<Utc>) -> Self {
            Self {
                rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
                clock: Arc::new(Mutex::new(now)),
            }
        }

        /// Move the clock forward (or backward, for negative deltas).
        #[allow(clippy::expect_used)]
        pub fn advance(&self, delta: TimeDelta) {
            let mut clock = self.clock.lock().expect("Mutex poisoned");
            *clock += delta;
        }

        /// Set the clock.
        #[allow(clippy::expect_used)]
        pub fn set_time(&self, now: DateTime<Utc>) {
            *self.clock.lock().expect("Mutex poisoned") = now;
        }
    }

    impl Environment for SimEnv {
        #[allow(clippy::expect_used)]
        fn wall_clock(&self) -> DateTime<Utc> {
            *self.clock.lock().expect("Mutex poisoned")
        }

        #[allow(clippy::expect_used)]
        fn random_bytes(&self, buffer: &mut [u8]) {
            self.rng.lock().expect("Mutex poisoned").fill_bytes(buffer);
        }
    }
}
