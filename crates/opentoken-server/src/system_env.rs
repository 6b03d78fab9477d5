//! Production Environment implementation using system time and RNG.
//!
//! Production behavior is non-deterministic: the wall clock is the system
//! clock and randomness comes from the OS.

use chrono::{DateTime, Utc};
use opentoken_core::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). Suitable for
/// IVs, access codes, access secrets and the service secret.
///
/// # Panics
///
/// Panics if the OS RNG fails. A server without functioning cryptographic
/// randomness cannot produce safe IVs or secrets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - server cannot operate securely");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_random_bytes_are_random() {
        let env = SystemEnv::new();

        let mut bytes1 = [0u8; 32];
        let mut bytes2 = [0u8; 32];

        env.random_bytes(&mut bytes1);
        env.random_bytes(&mut bytes2);

        // Extremely unlikely to be equal if random
        assert_ne!(bytes1, bytes2, "Random bytes should differ");
    }

    #[test]
    fn wall_clock_is_after_2020() {
        let env = SystemEnv::new();
        assert!(env.wall_clock().timestamp() > 1_577_836_800);
    }
}
