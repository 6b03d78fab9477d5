//! Chaotic storage wrapper for fault injection testing
//!
//! Storage wrapper that randomly fails operations to test error handling.
//! The record store must surface every injected failure as an error and
//! never report a half-applied write as success.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Metadata, Storage, StorageError, StoredObject};

/// Chaotic storage wrapper that randomly injects failures
///
/// Delegates to an underlying storage implementation but randomly fails
/// operations based on a configured failure rate. Failures are injected
/// before delegating, so a failed `put` leaves the inner storage untouched.
#[derive(Clone)]
pub struct ChaoticStorage<S: Storage> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<Mutex<usize>>,
}

/// Linear congruential generator, reproducible per seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S: Storage> ChaoticStorage<S> {
    /// Create a new chaotic storage wrapper
    ///
    /// `failure_rate` is clamped to [0.0, 1.0].
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        Self {
            inner,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying storage (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of storage operations attempted.
    #[allow(clippy::expect_used)]
    pub fn operation_count(&self) -> usize {
        *self.operation_count.lock().expect("operation_count mutex poisoned")
    }

    /// Count the operation and decide whether it fails.
    #[allow(clippy::expect_used)]
    fn inject(&self) -> Result<(), StorageError> {
        *self.operation_count.lock().expect("operation_count mutex poisoned") += 1;
        let fail = self.rng.lock().expect("ChaoticRng mutex poisoned").should_fail(self.failure_rate);
        if fail { Err(StorageError::Io("chaotic failure injection".to_string())) } else { Ok(()) }
    }
}

#[async_trait]
impl<S: Storage> Storage for ChaoticStorage<S> {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: Metadata,
    ) -> Result<(), StorageError> {
        self.inject()?;
        self.inner.put(key, bytes, metadata).await
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        self.inject()?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inject()?;
        self.inner.delete(key).await
    }
}
