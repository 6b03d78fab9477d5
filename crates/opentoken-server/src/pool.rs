//! CPU-bound work pool
//!
//! PBKDF2 and the ciphers run here instead of on the async executor. The
//! permit count bounds how many run at once and is independent of how many
//! requests are in flight; callers beyond the limit wait for a permit.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;

/// Default number of concurrent crypto jobs.
pub const DEFAULT_CRYPTO_THREADS: usize = 4;

/// Work could not be run to completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Pool was shut down
    #[error("crypto pool closed")]
    Closed,

    /// Job panicked or was cancelled
    #[error("crypto job failed: {0}")]
    Task(String),
}

/// Bounded pool for blocking crypto work. Clones share the permits.
#[derive(Debug, Clone)]
pub struct CryptoPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl CryptoPool {
    /// Pool running at most `size` jobs at once (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self { permits: Arc::new(Semaphore::new(size)), size }
    }

    /// Maximum concurrent jobs.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `work` on the blocking pool once a permit is free.
    ///
    /// Each job is independent; no ordering holds between jobs. Dropping the
    /// returned future before the job starts releases the permit.
    pub async fn run<T, F>(&self, work: F) -> Result<T, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = Arc::clone(&self.permits).acquire_owned().await.map_err(|_| PoolError::Closed)?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
        .map_err(|e| PoolError::Task(e.to_string()))
    }

    /// Stop handing out permits. Jobs already running finish.
    pub fn close(&self) {
        self.permits.close();
    }
}

impl Default for CryptoPool {
    fn default() -> Self {
        Self::new(DEFAULT_CRYPTO_THREADS)
    }
}
