//! OpenToken server components.
//!
//! Production glue around [`opentoken_core`] and [`opentoken_auth`]: durable
//! storage, a bounded pool for CPU-bound crypto, the record store, access
//! codes, configuration and client-facing error reports.
//!
//! # Components
//!
//! - [`RecordStore`]: put/get/delete of frozen, expiring records
//! - [`AccessCodes`]: record-backed [`opentoken_auth::AccessCodeStore`]
//! - [`storage`]: [`Storage`] trait with memory, redb and chaotic backends
//! - [`CryptoPool`]: PBKDF2 and ciphers off the async executor
//! - [`Config`]: TOML configuration resolved once into [`Settings`]
//! - [`SystemEnv`]: production environment (real time, OS RNG)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod access_codes;
mod config;
mod error;
mod pool;
mod records;
mod report;
pub mod storage;
mod system_env;

pub use access_codes::{
    ACCESS_CODE_BYTES, ACCESS_CODE_CLASS, ACCESS_SECRET_BYTES, AccessCodes, IssuedAccessCode,
};
pub use config::{Config, ConfigError, MAX_DURATION_SECS, Settings};
pub use error::ServerError;
use opentoken_core::{Freezer, ServiceSecret};
pub use pool::{CryptoPool, DEFAULT_CRYPTO_THREADS, PoolError};
pub use records::{CLASS_METADATA, RecordError, RecordStore};
pub use report::{ErrorReport, INTERNAL_MESSAGE};
pub use storage::{ChaoticStorage, MemoryStorage, Metadata, RedbStorage, Storage, StorageError, StoredObject};
pub use system_env::SystemEnv;

/// Open the durable record store described by `settings`.
///
/// Loads the service secret once; every clone of the returned store shares
/// it until the last one drops.
pub fn open_records(settings: &Settings) -> Result<RecordStore<RedbStorage, SystemEnv>, ServerError> {
    let storage = RedbStorage::open(&settings.storage_path)?;
    let secret = ServiceSecret::load(&settings.secret_path)?;
    let freezer = Freezer::new(settings.freeze, secret, SystemEnv::new());
    let pool = CryptoPool::new(settings.crypto_threads);

    tracing::info!(
        storage = %settings.storage_path.display(),
        classes = settings.classes.len(),
        crypto_threads = pool.size(),
        "record store opened"
    );
    Ok(RecordStore::new(storage, freezer, settings.classes.clone(), pool))
}
