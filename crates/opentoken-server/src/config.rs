//! Configuration file
//!
//! Parsed from TOML once at startup and resolved into [`Settings`]:
//! algorithm and digest names become registry descriptors here, so a bad
//! name fails before any record is touched.
//!
//! ```toml
//! [secret]
//! path = "/etc/opentoken/secret.key"
//!
//! [encryption.primary]
//! hmac = { algorithm = "sha256", digest = "sha1", iterations = 1000 }
//! cipher = { algorithm = "aes-256-cbc", digest = "sha1", iterations = 1000 }
//!
//! [records.access_code]
//! prefix = "access_code/"
//! lifetime_secs = 31536000
//! [[records.access_code.hash]]
//! digest = "sha256"
//! iterations = 100
//! salt = "ac"
//! length = 16
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use chrono::TimeDelta;
use opentoken_auth::SignatureConfig;
use opentoken_core::{FreezeConfig, HashConfigSpec, KeyError, RecordClass};
use opentoken_crypto::{CryptoError, SuiteConfig};
use serde::Deserialize;
use thiserror::Error;

use crate::pool::DEFAULT_CRYPTO_THREADS;

/// Configuration failures. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(String),

    /// An encryption suite names an unknown or unsupported algorithm
    #[error("encryption.{suite}: {source}")]
    Suite {
        /// `primary` or `secondary`
        suite: &'static str,
        /// Resolution failure
        #[source]
        source: CryptoError,
    },

    /// A record class hash config is invalid
    #[error("records.{class}: {source}")]
    RecordClass {
        /// Class name
        class: String,
        /// Resolution failure
        #[source]
        source: KeyError,
    },

    /// A value is out of range
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted field path
        field: &'static str,
        /// What is wrong
        reason: String,
    },
}

/// Configuration file as written.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// `[logging]`
    #[serde(default)]
    pub logging: LoggingConfig,
    /// `[storage]`
    #[serde(default)]
    pub storage: StorageConfig,
    /// `[secret]`
    pub secret: SecretConfig,
    /// `[workers]`
    #[serde(default)]
    pub workers: WorkersConfig,
    /// `[encryption]`
    pub encryption: EncryptionConfig,
    /// `[freeze]`
    #[serde(default)]
    pub freeze: FreezeSection,
    /// `[signature]`
    pub signature: SignatureSection,
    /// `[records.<class>]`
    #[serde(default)]
    pub records: BTreeMap<String, RecordSection>,
}

/// `[logging]`
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

/// `[storage]`
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Redb database file
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("opentoken.redb")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: default_storage_path() }
    }
}

/// `[secret]`
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    /// Outer key file; its raw bytes are the service secret
    pub path: PathBuf,
}

/// `[workers]`
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    /// Concurrent PBKDF2/cipher jobs
    #[serde(default = "default_crypto_threads")]
    pub crypto_threads: usize,
}

fn default_crypto_threads() -> usize {
    DEFAULT_CRYPTO_THREADS
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self { crypto_threads: default_crypto_threads() }
    }
}

/// `[encryption]`
#[derive(Debug, Clone, Deserialize)]
pub struct EncryptionConfig {
    /// Outer envelope, keyed by the service secret
    pub primary: SuiteConfig,
    /// Inner envelope, keyed by the record identifiers
    pub secondary: SuiteConfig,
}

/// `[freeze]`
#[derive(Debug, Clone, Deserialize)]
pub struct FreezeSection {
    /// Ceiling on any record lifetime
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: i64,
}

fn default_max_lifetime_secs() -> i64 {
    // 10 years
    10 * 365 * 24 * 60 * 60
}

impl Default for FreezeSection {
    fn default() -> Self {
        Self { max_lifetime_secs: default_max_lifetime_secs() }
    }
}

/// `[signature]`
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureSection {
    /// Canonical host signed requests must carry
    pub host: String,
    /// Accepted age of `X-OpenToken-Date`
    #[serde(default = "default_date_window_secs")]
    pub date_window_past_secs: i64,
    /// Accepted lead of `X-OpenToken-Date`
    #[serde(default = "default_date_window_secs")]
    pub date_window_future_secs: i64,
}

fn default_date_window_secs() -> i64 {
    15 * 60
}

/// `[records.<class>]`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSection {
    /// Storage key namespace
    pub prefix: String,
    /// Lifetime given to records on write
    pub lifetime_secs: i64,
    /// Address hashing steps, cycled over identifier segments
    pub hash: Vec<HashConfigSpec>,
}

/// Configuration resolved into runtime types.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Default log filter
    pub log_level: String,
    /// Redb database file
    pub storage_path: PathBuf,
    /// Outer key file
    pub secret_path: PathBuf,
    /// Crypto pool size
    pub crypto_threads: usize,
    /// Freeze suites and lifetime ceiling
    pub freeze: FreezeConfig,
    /// OT1 host and date window
    pub signature: SignatureConfig,
    /// Record classes by name
    pub classes: Vec<RecordClass>,
}

impl Config {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Self::from_toml(&text)
    }

    /// Parse config text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve names and durations.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let primary = self
            .encryption
            .primary
            .resolve()
            .map_err(|source| ConfigError::Suite { suite: "primary", source })?;
        let secondary = self
            .encryption
            .secondary
            .resolve()
            .map_err(|source| ConfigError::Suite { suite: "secondary", source })?;

        let max_lifetime = positive_secs("freeze.max_lifetime_secs", self.freeze.max_lifetime_secs)?;
        let signature = SignatureConfig {
            host: self.signature.host.trim().to_ascii_lowercase(),
            date_window_past: non_negative_secs(
                "signature.date_window_past_secs",
                self.signature.date_window_past_secs,
            )?,
            date_window_future: non_negative_secs(
                "signature.date_window_future_secs",
                self.signature.date_window_future_secs,
            )?,
        };
        if signature.host.is_empty() {
            return Err(ConfigError::Invalid {
                field: "signature.host",
                reason: "must not be empty".to_string(),
            });
        }

        let mut classes = Vec::with_capacity(self.records.len());
        for (name, section) in &self.records {
            let lifetime = positive_secs("records.<class>.lifetime_secs", section.lifetime_secs)?;
            let hashes = section
                .hash
                .iter()
                .map(HashConfigSpec::resolve)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| ConfigError::RecordClass { class: name.clone(), source })?;
            let class = RecordClass::new(name.as_str(), section.prefix.as_str(), lifetime, hashes)
                .map_err(|source| ConfigError::RecordClass { class: name.clone(), source })?;
            classes.push(class);
        }

        Ok(Settings {
            log_level: self.logging.level.clone(),
            storage_path: self.storage.path.clone(),
            secret_path: self.secret.path.clone(),
            crypto_threads: self.workers.crypto_threads,
            freeze: FreezeConfig { primary, secondary, max_lifetime },
            signature,
            classes,
        })
    }
}

/// Longest configurable duration. Timestamps derived from it must stay
/// inside chrono's representable range.
pub const MAX_DURATION_SECS: i64 = 100 * 366 * 24 * 60 * 60;

fn positive_secs(field: &'static str, secs: i64) -> Result<TimeDelta, ConfigError> {
    if secs <= 0 {
        return Err(ConfigError::Invalid { field, reason: format!("must be positive, got {secs}") });
    }
    bounded_secs(field, secs)
}

fn non_negative_secs(field: &'static str, secs: i64) -> Result<TimeDelta, ConfigError> {
    if secs < 0 {
        return Err(ConfigError::Invalid { field, reason: format!("must not be negative, got {secs}") });
    }
    bounded_secs(field, secs)
}

fn bounded_secs(field: &'static str, secs: i64) -> Result<TimeDelta, ConfigError> {
    if secs > MAX_DURATION_SECS {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("must be at most {MAX_DURATION_SECS} seconds, got {secs}"),
        });
    }
    TimeDelta::try_seconds(secs)
        .ok_or_else(|| ConfigError::Invalid { field, reason: format!("out of range: {secs}") })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
[logging]
level = "debug"

[storage]
path = "/var/lib/opentoken/records.redb"

[secret]
path = "/etc/opentoken/secret.key"

[workers]
crypto_threads = 8

[encryption.primary]
hmac = { algorithm = "whirlpool", digest = "md5", iterations = 1000 }
cipher = { algorithm = "aes-256-cbc", digest = "sha512", iterations = 10000 }

[encryption.secondary]
hmac = { algorithm = "sha256", digest = "sha1" }
cipher = { algorithm = "seed-cbc", digest = "sha256", iterations = 500 }

[freeze]
max_lifetime_secs = 86400

[signature]
host = " API.Example.com "
date_window_past_secs = 300
date_window_future_secs = 60

[records.access_code]
prefix = "ac/"
lifetime_secs = 3600
[[records.access_code.hash]]
digest = "sha256"
iterations = 10
salt = "one"
length = 16
[[records.access_code.hash]]
digest = "sha1"
iterations = 5
length = 8
"#;

    #[test]
    fn example_resolves() {
        let settings = Config::from_toml(EXAMPLE).unwrap().resolve().unwrap();

        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.crypto_threads, 8);
        assert_eq!(settings.freeze.max_lifetime, TimeDelta::days(1));
        assert_eq!(settings.freeze.primary.hmac.algorithm().name, "whirlpool");
        // iterations clamp to the envelope ceiling
        assert_eq!(settings.freeze.primary.cipher.iterations(), 1000);
        assert_eq!(settings.freeze.secondary.hmac.iterations(), 1000);
        assert_eq!(settings.signature.host, "api.example.com");
        assert_eq!(settings.signature.date_window_future, TimeDelta::minutes(1));

        assert_eq!(settings.classes.len(), 1);
        assert_eq!(settings.classes[0].name(), "access_code");
        assert_eq!(settings.classes[0].prefix(), "ac/");
        assert_eq!(settings.classes[0].lifetime(), TimeDelta::hours(1));
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let text = r#"
[secret]
path = "secret.key"
[encryption.primary]
hmac = { algorithm = "sha256", digest = "sha256" }
cipher = { algorithm = "aes-128-cbc", digest = "sha256" }
[encryption.secondary]
hmac = { algorithm = "sha256", digest = "sha256" }
cipher = { algorithm = "aes-128-cbc", digest = "sha256" }
[signature]
host = "example.com"
"#;
        let settings = Config::from_toml(text).unwrap().resolve().unwrap();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.storage_path, PathBuf::from("opentoken.redb"));
        assert_eq!(settings.crypto_threads, DEFAULT_CRYPTO_THREADS);
        assert_eq!(settings.signature.date_window_past, TimeDelta::minutes(15));
        assert!(settings.classes.is_empty());
    }

    #[test]
    fn unknown_algorithm_fails_at_resolve() {
        let text = EXAMPLE.replacen("aes-256-cbc", "aes-512-cbc", 1);
        let err = Config::from_toml(&text).unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Suite { suite: "primary", .. }), "{err}");
    }

    #[test]
    fn reserved_algorithm_fails_at_resolve() {
        let text = EXAMPLE.replacen("seed-cbc", "rc4", 1);
        let err = Config::from_toml(&text).unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Suite { suite: "secondary", .. }), "{err}");
    }

    #[test]
    fn bad_hash_config_names_class() {
        let text = EXAMPLE.replacen("digest = \"sha1\"\niterations = 5", "digest = \"mdc2\"\niterations = 5", 1);
        let err = Config::from_toml(&text).unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::RecordClass { ref class, .. } if class == "access_code"), "{err}");
    }

    #[test]
    fn oversized_segment_length_names_class() {
        let text = EXAMPLE.replacen("length = 8", "length = 4096", 1);
        let err = Config::from_toml(&text).unwrap().resolve().unwrap_err();
        assert!(
            matches!(
                err,
                ConfigError::RecordClass { ref class, source: KeyError::LengthTooLarge { length: 4096, .. } }
                    if class == "access_code"
            ),
            "{err}"
        );
    }

    #[test]
    fn non_positive_lifetime_is_invalid() {
        let text = EXAMPLE.replacen("max_lifetime_secs = 86400", "max_lifetime_secs = 0", 1);
        let err = Config::from_toml(&text).unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "freeze.max_lifetime_secs", .. }));
    }

    #[test]
    fn oversized_durations_fail_at_resolve() {
        let huge = "9000000000000";
        let cases = [
            ("max_lifetime_secs = 86400", format!("max_lifetime_secs = {huge}"), "freeze.max_lifetime_secs"),
            (
                "date_window_past_secs = 300",
                format!("date_window_past_secs = {huge}"),
                "signature.date_window_past_secs",
            ),
            (
                "date_window_future_secs = 60",
                format!("date_window_future_secs = {huge}"),
                "signature.date_window_future_secs",
            ),
            ("lifetime_secs = 3600", format!("lifetime_secs = {huge}"), "records.<class>.lifetime_secs"),
        ];
        for (from, to, expected) in cases {
            let text = EXAMPLE.replacen(from, &to, 1);
            let err = Config::from_toml(&text).unwrap().resolve().unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { field, .. } if field == expected),
                "{expected}: {err}"
            );
        }
    }

    #[test]
    fn longest_allowed_duration_resolves() {
        let text = EXAMPLE.replacen(
            "max_lifetime_secs = 86400",
            &format!("max_lifetime_secs = {MAX_DURATION_SECS}"),
            1,
        );
        let settings = Config::from_toml(&text).unwrap().resolve().unwrap();
        assert_eq!(settings.freeze.max_lifetime, TimeDelta::seconds(MAX_DURATION_SECS));
    }

    #[test]
    fn missing_secret_section_is_a_parse_error() {
        let text = EXAMPLE.replacen("[secret]\npath = \"/etc/opentoken/secret.key\"", "", 1);
        assert!(matches!(Config::from_toml(&text), Err(ConfigError::Parse(_))));
    }
}
