//! Append-only catalog of ciphers and digests
//!
//! Every algorithm has a permanent one-byte code that is written into
//! envelope headers. Codes are the table index and must never be reassigned:
//! new algorithms go at the end of their table, deprecated ones stay in place.
//! Entries whose implementation is unavailable are kept as reserved slots.

use crate::error::{AlgorithmField, CryptoError};

/// Executable hash function behind a supported digest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFunction {
    /// MD4
    Md4,
    /// MD5
    Md5,
    /// RIPEMD-160
    Ripemd160,
    /// SHA-1
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// Whirlpool
    Whirlpool,
}

/// A registered digest.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DigestDescriptor {
    /// Configuration name
    pub name: &'static str,
    /// Permanent header code
    pub code: u8,
    /// Output size in bytes
    pub hash_length: usize,
    /// Implementation, `None` for reserved entries
    pub function: Option<HashFunction>,
}

impl DigestDescriptor {
    /// Whether this build can compute the digest.
    pub fn is_supported(&self) -> bool {
        self.function.is_some()
    }

    /// Implementation for `field`, or an unsupported-algorithm error.
    pub fn function_for(&self, field: AlgorithmField) -> Result<HashFunction, CryptoError> {
        self.function.ok_or(CryptoError::UnsupportedAlgorithm { field, name: self.name })
    }
}

/// Block cipher primitive behind a supported cipher entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockPrimitive {
    /// AES with a 128-bit key
    Aes128,
    /// AES with a 192-bit key
    Aes192,
    /// AES with a 256-bit key
    Aes256,
    /// Blowfish
    Blowfish,
    /// CAST-128
    Cast5,
    /// Single DES
    Des,
    /// Two-key triple DES (EDE)
    TdesEde2,
    /// Three-key triple DES (EDE)
    TdesEde3,
    /// RC2, effective key bits equal to the key length
    Rc2,
    /// SEED
    Seed,
}

/// Mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Cipher block chaining with PKCS#7 padding
    Cbc,
    /// Full-block cipher feedback
    Cfb,
    /// 8-bit cipher feedback
    Cfb8,
    /// Electronic codebook with PKCS#7 padding
    Ecb,
    /// Output feedback
    Ofb,
}

impl Mode {
    /// Whether the mode pads plaintext to a whole number of blocks.
    pub fn is_padded(self) -> bool {
        matches!(self, Self::Cbc | Self::Ecb)
    }
}

/// Primitive and mode pair that can actually be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherSuite {
    /// Block cipher
    pub primitive: BlockPrimitive,
    /// Mode of operation
    pub mode: Mode,
}

/// A registered cipher.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CipherDescriptor {
    /// Configuration name (case-sensitive)
    pub name: &'static str,
    /// Permanent header code
    pub code: u8,
    /// Key size in bytes
    pub key_bytes: usize,
    /// IV size in bytes, zero for ECB
    pub iv_bytes: usize,
    /// Implementation, `None` for reserved entries
    pub suite: Option<CipherSuite>,
}

impl CipherDescriptor {
    /// Whether this build can run the cipher.
    pub fn is_supported(&self) -> bool {
        self.suite.is_some()
    }

    /// Implementation for `field`, or an unsupported-algorithm error.
    pub fn suite_for(&self, field: AlgorithmField) -> Result<CipherSuite, CryptoError> {
        self.suite.ok_or(CryptoError::UnsupportedAlgorithm { field, name: self.name })
    }
}

const fn digest(name: &'static str, code: u8, hash_length: usize, f: HashFunction) -> DigestDescriptor {
    DigestDescriptor { name, code, hash_length, function: Some(f) }
}

const fn reserved_digest(name: &'static str, code: u8, hash_length: usize) -> DigestDescriptor {
    DigestDescriptor { name, code, hash_length, function: None }
}

const fn cipher(
    name: &'static str,
    code: u8,
    key_bytes: usize,
    iv_bytes: usize,
    primitive: BlockPrimitive,
    mode: Mode,
) -> CipherDescriptor {
    CipherDescriptor { name, code, key_bytes, iv_bytes, suite: Some(CipherSuite { primitive, mode }) }
}

const fn reserved_cipher(
    name: &'static str,
    code: u8,
    key_bytes: usize,
    iv_bytes: usize,
) -> CipherDescriptor {
    CipherDescriptor { name, code, key_bytes, iv_bytes, suite: None }
}

/// Registered digests, indexed by code.
pub static DIGESTS: [DigestDescriptor; 11] = [
    digest("md4", 0, 16, HashFunction::Md4),
    digest("md5", 1, 16, HashFunction::Md5),
    reserved_digest("mdc2", 2, 16),
    digest("ripemd160", 3, 20, HashFunction::Ripemd160),
    // SHA-0
    reserved_digest("sha", 4, 20),
    digest("sha1", 5, 20, HashFunction::Sha1),
    digest("sha224", 6, 28, HashFunction::Sha224),
    digest("sha256", 7, 32, HashFunction::Sha256),
    digest("sha384", 8, 48, HashFunction::Sha384),
    digest("sha512", 9, 64, HashFunction::Sha512),
    digest("whirlpool", 10, 64, HashFunction::Whirlpool),
];

/// Registered ciphers, indexed by code.
///
/// Aliases such as `bf`, `des3` and `seed` resolve to the same primitive and
/// mode as their targets but keep their own codes.
pub static CIPHERS: [CipherDescriptor; 65] = [
    cipher("CAST-cbc", 0, 16, 8, BlockPrimitive::Cast5, Mode::Cbc),
    cipher("aes-128-cbc", 1, 16, 16, BlockPrimitive::Aes128, Mode::Cbc),
    cipher("aes-128-cfb", 2, 16, 16, BlockPrimitive::Aes128, Mode::Cfb),
    reserved_cipher("aes-128-cfb1", 3, 16, 16),
    cipher("aes-128-cfb8", 4, 16, 16, BlockPrimitive::Aes128, Mode::Cfb8),
    cipher("aes-128-ecb", 5, 16, 0, BlockPrimitive::Aes128, Mode::Ecb),
    cipher("aes-128-ofb", 6, 16, 16, BlockPrimitive::Aes128, Mode::Ofb),
    cipher("aes-192-cbc", 7, 24, 16, BlockPrimitive::Aes192, Mode::Cbc),
    cipher("aes-192-cfb", 8, 24, 16, BlockPrimitive::Aes192, Mode::Cfb),
    reserved_cipher("aes-192-cfb1", 9, 24, 16),
    cipher("aes-192-cfb8", 10, 24, 16, BlockPrimitive::Aes192, Mode::Cfb8),
    cipher("aes-192-ecb", 11, 24, 0, BlockPrimitive::Aes192, Mode::Ecb),
    cipher("aes-192-ofb", 12, 24, 16, BlockPrimitive::Aes192, Mode::Ofb),
    cipher("aes-256-cbc", 13, 32, 16, BlockPrimitive::Aes256, Mode::Cbc),
    cipher("aes-256-cfb", 14, 32, 16, BlockPrimitive::Aes256, Mode::Cfb),
    reserved_cipher("aes-256-cfb1", 15, 32, 16),
    cipher("aes-256-cfb8", 16, 32, 16, BlockPrimitive::Aes256, Mode::Cfb8),
    cipher("aes-256-ecb", 17, 32, 0, BlockPrimitive::Aes256, Mode::Ecb),
    cipher("aes-256-ofb", 18, 32, 16, BlockPrimitive::Aes256, Mode::Ofb),
    cipher("bf", 19, 16, 8, BlockPrimitive::Blowfish, Mode::Cbc),
    cipher("bf-cbc", 20, 16, 8, BlockPrimitive::Blowfish, Mode::Cbc),
    cipher("bf-cfb", 21, 16, 8, BlockPrimitive::Blowfish, Mode::Cfb),
    cipher("bf-ecb", 22, 16, 0, BlockPrimitive::Blowfish, Mode::Ecb),
    cipher("bf-ofb", 23, 16, 8, BlockPrimitive::Blowfish, Mode::Ofb),
    cipher("blowfish", 24, 16, 8, BlockPrimitive::Blowfish, Mode::Cbc),
    cipher("cast", 25, 16, 8, BlockPrimitive::Cast5, Mode::Cbc),
    cipher("cast-cbc", 26, 16, 8, BlockPrimitive::Cast5, Mode::Cbc),
    cipher("cast5-cbc", 27, 16, 8, BlockPrimitive::Cast5, Mode::Cbc),
    cipher("cast5-cfb", 28, 16, 8, BlockPrimitive::Cast5, Mode::Cfb),
    cipher("cast5-ecb", 29, 16, 0, BlockPrimitive::Cast5, Mode::Ecb),
    cipher("cast5-ofb", 30, 16, 8, BlockPrimitive::Cast5, Mode::Ofb),
    cipher("des", 31, 8, 8, BlockPrimitive::Des, Mode::Cbc),
    cipher("des-cbc", 32, 8, 8, BlockPrimitive::Des, Mode::Cbc),
    cipher("des-cfb", 33, 8, 8, BlockPrimitive::Des, Mode::Cfb),
    reserved_cipher("des-cfb1", 34, 8, 8),
    cipher("des-cfb8", 35, 8, 8, BlockPrimitive::Des, Mode::Cfb8),
    cipher("des-ecb", 36, 8, 0, BlockPrimitive::Des, Mode::Ecb),
    cipher("des-ede", 37, 16, 0, BlockPrimitive::TdesEde2, Mode::Ecb),
    cipher("des-ede-cbc", 38, 16, 8, BlockPrimitive::TdesEde2, Mode::Cbc),
    cipher("des-ede-cfb", 39, 16, 8, BlockPrimitive::TdesEde2, Mode::Cfb),
    cipher("des-ede-ofb", 40, 16, 8, BlockPrimitive::TdesEde2, Mode::Ofb),
    cipher("des-ede3", 41, 24, 0, BlockPrimitive::TdesEde3, Mode::Ecb),
    cipher("des-ede3-cbc", 42, 24, 8, BlockPrimitive::TdesEde3, Mode::Cbc),
    cipher("des-ede3-cfb", 43, 24, 8, BlockPrimitive::TdesEde3, Mode::Cfb),
    reserved_cipher("des-ede3-cfb1", 44, 24, 8),
    cipher("des-ede3-cfb8", 45, 24, 8, BlockPrimitive::TdesEde3, Mode::Cfb8),
    cipher("des-ede3-ofb", 46, 24, 8, BlockPrimitive::TdesEde3, Mode::Ofb),
    cipher("des-ofb", 47, 8, 8, BlockPrimitive::Des, Mode::Ofb),
    cipher("des3", 48, 24, 8, BlockPrimitive::TdesEde3, Mode::Cbc),
    reserved_cipher("desx", 49, 24, 8),
    reserved_cipher("desx-cbc", 50, 24, 8),
    cipher("rc2", 51, 16, 8, BlockPrimitive::Rc2, Mode::Cbc),
    cipher("rc2-40-cbc", 52, 5, 8, BlockPrimitive::Rc2, Mode::Cbc),
    cipher("rc2-64-cbc", 53, 8, 8, BlockPrimitive::Rc2, Mode::Cbc),
    cipher("rc2-cbc", 54, 16, 8, BlockPrimitive::Rc2, Mode::Cbc),
    cipher("rc2-cfb", 55, 16, 8, BlockPrimitive::Rc2, Mode::Cfb),
    cipher("rc2-ecb", 56, 16, 0, BlockPrimitive::Rc2, Mode::Ecb),
    cipher("rc2-ofb", 57, 16, 8, BlockPrimitive::Rc2, Mode::Ofb),
    reserved_cipher("rc4", 58, 16, 0),
    reserved_cipher("rc4-40", 59, 5, 0),
    cipher("seed", 60, 16, 16, BlockPrimitive::Seed, Mode::Cbc),
    cipher("seed-cbc", 61, 16, 16, BlockPrimitive::Seed, Mode::Cbc),
    cipher("seed-cfb", 62, 16, 16, BlockPrimitive::Seed, Mode::Cfb),
    cipher("seed-ecb", 63, 16, 0, BlockPrimitive::Seed, Mode::Ecb),
    cipher("seed-ofb", 64, 16, 16, BlockPrimitive::Seed, Mode::Ofb),
];

/// Look up a digest by configuration name.
pub fn digest_by_name(name: &str) -> Option<&'static DigestDescriptor> {
    DIGESTS.iter().find(|d| d.name == name)
}

/// Look up a digest by header code.
pub fn digest_by_code(code: u8) -> Option<&'static DigestDescriptor> {
    DIGESTS.get(usize::from(code))
}

/// Look up a cipher by configuration name.
pub fn cipher_by_name(name: &str) -> Option<&'static CipherDescriptor> {
    CIPHERS.iter().find(|c| c.name == name)
}

/// Look up a cipher by header code.
pub fn cipher_by_code(code: u8) -> Option<&'static CipherDescriptor> {
    CIPHERS.get(usize::from(code))
}

/// Resolve a configured digest name for `field`.
pub fn resolve_digest(
    name: &str,
    field: AlgorithmField,
) -> Result<&'static DigestDescriptor, CryptoError> {
    let descriptor = digest_by_name(name)
        .ok_or_else(|| CryptoError::UnknownAlgorithmName { field, name: name.to_string() })?;
    descriptor.function_for(field)?;
    Ok(descriptor)
}

/// Resolve a configured cipher name for `field`.
pub fn resolve_cipher(
    name: &str,
    field: AlgorithmField,
) -> Result<&'static CipherDescriptor, CryptoError> {
    let descriptor = cipher_by_name(name)
        .ok_or_else(|| CryptoError::UnknownAlgorithmName { field, name: name.to_string() })?;
    descriptor.suite_for(field)?;
    Ok(descriptor)
}
