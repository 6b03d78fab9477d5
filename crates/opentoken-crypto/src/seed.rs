//! SEED block cipher (RFC 4269) and its modes of operation
//!
//! RustCrypto has no SEED implementation, so the cipher and the four modes
//! the registry exposes live here. Output is byte-compatible with OpenSSL's
//! `seed-*` ciphers.

use zeroize::Zeroize;

use crate::error::CryptoError;

/// Block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Key size in bytes.
pub const KEY_SIZE: usize = 16;

const S1: [u8; 256] = [
    0xa9, 0x85, 0xd6, 0xd3, 0x54, 0x1d, 0xac, 0x25, 0x5d, 0x43, 0x18, 0x1e, 0x51, 0xfc, 0xca, 0x63,
    0x28, 0x44, 0x20, 0x9d, 0xe0, 0xe2, 0xc8, 0x17, 0xa5, 0x8f, 0x03, 0x7b, 0xbb, 0x13, 0xd2, 0xee,
    0x70, 0x8c, 0x3f, 0xa8, 0x32, 0xdd, 0xf6, 0x74, 0xec, 0x95, 0x0b, 0x57, 0x5c, 0x5b, 0xbd, 0x01,
    0x24, 0x1c, 0x73, 0x98, 0x10, 0xcc, 0xf2, 0xd9, 0x2c, 0xe7, 0x72, 0x83, 0x9b, 0xd1, 0x86, 0xc9,
    0x60, 0x50, 0xa3, 0xeb, 0x0d, 0xb6, 0x9e, 0x4f, 0xb7, 0x5a, 0xc6, 0x78, 0xa6, 0x12, 0xaf, 0xd5,
    0x61, 0xc3, 0xb4, 0x41, 0x52, 0x7d, 0x8d, 0x08, 0x1f, 0x99, 0x00, 0x19, 0x04, 0x53, 0xf7, 0xe1,
    0xfd, 0x76, 0x2f, 0x27, 0xb0, 0x8b, 0x0e, 0xab, 0xa2, 0x6e, 0x93, 0x4d, 0x69, 0x7c, 0x09, 0x0a,
    0xbf, 0xef, 0xf3, 0xc5, 0x87, 0x14, 0xfe, 0x64, 0xde, 0x2e, 0x4b, 0x1a, 0x06, 0x21, 0x6b, 0x66,
    0x02, 0xf5, 0x92, 0x8a, 0x0c, 0xb3, 0x7e, 0xd0, 0x7a, 0x47, 0x96, 0xe5, 0x26, 0x80, 0xad, 0xdf,
    0xa1, 0x30, 0x37, 0xae, 0x36, 0x15, 0x22, 0x38, 0xf4, 0xa7, 0x45, 0x4c, 0x81, 0xe9, 0x84, 0x97,
    0x35, 0xcb, 0xce, 0x3c, 0x71, 0x11, 0xc7, 0x89, 0x75, 0xfb, 0xda, 0xf8, 0x94, 0x59, 0x82, 0xc4,
    0xff, 0x49, 0x39, 0x67, 0xc0, 0xcf, 0xd7, 0xb8, 0x0f, 0x8e, 0x42, 0x23, 0x91, 0x6c, 0xdb, 0xa4,
    0x34, 0xf1, 0x48, 0xc2, 0x6f, 0x3d, 0x2d, 0x40, 0xbe, 0x3e, 0xbc, 0xc1, 0xaa, 0xba, 0x4e, 0x55,
    0x3b, 0xdc, 0x68, 0x7f, 0x9c, 0xd8, 0x4a, 0x56, 0x77, 0xa0, 0xed, 0x46, 0xb5, 0x2b, 0x65, 0xfa,
    0xe3, 0xb9, 0xb1, 0x9f, 0x5e, 0xf9, 0xe6, 0xb2, 0x31, 0xea, 0x6d, 0x5f, 0xe4, 0xf0, 0xcd, 0x88,
    0x16, 0x3a, 0x58, 0xd4, 0x62, 0x29, 0x07, 0x33, 0xe8, 0x1b, 0x05, 0x79, 0x90, 0x6a, 0x2a, 0x9a,
];

const S2: [u8; 256] = [
    0x38, 0xe8, 0x2d, 0xa6, 0xcf, 0xde, 0xb3, 0xb8, 0xaf, 0x60, 0x55, 0xc7, 0x44, 0x6f, 0x6b, 0x5b,
    0xc3, 0x62, 0x33, 0xb5, 0x29, 0xa0, 0xe2, 0xa7, 0xd3, 0x91, 0x11, 0x06, 0x1c, 0xbc, 0x36, 0x4b,
    0xef, 0x88, 0x6c, 0xa8, 0x17, 0xc4, 0x16, 0xf4, 0xc2, 0x45, 0xe1, 0xd6, 0x3f, 0x3d, 0x8e, 0x98,
    0x28, 0x4e, 0xf6, 0x3e, 0xa5, 0xf9, 0x0d, 0xdf, 0xd8, 0x2b, 0x66, 0x7a, 0x27, 0x2f, 0xf1, 0x72,
    0x42, 0xd4, 0x41, 0xc0, 0x73, 0x67, 0xac, 0x8b, 0xf7, 0xad, 0x80, 0x1f, 0xca, 0x2c, 0xaa, 0x34,
    0xd2, 0x0b, 0xee, 0xe9, 0x5d, 0x94, 0x18, 0xf8, 0x57, 0xae, 0x08, 0xc5, 0x13, 0xcd, 0x86, 0xb9,
    0xff, 0x7d, 0xc1, 0x31, 0xf5, 0x8a, 0x6a, 0xb1, 0xd1, 0x20, 0xd7, 0x02, 0x22, 0x04, 0x68, 0x71,
    0x07, 0xdb, 0x9d, 0x99, 0x61, 0xbe, 0xe6, 0x59, 0xdd, 0x51, 0x90, 0xdc, 0x9a, 0xa3, 0xab, 0xd0,
    0x81, 0x0f, 0x47, 0x1a, 0xe3, 0xec, 0x8d, 0xbf, 0x96, 0x7b, 0x5c, 0xa2, 0xa1, 0x63, 0x23, 0x4d,
    0xc8, 0x9e, 0x9c, 0x3a, 0x0c, 0x2e, 0xba, 0x6e, 0x9f, 0x5a, 0xf2, 0x92, 0xf3, 0x49, 0x78, 0xcc,
    0x15, 0xfb, 0x70, 0x75, 0x7f, 0x35, 0x10, 0x03, 0x64, 0x6d, 0xc6, 0x74, 0xd5, 0xb4, 0xea, 0x09,
    0x76, 0x19, 0xfe, 0x40, 0x12, 0xe0, 0xbd, 0x05, 0xfa, 0x01, 0xf0, 0x2a, 0x5e, 0xa9, 0x56, 0x43,
    0x85, 0x14, 0x89, 0x9b, 0xb0, 0xe5, 0x48, 0x79, 0x97, 0xfc, 0x1e, 0x82, 0x21, 0x8c, 0x1b, 0x5f,
    0x77, 0x54, 0xb2, 0x1d, 0x25, 0x4f, 0x00, 0x46, 0xed, 0x58, 0x52, 0xeb, 0x7e, 0xda, 0xc9, 0xfd,
    0x30, 0x95, 0x65, 0x3c, 0xb6, 0xe4, 0xbb, 0x7c, 0x0e, 0x50, 0x39, 0x26, 0x32, 0x84, 0x69, 0x93,
    0x37, 0xe7, 0x24, 0xa4, 0xcb, 0x53, 0x0a, 0x87, 0xd9, 0x4c, 0x83, 0x8f, 0xce, 0x3b, 0x4a, 0xb7,
];

const fn build_ss() -> [[u32; 256]; 4] {
    let mut ss = [[0u32; 256]; 4];
    let mut x = 0;
    while x < 256 {
        let a = S1[x] as u32;
        let b = S2[x] as u32;
        ss[0][x] = (a & 0xfc) | (a & 0xf3) << 8 | (a & 0xcf) << 16 | (a & 0x3f) << 24;
        ss[1][x] = (b & 0xf3) | (b & 0xcf) << 8 | (b & 0x3f) << 16 | (b & 0xfc) << 24;
        ss[2][x] = (a & 0xcf) | (a & 0x3f) << 8 | (a & 0xfc) << 16 | (a & 0xf3) << 24;
        ss[3][x] = (b & 0x3f) | (b & 0xfc) << 8 | (b & 0xf3) << 16 | (b & 0xcf) << 24;
        x += 1;
    }
    ss
}

static SS: [[u32; 256]; 4] = build_ss();

/// Key schedule constants, `KC[i] = rotl(0x9e3779b9, i)`.
const KC: [u32; 16] = {
    let mut kc = [0u32; 16];
    let mut i = 0;
    while i < 16 {
        kc[i] = 0x9e37_79b9u32.rotate_left(i as u32);
        i += 1;
    }
    kc
};

fn g(x: u32) -> u32 {
    let [b0, b1, b2, b3] = x.to_le_bytes();
    SS[0][usize::from(b0)] ^ SS[1][usize::from(b1)] ^ SS[2][usize::from(b2)] ^ SS[3][usize::from(b3)]
}

fn round(r0: u32, r1: u32, k0: u32, k1: u32) -> (u32, u32) {
    let mut c = r0 ^ k0;
    let mut d = r1 ^ k1;
    d ^= c;
    d = g(d);
    c = g(c.wrapping_add(d));
    d = g(d.wrapping_add(c));
    c = c.wrapping_add(d);
    (c, d)
}

/// Expanded SEED key.
///
/// Round keys are zeroized on drop.
pub struct Seed {
    round_keys: [u32; 32],
}

impl Seed {
    /// Expand a 128-bit key.
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        let [mut k0, mut k1, mut k2, mut k3] = words(key);
        let mut round_keys = [0u32; 32];

        for (i, kc) in KC.iter().enumerate() {
            round_keys[2 * i] = g(k0.wrapping_add(k2).wrapping_sub(*kc));
            round_keys[2 * i + 1] = g(k1.wrapping_sub(k3).wrapping_add(*kc));

            if i % 2 == 0 {
                let t = k0;
                k0 = (k0 >> 8) | (k1 << 24);
                k1 = (k1 >> 8) | (t << 24);
            } else {
                let t = k2;
                k2 = (k2 << 8) | (k3 >> 24);
                k3 = (k3 << 8) | (t >> 24);
            }
        }

        Self { round_keys }
    }

    /// Expand a key given as a slice.
    pub fn from_slice(key: &[u8]) -> Result<Self, CryptoError> {
        let key: &[u8; KEY_SIZE] =
            key.try_into().map_err(|_| CryptoError::InvalidKeyLength { algorithm: "seed" })?;
        Ok(Self::new(key))
    }

    /// Encrypt one block in place.
    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        self.crypt(block, false);
    }

    /// Decrypt one block in place.
    pub fn decrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        self.crypt(block, true);
    }

    fn crypt(&self, block: &mut [u8; BLOCK_SIZE], decrypt: bool) {
        let [mut l0, mut l1, mut r0, mut r1] = words(block);

        for n in 0..16 {
            let i = if decrypt { 15 - n } else { n };
            let (c, d) = round(r0, r1, self.round_keys[2 * i], self.round_keys[2 * i + 1]);
            l0 ^= c;
            l1 ^= d;
            // No swap after the final round
            if n != 15 {
                (l0, l1, r0, r1) = (r0, r1, l0, l1);
            }
        }

        for (chunk, word) in block.chunks_exact_mut(4).zip([l0, l1, r0, r1]) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.round_keys.zeroize();
    }
}

fn words(bytes: &[u8; 16]) -> [u32; 4] {
    let mut out = [0u32; 4];
    for (word, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}

fn iv_block(iv: &[u8]) -> Result<[u8; BLOCK_SIZE], CryptoError> {
    iv.try_into().map_err(|_| CryptoError::InvalidIvLength { expected: BLOCK_SIZE, actual: iv.len() })
}

fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.resize(data.len() + pad_len, pad_len as u8);
    out
}

fn unpad(mut data: Vec<u8>) -> Result<Vec<u8>, CryptoError> {
    let Some(&last) = data.last() else {
        return Err(CryptoError::DecryptionFailed);
    };
    let pad_len = usize::from(last);
    if pad_len == 0 || pad_len > BLOCK_SIZE || pad_len > data.len() {
        return Err(CryptoError::DecryptionFailed);
    }
    if !data[data.len() - pad_len..].iter().all(|&b| b == last) {
        return Err(CryptoError::DecryptionFailed);
    }
    data.truncate(data.len() - pad_len);
    Ok(data)
}

fn blocks(data: &mut [u8]) -> impl Iterator<Item = &mut [u8; BLOCK_SIZE]> {
    data.chunks_exact_mut(BLOCK_SIZE).filter_map(|chunk| <&mut [u8; BLOCK_SIZE]>::try_from(chunk).ok())
}

/// ECB with PKCS#7 padding.
pub fn ecb_encrypt(seed: &Seed, plaintext: &[u8]) -> Vec<u8> {
    let mut out = pad(plaintext);
    for block in blocks(&mut out) {
        seed.encrypt_block(block);
    }
    out
}

/// Inverse of [`ecb_encrypt`].
pub fn ecb_decrypt(seed: &Seed, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::DecryptionFailed);
    }
    let mut out = ciphertext.to_vec();
    for block in blocks(&mut out) {
        seed.decrypt_block(block);
    }
    unpad(out)
}

/// CBC with PKCS#7 padding.
pub fn cbc_encrypt(seed: &Seed, iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut chain = iv_block(iv)?;
    let mut out = pad(plaintext);
    for block in blocks(&mut out) {
        for (b, c) in block.iter_mut().zip(chain) {
            *b ^= c;
        }
        seed.encrypt_block(block);
        chain = *block;
    }
    Ok(out)
}

/// Inverse of [`cbc_encrypt`].
pub fn cbc_decrypt(seed: &Seed, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut chain = iv_block(iv)?;
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::DecryptionFailed);
    }
    let mut out = ciphertext.to_vec();
    for block in blocks(&mut out) {
        let next = *block;
        seed.decrypt_block(block);
        for (b, c) in block.iter_mut().zip(chain) {
            *b ^= c;
        }
        chain = next;
    }
    unpad(out)
}

/// CFB-128 keystream. Ciphertext feeds back into the shift register, so the
/// direction decides which side of the XOR is fed back.
fn cfb(seed: &Seed, iv: &[u8], data: &[u8], decrypt: bool) -> Result<Vec<u8>, CryptoError> {
    let mut register = iv_block(iv)?;
    let mut out = data.to_vec();
    for chunk in out.chunks_mut(BLOCK_SIZE) {
        seed.encrypt_block(&mut register);
        for (i, byte) in chunk.iter_mut().enumerate() {
            let input = *byte;
            *byte ^= register[i];
            register[i] = if decrypt { input } else { *byte };
        }
    }
    Ok(out)
}

/// CFB-128 encryption.
pub fn cfb_encrypt(seed: &Seed, iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    cfb(seed, iv, plaintext, false)
}

/// CFB-128 decryption.
pub fn cfb_decrypt(seed: &Seed, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    cfb(seed, iv, ciphertext, true)
}

/// OFB-128. Encryption and decryption are the same operation.
pub fn ofb_apply(seed: &Seed, iv: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut register = iv_block(iv)?;
    let mut out = data.to_vec();
    for chunk in out.chunks_mut(BLOCK_SIZE) {
        seed.encrypt_block(&mut register);
        for (byte, k) in chunk.iter_mut().zip(register) {
            *byte ^= k;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
    const IV: [u8; 16] = [0x42; 16];
    const TEXT: &[u8] = b"The quick brown fox jumps";

    #[test]
    fn rfc4269_vector() {
        let seed = Seed::new(&[0u8; 16]);
        let mut block = KEY;
        seed.encrypt_block(&mut block);
        assert_eq!(hex::encode(block), "5ebac6e0054e166819aff1cc6d346cdb");
        seed.decrypt_block(&mut block);
        assert_eq!(block, KEY);
    }

    #[test]
    fn ecb_matches_openssl() {
        let seed = Seed::new(&KEY);
        let ct = ecb_encrypt(&seed, TEXT);
        assert_eq!(
            hex::encode(&ct),
            "5f9e53d5c1bae21b3ac8681228e5bce327d1971323ad8eaddfd8e6248c6be8cb"
        );
        assert_eq!(ecb_decrypt(&seed, &ct).unwrap(), TEXT);
    }

    #[test]
    fn cbc_matches_openssl() {
        let seed = Seed::new(&KEY);
        let ct = cbc_encrypt(&seed, &IV, TEXT).unwrap();
        assert_eq!(
            hex::encode(&ct),
            "413db22f2f244b9479fbe747d91355afcba792be93dd42fb98ff3e08b742ac8c"
        );
        assert_eq!(cbc_decrypt(&seed, &IV, &ct).unwrap(), TEXT);
    }

    #[test]
    fn cfb_matches_openssl() {
        let seed = Seed::new(&KEY);
        let ct = cfb_encrypt(&seed, &IV, TEXT).unwrap();
        assert_eq!(hex::encode(&ct), "804e16309e80312fd5cf22b68ee22f7fcdf1c76a57fceb2772");
        assert_eq!(cfb_decrypt(&seed, &IV, &ct).unwrap(), TEXT);
    }

    #[test]
    fn ofb_is_an_involution() {
        let seed = Seed::new(&KEY);
        let ct = ofb_apply(&seed, &IV, TEXT).unwrap();
        assert_eq!(ct.len(), TEXT.len());
        assert_eq!(ofb_apply(&seed, &IV, &ct).unwrap(), TEXT);
    }

    #[test]
    fn bad_padding_is_rejected() {
        let seed = Seed::new(&KEY);
        let mut ct = ecb_encrypt(&seed, b"");
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert_eq!(ecb_decrypt(&seed, &ct), Err(CryptoError::DecryptionFailed));
        assert_eq!(ecb_decrypt(&seed, &[0u8; 15]), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn wrong_sizes_are_errors() {
        assert!(Seed::from_slice(&[0u8; 15]).is_err());
        let seed = Seed::new(&KEY);
        assert_eq!(
            cbc_encrypt(&seed, &[0u8; 8], TEXT),
            Err(CryptoError::InvalidIvLength { expected: 16, actual: 8 })
        );
    }
}
