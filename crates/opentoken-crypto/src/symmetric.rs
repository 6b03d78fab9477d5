//! Symmetric encryption dispatch over registry cipher suites
//!
//! CBC and ECB pad with PKCS#7; the feedback modes are unpadded. Key and IV
//! sizes must already match the descriptor.
//!
//! OFB keys the block primitive first: the `ofb` wrapper's own constructor
//! only accepts the primitive's default key size, which rejects the 16-byte
//! Blowfish and RC2 keys.

use cipher::{
    AsyncStreamCipher, BlockDecryptMut, BlockEncryptMut, InnerIvInit, KeyInit, KeyIvInit, StreamCipher,
    block_padding::Pkcs7,
};

use crate::{
    error::CryptoError,
    registry::{BlockPrimitive, CipherDescriptor, Mode},
    seed::{self, Seed},
};

macro_rules! seal_with {
    ($c:ty, $mode:expr, $key:expr, $iv:expr, $data:expr, $err:expr) => {
        match $mode {
            Mode::Cbc => cbc::Encryptor::<$c>::new_from_slices($key, $iv)
                .map_err(|_| $err.clone())?
                .encrypt_padded_vec_mut::<Pkcs7>($data),
            Mode::Ecb => {
                ecb::Encryptor::<$c>::new_from_slice($key).map_err(|_| $err.clone())?.encrypt_padded_vec_mut::<Pkcs7>($data)
            },
            Mode::Cfb => {
                let mut buf = $data.to_vec();
                cfb_mode::Encryptor::<$c>::new_from_slices($key, $iv).map_err(|_| $err.clone())?.encrypt(&mut buf);
                buf
            },
            Mode::Cfb8 => {
                let mut buf = $data.to_vec();
                cfb8::Encryptor::<$c>::new_from_slices($key, $iv).map_err(|_| $err.clone())?.encrypt(&mut buf);
                buf
            },
            Mode::Ofb => {
                let mut buf = $data.to_vec();
                let block = <$c>::new_from_slice($key).map_err(|_| $err.clone())?;
                let core = ofb::OfbCore::<$c>::inner_iv_slice_init(block, $iv).map_err(|_| $err.clone())?;
                ofb::Ofb::<$c>::from_core(core).apply_keystream(&mut buf);
                buf
            },
        }
    };
}

macro_rules! open_with {
    ($c:ty, $mode:expr, $key:expr, $iv:expr, $data:expr, $err:expr) => {
        match $mode {
            Mode::Cbc => cbc::Decryptor::<$c>::new_from_slices($key, $iv)
                .map_err(|_| $err.clone())?
                .decrypt_padded_vec_mut::<Pkcs7>($data)
                .map_err(|_| CryptoError::DecryptionFailed)?,
            Mode::Ecb => ecb::Decryptor::<$c>::new_from_slice($key)
                .map_err(|_| $err.clone())?
                .decrypt_padded_vec_mut::<Pkcs7>($data)
                .map_err(|_| CryptoError::DecryptionFailed)?,
            Mode::Cfb => {
                let mut buf = $data.to_vec();
                cfb_mode::Decryptor::<$c>::new_from_slices($key, $iv).map_err(|_| $err.clone())?.decrypt(&mut buf);
                buf
            },
            Mode::Cfb8 => {
                let mut buf = $data.to_vec();
                cfb8::Decryptor::<$c>::new_from_slices($key, $iv).map_err(|_| $err.clone())?.decrypt(&mut buf);
                buf
            },
            Mode::Ofb => {
                let mut buf = $data.to_vec();
                let block = <$c>::new_from_slice($key).map_err(|_| $err.clone())?;
                let core = ofb::OfbCore::<$c>::inner_iv_slice_init(block, $iv).map_err(|_| $err.clone())?;
                ofb::Ofb::<$c>::from_core(core).apply_keystream(&mut buf);
                buf
            },
        }
    };
}

/// Encrypt `plaintext` with the cipher described by `descriptor`.
pub fn seal(
    descriptor: &CipherDescriptor,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let suite = descriptor.suite_for(crate::AlgorithmField::CipherAlgorithm)?;
    check_sizes(descriptor, key, iv)?;
    let err = CryptoError::InvalidKeyLength { algorithm: descriptor.name };

    let ciphertext = match suite.primitive {
        BlockPrimitive::Aes128 => seal_with!(aes::Aes128, suite.mode, key, iv, plaintext, err),
        BlockPrimitive::Aes192 => seal_with!(aes::Aes192, suite.mode, key, iv, plaintext, err),
        BlockPrimitive::Aes256 => seal_with!(aes::Aes256, suite.mode, key, iv, plaintext, err),
        BlockPrimitive::Blowfish => {
            seal_with!(blowfish::Blowfish, suite.mode, key, iv, plaintext, err)
        },
        BlockPrimitive::Cast5 => seal_with!(cast5::Cast5, suite.mode, key, iv, plaintext, err),
        BlockPrimitive::Des => seal_with!(des::Des, suite.mode, key, iv, plaintext, err),
        BlockPrimitive::TdesEde2 => seal_with!(des::TdesEde2, suite.mode, key, iv, plaintext, err),
        BlockPrimitive::TdesEde3 => seal_with!(des::TdesEde3, suite.mode, key, iv, plaintext, err),
        BlockPrimitive::Rc2 => seal_with!(rc2::Rc2, suite.mode, key, iv, plaintext, err),
        BlockPrimitive::Seed => {
            let cipher = Seed::from_slice(key)?;
            match suite.mode {
                Mode::Cbc => seed::cbc_encrypt(&cipher, iv, plaintext)?,
                Mode::Ecb => seed::ecb_encrypt(&cipher, plaintext),
                Mode::Cfb => seed::cfb_encrypt(&cipher, iv, plaintext)?,
                Mode::Cfb8 => return Err(err),
                Mode::Ofb => seed::ofb_apply(&cipher, iv, plaintext)?,
            }
        },
    };
    Ok(ciphertext)
}

/// Decrypt `ciphertext` with the cipher described by `descriptor`.
pub fn open(
    descriptor: &CipherDescriptor,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let suite = descriptor.suite_for(crate::AlgorithmField::CipherAlgorithm)?;
    check_sizes(descriptor, key, iv)?;
    let err = CryptoError::InvalidKeyLength { algorithm: descriptor.name };

    let plaintext = match suite.primitive {
        BlockPrimitive::Aes128 => open_with!(aes::Aes128, suite.mode, key, iv, ciphertext, err),
        BlockPrimitive::Aes192 => open_with!(aes::Aes192, suite.mode, key, iv, ciphertext, err),
        BlockPrimitive::Aes256 => open_with!(aes::Aes256, suite.mode, key, iv, ciphertext, err),
        BlockPrimitive::Blowfish => {
            open_with!(blowfish::Blowfish, suite.mode, key, iv, ciphertext, err)
        },
        BlockPrimitive::Cast5 => open_with!(cast5::Cast5, suite.mode, key, iv, ciphertext, err),
        BlockPrimitive::Des => open_with!(des::Des, suite.mode, key, iv, ciphertext, err),
        BlockPrimitive::TdesEde2 => {
            open_with!(des::TdesEde2, suite.mode, key, iv, ciphertext, err)
        },
        BlockPrimitive::TdesEde3 => {
            open_with!(des::TdesEde3, suite.mode, key, iv, ciphertext, err)
        },
        BlockPrimitive::Rc2 => open_with!(rc2::Rc2, suite.mode, key, iv, ciphertext, err),
        BlockPrimitive::Seed => {
            let cipher = Seed::from_slice(key)?;
            match suite.mode {
                Mode::Cbc => seed::cbc_decrypt(&cipher, iv, ciphertext)?,
                Mode::Ecb => seed::ecb_decrypt(&cipher, ciphertext)?,
                Mode::Cfb => seed::cfb_decrypt(&cipher, iv, ciphertext)?,
                Mode::Cfb8 => return Err(err),
                Mode::Ofb => seed::ofb_apply(&cipher, iv, ciphertext)?,
            }
        },
    };
    Ok(plaintext)
}

fn check_sizes(descriptor: &CipherDescriptor, key: &[u8], iv: &[u8]) -> Result<(), CryptoError> {
    if key.len() != descriptor.key_bytes {
        return Err(CryptoError::InvalidKeyLength { algorithm: descriptor.name });
    }
    if iv.len() != descriptor.iv_bytes {
        return Err(CryptoError::InvalidIvLength { expected: descriptor.iv_bytes, actual: iv.len() });
    }
    Ok(())
}
