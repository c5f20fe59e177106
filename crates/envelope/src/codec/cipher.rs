//! AES-256-CBC with PKCS#7 padding: the block cipher shared by both envelope variants.
//!
//! CBC is unauthenticated. Tampering is only detected when it breaks the
//! padding or the UTF-8 decoding of the plaintext, which is what the envelope
//! format has always relied on.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};

use super::error::CodecError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of a CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Fill a fresh array from the OS CSPRNG.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Encrypt `plaintext` under `key` and `iv`.
///
/// # Errors
///
/// Returns [`CodecError::InvalidKey`] if `key` is not [`KEY_LEN`] bytes.
pub fn encrypt(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| invalid_key_len(key))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt `ciphertext` under `key` and `iv` and return the plaintext as UTF-8.
///
/// # Errors
///
/// Returns [`CodecError::InvalidKey`] for a wrong-length key and
/// [`CodecError::CryptoFailure`] when the ciphertext is not a whole number of
/// blocks, the padding is invalid or the result is not UTF-8. The last three
/// cases are not told apart: a wrong key and tampered data look the same.
pub fn decrypt(key: &[u8], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<String, CodecError> {
    let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| invalid_key_len(key))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CodecError::CryptoFailure("bad decrypt".into()))?;
    String::from_utf8(plaintext).map_err(|_| CodecError::CryptoFailure("bad decrypt".into()))
}

fn invalid_key_len(key: &[u8]) -> CodecError {
    CodecError::InvalidKey(format!(
        "expected {KEY_LEN} key bytes, got {}",
        key.len()
    ))
}
