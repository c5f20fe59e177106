//! Pre-shared-key envelope: `<iv_hex>:<ciphertext_hex>`.

use std::fmt;
use std::str::FromStr;

use super::cipher::{self, random_bytes, IV_LEN};
use super::{decode_hex, decode_iv, CodecError, Open, Seal, SEPARATOR};
use crate::keys::SecretKey;

/// A parsed symmetric envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricEnvelope {
    /// CBC initialisation vector.
    pub iv: [u8; IV_LEN],
    /// AES-256-CBC ciphertext.
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for SymmetricEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}",
            hex::encode(self.iv),
            hex::encode(&self.ciphertext)
        )
    }
}

impl FromStr for SymmetricEnvelope {
    type Err = CodecError;

    /// # Errors
    ///
    /// Returns [`CodecError::InvalidEnvelope`] unless `s` is exactly two
    /// `:`-separated hex fields with a 16-byte IV.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        let [iv, ciphertext] = parts.as_slice() else {
            return Err(CodecError::field_count(2, parts.len()));
        };
        Ok(Self {
            iv: decode_iv(iv)?,
            ciphertext: decode_hex(ciphertext, "ciphertext")?,
        })
    }
}

/// Encrypt `plaintext` under the shared secret with a fresh random IV.
///
/// # Errors
///
/// Returns [`CodecError::InvalidKey`] only if the key is unusable, which a
/// constructed [`SecretKey`] never is.
pub fn encrypt(secret: &SecretKey, plaintext: &str) -> Result<String, CodecError> {
    let iv = random_bytes::<IV_LEN>();
    let ciphertext = cipher::encrypt(secret.as_bytes(), &iv, plaintext.as_bytes())?;
    Ok(SymmetricEnvelope { iv, ciphertext }.to_string())
}

/// Decrypt an envelope produced by [`encrypt`] under the same secret.
///
/// # Errors
///
/// Returns [`CodecError::InvalidEnvelope`] if the envelope does not parse and
/// [`CodecError::CryptoFailure`] for a wrong key or tampered ciphertext.
pub fn decrypt(secret: &SecretKey, envelope: &str) -> Result<String, CodecError> {
    let envelope: SymmetricEnvelope = envelope.parse()?;
    cipher::decrypt(secret.as_bytes(), &envelope.iv, &envelope.ciphertext)
}

impl Seal for SecretKey {
    fn seal(&self, plaintext: &str) -> Result<String, CodecError> {
        encrypt(self, plaintext)
    }
}

impl Open for SecretKey {
    fn open(&self, envelope: &str) -> Result<String, CodecError> {
        decrypt(self, envelope)
    }
}
