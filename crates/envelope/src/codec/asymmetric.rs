//! Hybrid RSA + AES envelope: `<ciphertext_hex>:<wrapped_key_b64>:<iv_hex>`.
//!
//! Each call draws a fresh 32-byte session key, encrypts the payload with it
//! under AES-256-CBC and wraps only the session key with the recipient's RSA
//! public key (OAEP, SHA-1).

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rsa::Oaep;
use sha1::Sha1;

use super::cipher::{self, random_bytes, IV_LEN, KEY_LEN};
use super::{decode_hex, decode_iv, CodecError, Open, Seal, SEPARATOR};
use crate::keys::{PrivateKey, PublicKey};

/// A parsed asymmetric envelope. Field order matches the wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedEnvelope {
    /// AES-256-CBC ciphertext under the session key.
    pub ciphertext: Vec<u8>,
    /// RSA-OAEP encryption of the session key.
    pub wrapped_key: Vec<u8>,
    /// CBC initialisation vector.
    pub iv: [u8; IV_LEN],
}

impl fmt::Display for SealedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(&self.ciphertext),
            STANDARD.encode(&self.wrapped_key),
            hex::encode(self.iv),
        )
    }
}

impl FromStr for SealedEnvelope {
    type Err = CodecError;

    /// # Errors
    ///
    /// Returns [`CodecError::InvalidEnvelope`] unless `s` is exactly three
    /// `:`-separated fields: hex ciphertext, base64 wrapped key, 16-byte hex IV.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        let [ciphertext, wrapped_key, iv] = parts.as_slice() else {
            return Err(CodecError::field_count(3, parts.len()));
        };
        let wrapped_key = STANDARD
            .decode(wrapped_key)
            .map_err(|_| CodecError::InvalidEnvelope("wrapped key is not base64".into()))?;
        Ok(Self {
            ciphertext: decode_hex(ciphertext, "ciphertext")?,
            wrapped_key,
            iv: decode_iv(iv)?,
        })
    }
}

fn padding() -> Oaep {
    Oaep::new::<Sha1>()
}

/// Encrypt `plaintext` for the holder of the private half of `public_key`.
///
/// # Errors
///
/// Returns [`CodecError::CryptoFailure`] if RSA wrapping fails, e.g. for a
/// modulus too small to hold the session key.
pub fn encrypt(public_key: &PublicKey, plaintext: &str) -> Result<String, CodecError> {
    let iv = random_bytes::<IV_LEN>();
    let mut session_key = random_bytes::<KEY_LEN>();

    let sealed = public_key
        .rsa()
        .encrypt(&mut OsRng, padding(), &session_key)
        .map_err(|e| CodecError::CryptoFailure(format!("session key wrap failed: {e}")))
        .and_then(|wrapped_key| {
            let ciphertext = cipher::encrypt(&session_key, &iv, plaintext.as_bytes())?;
            Ok(SealedEnvelope {
                ciphertext,
                wrapped_key,
                iv,
            })
        });
    session_key.iter_mut().for_each(|b| *b = 0);

    Ok(sealed?.to_string())
}

/// Decrypt an envelope produced by [`encrypt`] for the matching public key.
///
/// # Errors
///
/// Returns [`CodecError::InvalidEnvelope`] ("invalid encryption data") if the
/// envelope does not split into three valid fields, and
/// [`CodecError::CryptoFailure`] if the session key cannot be unwrapped (wrong
/// private key) or the payload does not decrypt (tampered data).
pub fn decrypt(private_key: &PrivateKey, envelope: &str) -> Result<String, CodecError> {
    let envelope: SealedEnvelope = envelope.parse()?;

    let mut unwrapped = private_key
        .rsa()
        .decrypt(padding(), &envelope.wrapped_key)
        .map_err(|_| CodecError::CryptoFailure("session key unwrap failed".into()))?;
    let session_key = session_key_bytes(&unwrapped);
    unwrapped.iter_mut().for_each(|b| *b = 0);

    let mut session_key = session_key?;
    let plaintext = cipher::decrypt(&session_key, &envelope.iv, &envelope.ciphertext);
    session_key.iter_mut().for_each(|b| *b = 0);
    plaintext
}

/// Raw 32 bytes are the key. Peers that wrap the hex text of the key send 64
/// hex digits instead, which decode to the same 32 bytes.
fn session_key_bytes(unwrapped: &[u8]) -> Result<[u8; KEY_LEN], CodecError> {
    let bytes = match unwrapped.len() {
        KEY_LEN => unwrapped.to_vec(),
        len if len == 2 * KEY_LEN => hex::decode(unwrapped)
            .map_err(|_| CodecError::CryptoFailure("session key is not hex".into()))?,
        len => {
            return Err(CodecError::CryptoFailure(format!(
                "session key has {len} bytes, expected {KEY_LEN}"
            )))
        }
    };
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}

impl Seal for PublicKey {
    fn seal(&self, plaintext: &str) -> Result<String, CodecError> {
        encrypt(self, plaintext)
    }
}

impl Open for PrivateKey {
    fn open(&self, envelope: &str) -> Result<String, CodecError> {
        decrypt(self, envelope)
    }
}
