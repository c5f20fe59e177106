//! Envelope codec: stateless encrypt/decrypt of UTF-8 payloads into
//! colon-delimited envelope strings.
//!
//! This module is free of HTTP dependencies. Every call draws its own IV
//! (and, for the asymmetric variant, its own session key), so the functions
//! are safe to call concurrently without locking.
//!
//! # Envelope formats
//!
//! ```text
//! symmetric:  <iv_hex>:<ciphertext_hex>
//! asymmetric: <ciphertext_hex>:<wrapped_key_b64>:<iv_hex>
//! ```
//!
//! Neither format carries a version prefix; peers agree on the variant out of
//! band.

pub mod asymmetric;
pub mod cipher;
pub mod error;
pub mod symmetric;

pub use cipher::{IV_LEN, KEY_LEN};
pub use error::CodecError;

/// Field separator of both envelope formats.
pub const SEPARATOR: char = ':';

/// Turns plaintext into an envelope. Implemented by the key a sender holds.
#[cfg_attr(test, mockall::automock)]
pub trait Seal: Send + Sync {
    /// Encrypt `plaintext` into an envelope string.
    fn seal(&self, plaintext: &str) -> Result<String, CodecError>;
}

/// Turns an envelope back into plaintext. Implemented by the key a receiver holds.
#[cfg_attr(test, mockall::automock)]
pub trait Open: Send + Sync {
    /// Decrypt an envelope string.
    fn open(&self, envelope: &str) -> Result<String, CodecError>;
}

fn decode_hex(field: &str, what: &str) -> Result<Vec<u8>, CodecError> {
    hex::decode(field).map_err(|_| CodecError::InvalidEnvelope(format!("{what} is not hex")))
}

fn decode_iv(field: &str) -> Result<[u8; IV_LEN], CodecError> {
    decode_hex(field, "iv")?.try_into().map_err(|bytes: Vec<u8>| {
        CodecError::InvalidEnvelope(format!("iv must be {IV_LEN} bytes, got {}", bytes.len()))
    })
}
