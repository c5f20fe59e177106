//! Errors produced by the envelope codec.

use thiserror::Error;

/// Errors produced while building or opening an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Key material could not be parsed: wrong length, bad hex or bad PEM.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// The envelope string does not have the expected structure.
    #[error("invalid encryption data: {0}")]
    InvalidEnvelope(String),

    /// An RSA or AES operation failed: wrong key, corrupted ciphertext or bad padding.
    #[error("decryption failed: {0}")]
    CryptoFailure(String),
}

impl CodecError {
    pub(crate) fn field_count(expected: usize, got: usize) -> Self {
        CodecError::InvalidEnvelope(format!("expected {expected} fields, got {got}"))
    }
}
