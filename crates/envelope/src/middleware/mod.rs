//! Body transform middleware: one layer per direction per envelope variant.
//!
//! ```text
//! request  ─▶ DecryptRequestLayer ─▶ handler
//! response ◀─ EncryptResponseLayer ◀─ handler
//! ```
//!
//! Both directions swallow codec failures and keep the pipeline moving. A
//! request body that is still `{"encrypted": ...}` when it reaches a handler
//! means decryption failed; the layer logs a warning when that happens.
//!
//! ```rust,no_run
//! use axum::{routing::post, Router};
//! use envelope::{middleware, SecretKey};
//!
//! # fn build(secret: SecretKey) -> Router {
//! Router::new()
//!     .route("/orders", post(|body: String| async move { body }))
//!     .layer(middleware::symmetric::decrypt_request(secret.clone()))
//!     .layer(middleware::symmetric::encrypt_response(secret))
//! # }
//! ```

pub mod body;
pub mod layer;

pub use layer::{DecryptRequest, DecryptRequestLayer, EncryptResponse, EncryptResponseLayer};

/// Largest body either layer buffers unless configured otherwise (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Layers for the pre-shared-key envelope.
pub mod symmetric {
    use super::{DecryptRequestLayer, EncryptResponseLayer};
    use crate::keys::SecretKey;

    /// Encrypt every response body under `secret`.
    pub fn encrypt_response(secret: SecretKey) -> EncryptResponseLayer {
        EncryptResponseLayer::new(secret)
    }

    /// Decrypt `{"encrypted": ...}` JSON request bodies under `secret`.
    pub fn decrypt_request(secret: SecretKey) -> DecryptRequestLayer {
        DecryptRequestLayer::new(secret)
    }
}

/// Layers for the hybrid RSA + AES envelope.
pub mod asymmetric {
    use super::{DecryptRequestLayer, EncryptResponseLayer};
    use crate::keys::{PrivateKey, PublicKey};

    /// Encrypt every response body for the holder of `peer_public_key`.
    pub fn encrypt_response(peer_public_key: PublicKey) -> EncryptResponseLayer {
        EncryptResponseLayer::new(peer_public_key)
    }

    /// Decrypt `{"encrypted": ...}` JSON request bodies with our own `private_key`.
    pub fn decrypt_request(private_key: PrivateKey) -> DecryptRequestLayer {
        DecryptRequestLayer::new(private_key)
    }
}
