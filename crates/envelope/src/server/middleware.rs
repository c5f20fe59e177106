//! Envelope layers chosen from the configured key material.

use crate::config::KeyMaterial;
use crate::middleware::{asymmetric, symmetric, DecryptRequestLayer, EncryptResponseLayer};

/// Build the request-decrypting and response-encrypting layers for `keys`.
///
/// In asymmetric mode requests are opened with our private key and responses
/// are sealed for the peer's public key.
pub fn envelope_layers(
    keys: &KeyMaterial,
    body_limit: usize,
) -> (DecryptRequestLayer, EncryptResponseLayer) {
    let (decrypt, encrypt) = match keys {
        KeyMaterial::Symmetric(secret) => (
            symmetric::decrypt_request(secret.clone()),
            symmetric::encrypt_response(secret.clone()),
        ),
        KeyMaterial::Asymmetric {
            private_key,
            peer_public_key,
        } => (
            asymmetric::decrypt_request(private_key.clone()),
            asymmetric::encrypt_response(peer_public_key.clone()),
        ),
    };
    (
        decrypt.with_body_limit(body_limit),
        encrypt.with_body_limit(body_limit),
    )
}
