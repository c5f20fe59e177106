//! Hybrid encryption envelopes for HTTP bodies.
//!
//! - [`codec`]: text envelopes. Symmetric (`iv_hex:ciphertext_hex`, AES-256-CBC
//!   under a pre-shared key) and asymmetric
//!   (`ciphertext_hex:wrapped_key_b64:iv_hex`, a fresh AES session key wrapped
//!   with RSA-OAEP).
//! - [`keys`]: key types and provisioning helpers.
//! - [`middleware`]: tower layers that decrypt `{"encrypted": ...}` request
//!   bodies and encrypt response bodies.
//! - [`server`], [`config`], [`telemetry`]: the `envelope-svc` host service.

pub mod codec;
pub mod config;
pub mod keys;
pub mod middleware;
pub mod server;
pub mod telemetry;

pub use codec::asymmetric::{decrypt as decrypt_asymmetric, encrypt as encrypt_asymmetric};
pub use codec::symmetric::{decrypt as decrypt_symmetric, encrypt as encrypt_symmetric};
pub use codec::{CodecError, Open, Seal};
pub use keys::{create_key_pair, create_secret_key, KeyPair, PrivateKey, PublicKey, SecretKey};
