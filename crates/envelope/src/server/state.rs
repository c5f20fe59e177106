//! Shared application state injected into every Axum handler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::{Config, KeyMaterial, Mode};
use crate::keys::SecretKey;
use crate::middleware::DEFAULT_BODY_LIMIT;

/// Application state shared across all request handlers.
///
/// Cheap to clone: key material sits behind an `Arc` and is never mutated.
#[derive(Clone)]
pub struct AppState {
    /// Envelope variant, derived from the key material.
    pub mode: Mode,
    /// Keys handed to the envelope layers when the router is built.
    pub keys: Arc<KeyMaterial>,
    /// Buffering cap for both envelope layers.
    pub max_body_bytes: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl AppState {
    /// Create a new [`AppState`] around already-loaded key material.
    pub fn new(keys: KeyMaterial, max_body_bytes: usize, request_timeout: Duration) -> Self {
        let mode = match keys {
            KeyMaterial::Symmetric(_) => Mode::Symmetric,
            KeyMaterial::Asymmetric { .. } => Mode::Asymmetric,
        };
        Self {
            mode,
            keys: Arc::new(keys),
            max_body_bytes,
            request_timeout,
        }
    }

    /// Load key material as configured and build the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the key material cannot be loaded.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(
            cfg.key_material()?,
            cfg.max_body_bytes,
            Duration::from_secs(cfg.request_timeout_secs),
        ))
    }
}

impl Default for AppState {
    /// Symmetric state with a freshly generated secret, suitable for tests.
    fn default() -> Self {
        Self::new(
            KeyMaterial::Symmetric(SecretKey::generate()),
            DEFAULT_BODY_LIMIT,
            Duration::from_secs(30),
        )
    }
}
