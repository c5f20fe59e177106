//! Configuration loading and validation for the `envelope-svc` host service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::keys::{PrivateKey, PublicKey, SecretKey};

/// Which envelope variant the service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Symmetric,
    Asymmetric,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Symmetric => "symmetric",
            Mode::Asymmetric => "asymmetric",
        }
    }
}

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Envelope variant.
    #[serde(default = "default_mode")]
    pub envelope_mode: Mode,

    /// 64 hex digits. **Required** in symmetric mode.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Own PKCS#8 PEM private key. **Required** in asymmetric mode.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// Peer SPKI PEM public key that responses are sealed for. **Required** in
    /// asymmetric mode.
    #[serde(default)]
    pub peer_public_key_path: Option<PathBuf>,

    /// Port the HTTP server listens on.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Largest request or response body the middleware buffers.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_mode() -> Mode {
    Mode::Symmetric
}
fn default_http_port() -> u16 {
    8080
}
fn default_max_body_bytes() -> usize {
    crate::middleware::DEFAULT_BODY_LIMIT
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("envelope_mode", &self.envelope_mode)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("private_key_path", &self.private_key_path)
            .field("peer_public_key_path", &self.peer_public_key_path)
            .field("http_port", &self.http_port)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Key material loaded according to [`Config::envelope_mode`].
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    Symmetric(SecretKey),
    Asymmetric {
        private_key: PrivateKey,
        peer_public_key: PublicKey,
    },
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        match self.envelope_mode {
            Mode::Symmetric => {
                let secret = required(&self.secret_key, "SECRET_KEY")?;
                SecretKey::from_hex(secret).context("SECRET_KEY must be 64 hex digits")?;
            }
            Mode::Asymmetric => {
                required_path(&self.private_key_path, "PRIVATE_KEY_PATH")?;
                required_path(&self.peer_public_key_path, "PEER_PUBLIC_KEY_PATH")?;
            }
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be > 0");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }

    /// Parse the shared secret, or read and parse the PEM files.
    ///
    /// # Errors
    ///
    /// Returns an error if a key file cannot be read or any key does not parse.
    pub fn key_material(&self) -> Result<KeyMaterial> {
        match self.envelope_mode {
            Mode::Symmetric => {
                let secret = required(&self.secret_key, "SECRET_KEY")?;
                Ok(KeyMaterial::Symmetric(
                    SecretKey::from_hex(secret).context("SECRET_KEY is invalid")?,
                ))
            }
            Mode::Asymmetric => {
                let private_pem =
                    read_pem(required_path(&self.private_key_path, "PRIVATE_KEY_PATH")?)?;
                let public_pem =
                    read_pem(required_path(&self.peer_public_key_path, "PEER_PUBLIC_KEY_PATH")?)?;
                Ok(KeyMaterial::Asymmetric {
                    private_key: PrivateKey::from_pem(&private_pem)
                        .context("PRIVATE_KEY_PATH does not hold a private key")?,
                    peer_public_key: PublicKey::from_pem(&public_pem)
                        .context("PEER_PUBLIC_KEY_PATH does not hold a public key")?,
                })
            }
        }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => anyhow::bail!("{name} is required and must not be empty"),
    }
}

fn required_path<'a>(value: &'a Option<PathBuf>, name: &str) -> Result<&'a Path> {
    match value.as_deref() {
        Some(p) if !p.as_os_str().is_empty() => Ok(p),
        _ => anyhow::bail!("{name} is required in asymmetric mode"),
    }
}

fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
