//! Configuration loading and validation for the keygen tool.

use std::path::PathBuf;

use anyhow::{Context, Result};
use envelope::keys::{MIN_RSA_KEY_BITS, RSA_KEY_BITS};
use serde::Deserialize;

/// What to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// 32-byte shared secret for the symmetric envelope.
    Secret,
    /// RSA key pair for the asymmetric envelope.
    Rsa,
}

/// Validated keygen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_kind")]
    pub keygen_kind: Kind,

    /// Directory to write key files into. Keys go to stdout when unset.
    #[serde(default)]
    pub keygen_out_dir: Option<PathBuf>,

    /// RSA modulus size; ignored for secrets.
    #[serde(default = "default_rsa_bits")]
    pub keygen_rsa_bits: usize,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_kind() -> Kind {
    Kind::Secret
}
fn default_rsa_bits() -> usize {
    RSA_KEY_BITS
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build keygen configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise keygen configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.keygen_rsa_bits < MIN_RSA_KEY_BITS {
            anyhow::bail!("KEYGEN_RSA_BITS must be at least {MIN_RSA_KEY_BITS}");
        }
        if self
            .keygen_out_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            anyhow::bail!("KEYGEN_OUT_DIR must not be empty when set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config {
            keygen_kind: default_kind(),
            keygen_out_dir: None,
            keygen_rsa_bits: default_rsa_bits(),
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults() {
        assert_eq!(default_kind(), Kind::Secret);
        assert_eq!(default_rsa_bits(), 4096);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(cfg().validate().is_ok());
    }

    #[test]
    fn validate_rejects_small_modulus() {
        let mut c = cfg();
        c.keygen_kind = Kind::Rsa;
        c.keygen_rsa_bits = 1024;
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_out_dir() {
        let mut c = cfg();
        c.keygen_out_dir = Some(PathBuf::new());
        assert!(c.validate().is_err());
    }
}
