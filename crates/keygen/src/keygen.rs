//! Key generation and output.
//!
//! Key material is written either to `out` (stdout in the binary) or to files
//! under `KEYGEN_OUT_DIR`. It never reaches the logs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use envelope::keys::{create_secret_key, KeyPair};
use tracing::info;

use crate::config::{Config, Kind};

pub const SECRET_FILE: &str = "secret.hex";
pub const PUBLIC_KEY_FILE: &str = "public.pem";
pub const PRIVATE_KEY_FILE: &str = "private.pem";

/// Generate the configured key material and emit it.
///
/// # Errors
///
/// Returns an error if generation fails or the output cannot be written.
pub fn run(cfg: &Config, out: &mut impl Write) -> Result<()> {
    match cfg.keygen_kind {
        Kind::Secret => {
            let secret = create_secret_key();
            match &cfg.keygen_out_dir {
                Some(dir) => {
                    let path = write_key_file(dir, SECRET_FILE, &secret, true)?;
                    info!(path = %path.display(), "shared secret written");
                }
                None => {
                    writeln!(out, "SECRET_KEY={secret}")?;
                    info!("shared secret printed");
                }
            }
        }
        Kind::Rsa => {
            info!(bits = cfg.keygen_rsa_bits, "generating RSA key pair");
            let pair = KeyPair::generate(cfg.keygen_rsa_bits)
                .context("RSA key pair generation failed")?;
            match &cfg.keygen_out_dir {
                Some(dir) => {
                    let public = write_key_file(dir, PUBLIC_KEY_FILE, &pair.public_key, false)?;
                    let private = write_key_file(dir, PRIVATE_KEY_FILE, &pair.private_key, true)?;
                    info!(
                        public = %public.display(),
                        private = %private.display(),
                        "RSA key pair written"
                    );
                }
                None => {
                    out.write_all(pair.public_key.as_bytes())?;
                    out.write_all(pair.private_key.as_bytes())?;
                    info!("RSA key pair printed");
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Write `contents` to `dir/name`, creating `dir` if needed.
///
/// Private files are created with mode 0600 on Unix and tightened before any
/// key bytes are written.
fn write_key_file(dir: &Path, name: &str, contents: &str, private: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(name);

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if private {
        owner_only(&mut options);
    }
    let mut file = options
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    // `mode` only applies on creation; tighten a file that already existed.
    if private {
        restrict_to_owner(&path)?;
    }
    file.write_all(contents.as_bytes())
        .and_then(|()| file.sync_all())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(unix)]
fn owner_only(options: &mut OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;

    options.mode(0o600);
}

#[cfg(not(unix))]
fn owner_only(_options: &mut OpenOptions) {}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}
