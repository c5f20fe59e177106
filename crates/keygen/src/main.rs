//! `keygen` — key provisioning binary.
//!
//! Startup sequence:
//! 1. Load and validate [`config::Config`] from environment variables.
//! 2. Initialise structured JSON logging on stderr.
//! 3. Generate the requested key material and print or write it.

mod config;
mod keygen;
mod telemetry;

use anyhow::Result;

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        eprintln!("ERROR: keygen configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 3. Keys
    // -----------------------------------------------------------------------
    let stdout = std::io::stdout();
    keygen::run(&cfg, &mut stdout.lock())
}
