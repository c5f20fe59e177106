//! Structured logging for the host service.
//!
//! # Telemetry invariants
//!
//! - **No key material and no plaintext bodies** in any span field or log event.
//!   Codec errors are logged by their message only, which never embeds input.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).
//! - Logs stay on stdout; shipping them elsewhere is the platform's job.

pub mod init;

pub use init::init_telemetry;
