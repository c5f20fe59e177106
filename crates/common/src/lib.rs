//! Common types, protocol definitions, and errors shared across `sealed-body` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
pub use protocol::{ApiResponse, EncryptedBody};
