//! Common error types shared across crates.

use thiserror::Error;

/// Errors the service reports to callers.
///
/// Variants map to HTTP status codes:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::PayloadTooLarge`] → 413
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed, e.g. a body that is not valid JSON.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No route matches the request.
    #[error("the requested resource does not exist")]
    NotFound,

    /// The body exceeded the configured buffering limit.
    #[error("payload too large: limit is {0} bytes")]
    PayloadTooLarge(usize),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotFound => 404,
            ServiceError::PayloadTooLarge(_) => 413,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::NotFound.http_status(), 404);
        assert_eq!(ServiceError::PayloadTooLarge(10).http_status(), 413);
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::BadRequest("body is not valid JSON".into());
        assert!(e.to_string().contains("body is not valid JSON"));
        assert!(ServiceError::PayloadTooLarge(1024).to_string().contains("1024"));
    }
}
