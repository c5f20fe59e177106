//! Axum HTTP server, routing, and middleware for `envelope-svc`.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Put the envelope layers in front of every business route.
//! - Inject shared application state (`AppState`) into handlers.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
