//! Axum router construction.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Only the business routes sit behind the envelope layers; `/health` and the
/// 404 fallback answer in plaintext.
pub fn build(state: AppState) -> Router {
    let (decrypt, encrypt) = middleware::envelope_layers(&state.keys, state.max_body_bytes);

    let sealed = Router::new()
        .route("/echo", post(handlers::echo))
        .layer(decrypt)
        .layer(encrypt);

    Router::new()
        .route("/health", get(handlers::health))
        .merge(sealed)
        .fallback(handlers::not_found)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
