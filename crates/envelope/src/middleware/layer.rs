//! Tower layers that rewrite HTTP bodies through the envelope codec.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue,
    },
    response::{IntoResponse, Response},
};
use common::ServiceError;
use tower::{Layer, Service};
use tracing::{debug, error, warn};

use super::body::{is_json, open_body, seal_body, Opened};
use super::DEFAULT_BODY_LIMIT;
use crate::codec::{Open, Seal};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// ---------------------------------------------------------------------------
// Response encryption
// ---------------------------------------------------------------------------

/// Layer that replaces every non-empty response body with `{"encrypted": "<envelope>"}`.
///
/// Bodies larger than the limit are sent unencrypted and logged at `error`.
#[derive(Clone)]
pub struct EncryptResponseLayer {
    sealer: Arc<dyn Seal>,
    limit: usize,
}

impl EncryptResponseLayer {
    /// Seal responses with `sealer`, encrypting bodies of up to [`DEFAULT_BODY_LIMIT`] bytes.
    pub fn new(sealer: impl Seal + 'static) -> Self {
        Self {
            sealer: Arc::new(sealer),
            limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Override the buffering limit.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl<S> Layer<S> for EncryptResponseLayer {
    type Service = EncryptResponse<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EncryptResponse {
            inner,
            sealer: Arc::clone(&self.sealer),
            limit: self.limit,
        }
    }
}

/// Service produced by [`EncryptResponseLayer`].
#[derive(Clone)]
pub struct EncryptResponse<S> {
    inner: S,
    sealer: Arc<dyn Seal>,
    limit: usize,
}

impl<S> Service<Request> for EncryptResponse<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Take the service that was driven to readiness; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let sealer = Arc::clone(&self.sealer);
        let limit = self.limit;

        Box::pin(async move {
            let response = inner.call(req).await?;
            Ok(seal_response(sealer.as_ref(), response, limit).await)
        })
    }
}

async fn seal_response(sealer: &dyn Seal, response: Response, limit: usize) -> Response {
    let (mut parts, body) = response.into_parts();

    // Known to be over the limit: stream it through without buffering.
    if body.size_hint().lower() > limit as u64 {
        error!(limit, "response body exceeds the buffering limit; sending it unencrypted");
        return Response::from_parts(parts, body);
    }

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "response body could not be read; sending it empty");
            parts.headers.remove(CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    // Nothing was sent: leave 204s, redirects and bare status responses alone.
    if bytes.is_empty() {
        return Response::from_parts(parts, Body::from(bytes));
    }

    if bytes.len() > limit {
        error!(
            limit,
            len = bytes.len(),
            "response body exceeds the buffering limit; sending it unencrypted"
        );
        return Response::from_parts(parts, Body::from(bytes));
    }

    match seal_body(sealer, is_json(&parts.headers), &bytes) {
        Ok(sealed) => {
            parts
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            parts.headers.remove(CONTENT_LENGTH);
            debug!(status = %parts.status, "response body encrypted");
            Response::from_parts(parts, Body::from(sealed))
        }
        Err(e) => {
            warn!(error = %e, "response encryption failed; sending body unencrypted");
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}

// ---------------------------------------------------------------------------
// Request decryption
// ---------------------------------------------------------------------------

/// Layer that replaces an `{"encrypted": "<envelope>"}` JSON request body with
/// the JSON it carries before the inner service runs.
#[derive(Clone)]
pub struct DecryptRequestLayer {
    opener: Arc<dyn Open>,
    limit: usize,
}

impl DecryptRequestLayer {
    /// Open requests with `opener`, buffering at most [`DEFAULT_BODY_LIMIT`] bytes.
    pub fn new(opener: impl Open + 'static) -> Self {
        Self {
            opener: Arc::new(opener),
            limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Override the buffering limit.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl<S> Layer<S> for DecryptRequestLayer {
    type Service = DecryptRequest<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DecryptRequest {
            inner,
            opener: Arc::clone(&self.opener),
            limit: self.limit,
        }
    }
}

/// Service produced by [`DecryptRequestLayer`].
#[derive(Clone)]
pub struct DecryptRequest<S> {
    inner: S,
    opener: Arc<dyn Open>,
    limit: usize,
}

impl<S> Service<Request> for DecryptRequest<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let opener = Arc::clone(&self.opener);
        let limit = self.limit;

        Box::pin(async move {
            // Non-JSON bodies stream through without being buffered.
            if !is_json(req.headers()) {
                return inner.call(req).await;
            }

            let (mut parts, body) = req.into_parts();
            let bytes = match to_bytes(body, limit).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, limit, "request body could not be buffered");
                    return Ok(ServiceError::PayloadTooLarge(limit).into_response());
                }
            };

            let bytes = match open_body(opener.as_ref(), &bytes) {
                Ok(Opened::Decrypted(plain)) => {
                    parts.headers.remove(CONTENT_LENGTH);
                    debug!("request body decrypted");
                    plain
                }
                Ok(Opened::Untouched) => bytes,
                Err(e) => {
                    warn!(error = %e, "request decryption failed; passing body through unchanged");
                    bytes
                }
            };

            inner.call(Request::from_parts(parts, Body::from(bytes))).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        body::Bytes,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::codec::{asymmetric, symmetric, CodecError, MockSeal};
    use crate::keys::{tests::test_pair, SecretKey};

    /// Router whose handler echoes the body it received and counts its calls.
    fn echo_router(layer: DecryptRequestLayer) -> (Router, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new()
            .route(
                "/",
                post(move |body: Bytes| async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    body
                }),
            )
            .layer(layer);
        (router, hits)
    }

    fn post_req(content_type: &str, body: impl Into<Body>) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    async fn body_bytes(resp: Response) -> Bytes {
        to_bytes(resp.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn non_json_request_passes_through_once() {
        let key = SecretKey::generate();
        let (app, hits) = echo_router(DecryptRequestLayer::new(key));

        let resp = app.oneshot(post_req("text/plain", "hello")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&body_bytes(resp).await[..], b"hello");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn encrypted_json_request_is_decrypted() {
        let key = SecretKey::from_hex(&"00".repeat(32)).unwrap();
        let envelope = symmetric::encrypt(&key, r#"{"a":1}"#).unwrap();
        let body = json!({ "encrypted": envelope }).to_string();
        let (app, hits) = echo_router(DecryptRequestLayer::new(key));

        let resp = app.oneshot(post_req("application/json", body)).await.unwrap();
        let seen: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(seen, json!({"a": 1}));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn charset_parameter_still_counts_as_json() {
        let key = SecretKey::generate();
        let body = json!({ "encrypted": symmetric::encrypt(&key, "[true]").unwrap() }).to_string();
        let (app, _) = echo_router(DecryptRequestLayer::new(key));

        let resp = app
            .oneshot(post_req("application/json; charset=utf-8", body))
            .await
            .unwrap();
        assert_eq!(&body_bytes(resp).await[..], b"[true]");
    }

    #[tokio::test]
    async fn wrong_key_leaves_body_encrypted() {
        let envelope = symmetric::encrypt(&SecretKey::generate(), r#"{"a":1}"#).unwrap();
        let body = json!({ "encrypted": envelope }).to_string();
        let (app, hits) = echo_router(DecryptRequestLayer::new(SecretKey::generate()));

        let resp = app
            .oneshot(post_req("application/json", body.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&body_bytes(resp).await[..], body.as_bytes());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn plain_json_request_is_untouched() {
        let (app, hits) = echo_router(DecryptRequestLayer::new(SecretKey::generate()));
        let resp = app
            .oneshot(post_req("application/json", r#"{"name":"alice"}"#))
            .await
            .unwrap();
        assert_eq!(&body_bytes(resp).await[..], br#"{"name":"alice"}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oversized_json_request_is_rejected() {
        let layer = DecryptRequestLayer::new(SecretKey::generate()).with_body_limit(8);
        let (app, hits) = echo_router(layer);
        let resp = app
            .oneshot(post_req("application/json", r#"{"name":"alice"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn asymmetric_request_is_decrypted_with_private_key() {
        let (public, private) = test_pair();
        let envelope = asymmetric::encrypt(public, r#"{"order":7}"#).unwrap();
        let body = json!({ "encrypted": envelope }).to_string();
        let (app, _) = echo_router(DecryptRequestLayer::new(private.clone()));

        let resp = app.oneshot(post_req("application/json", body)).await.unwrap();
        let seen: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(seen, json!({"order": 7}));
    }

    fn json_router(layer: EncryptResponseLayer) -> Router {
        Router::new()
            .route(
                "/json",
                get(|| async { (StatusCode::CREATED, Json(json!({"ok": true}))) }),
            )
            .route("/text", get(|| async { "hi" }))
            .route("/empty", get(|| async { StatusCode::NO_CONTENT }))
            .layer(layer)
    }

    fn get_req(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn json_response_is_encrypted_and_status_kept() {
        let key = SecretKey::generate();
        let app = json_router(EncryptResponseLayer::new(key.clone()));

        let resp = app.oneshot(get_req("/json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");

        let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        let envelope = body["encrypted"].as_str().unwrap();
        let plain: Value = serde_json::from_str(&symmetric::decrypt(&key, envelope).unwrap()).unwrap();
        assert_eq!(plain, json!({"ok": true}));
    }

    #[tokio::test]
    async fn text_response_is_encrypted_as_json_string() {
        let key = SecretKey::generate();
        let app = json_router(EncryptResponseLayer::new(key.clone()));

        let resp = app.oneshot(get_req("/text")).await.unwrap();
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        let plain = symmetric::decrypt(&key, body["encrypted"].as_str().unwrap()).unwrap();
        assert_eq!(plain, r#""hi""#);
    }

    #[tokio::test]
    async fn empty_response_is_not_encrypted() {
        let mut sealer = MockSeal::new();
        sealer.expect_seal().never();
        let app = json_router(EncryptResponseLayer::new(sealer));

        let resp = app.oneshot(get_req("/empty")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn encryption_failure_sends_original_body() {
        let mut sealer = MockSeal::new();
        sealer
            .expect_seal()
            .times(1)
            .returning(|_| Err(CodecError::CryptoFailure("boom".into())));
        let app = json_router(EncryptResponseLayer::new(sealer));

        let resp = app.oneshot(get_req("/json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn oversized_response_is_sent_unencrypted_not_dropped() {
        let mut sealer = MockSeal::new();
        sealer.expect_seal().never();
        let app = Router::new()
            .route("/big", get(|| async { "x".repeat(64) }))
            .layer(EncryptResponseLayer::new(sealer).with_body_limit(16));

        let resp = app.oneshot(get_req("/big")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&body_bytes(resp).await[..], "x".repeat(64).as_bytes());
    }

    #[tokio::test]
    async fn response_of_unknown_size_over_limit_is_sent_unencrypted() {
        let mut sealer = MockSeal::new();
        sealer.expect_seal().never();
        let app = Router::new()
            .route(
                "/stream",
                get(|| async {
                    let chunks = vec![
                        Ok::<_, std::io::Error>(Bytes::from_static(b"0123456789")),
                        Ok(Bytes::from_static(b"0123456789")),
                    ];
                    Body::from_stream(tokio_stream::iter(chunks))
                }),
            )
            .layer(EncryptResponseLayer::new(sealer).with_body_limit(16));

        let resp = app.oneshot(get_req("/stream")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&body_bytes(resp).await[..], b"01234567890123456789");
    }

    #[tokio::test]
    async fn response_at_limit_is_still_encrypted() {
        let key = SecretKey::generate();
        let app = Router::new()
            .route("/fits", get(|| async { "x".repeat(16) }))
            .layer(EncryptResponseLayer::new(key.clone()).with_body_limit(16));

        let resp = app.oneshot(get_req("/fits")).await.unwrap();
        let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        let plain = symmetric::decrypt(&key, body["encrypted"].as_str().unwrap()).unwrap();
        assert_eq!(plain, format!("\"{}\"", "x".repeat(16)));
    }

    #[tokio::test]
    async fn json_looking_text_response_is_encrypted_as_string() {
        let key = SecretKey::generate();
        let app = Router::new()
            .route("/num", get(|| async { "123" }))
            .layer(EncryptResponseLayer::new(key.clone()));

        let resp = app.oneshot(get_req("/num")).await.unwrap();
        let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        let plain = symmetric::decrypt(&key, body["encrypted"].as_str().unwrap()).unwrap();
        assert_eq!(plain, r#""123""#);
    }

    #[tokio::test]
    async fn asymmetric_response_opens_with_private_key() {
        let (public, private) = test_pair();
        let app = json_router(EncryptResponseLayer::new(public.clone()));

        let resp = app.oneshot(get_req("/json")).await.unwrap();
        let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        let plain = asymmetric::decrypt(private, body["encrypted"].as_str().unwrap()).unwrap();
        assert_eq!(plain, r#"{"ok":true}"#);
    }
}
