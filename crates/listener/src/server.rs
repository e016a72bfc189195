//! HTTP surface: router, request pipeline, and server loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use handlers::{Propagator, WebhookKind, WebhookOutcome};
use propagation::{Timestamp, WebhookPayload};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::signature::{SignatureVerifier, SIGNATURE_HEADER};

/// Shared per-process state handed to every request.
#[derive(Clone)]
pub struct ListenerState {
    propagator: Propagator,
    verifier: Arc<SignatureVerifier>,
}

impl ListenerState {
    pub fn new(propagator: Propagator, verifier: SignatureVerifier) -> Self {
        Self {
            propagator,
            verifier: Arc::new(verifier),
        }
    }
}

/// Errors from binding or running the HTTP server.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// JSON body of a processed webhook: the handler outcome plus delivery lag.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    #[serde(flatten)]
    pub outcome: WebhookOutcome,

    /// Milliseconds between the event timestamp and its processing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lag_ms: Option<i64>,
}

/// Create the HTTP router.
///
/// The three legacy endpoints bind their route explicitly; any other path is
/// routed by its last segment. Every method reaches the signature check.
pub fn create_router(state: ListenerState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/task_webhook", any(task_webhook))
        .route("/version_webhook", any(version_webhook))
        .route("/version_created_webhook", any(version_created_webhook))
        .fallback(path_webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: ListenerState) -> Result<(), ListenerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ListenerError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn task_webhook(
    State(state): State<ListenerState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!("task_webhook called");
    process(&state, Some(WebhookKind::TaskStatus.route_key()), uri.path(), &headers, &body).await
}

async fn version_webhook(
    State(state): State<ListenerState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!("version_webhook called");
    process(&state, Some(WebhookKind::VersionStatus.route_key()), uri.path(), &headers, &body).await
}

async fn version_created_webhook(
    State(state): State<ListenerState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!("version_created_webhook called");
    process(&state, Some(WebhookKind::VersionCreated.route_key()), uri.path(), &headers, &body).await
}

async fn path_webhook(
    State(state): State<ListenerState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    process(&state, None, uri.path(), &headers, &body).await
}

/// Route key for a path: its last non-empty segment, lower-cased.
pub fn route_key_from_path(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Signature (401) → JSON (400) → route (404) → handler.
async fn process(
    state: &ListenerState,
    route: Option<&str>,
    path: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let key = route.map_or_else(|| route_key_from_path(path), str::to_ascii_lowercase);
    let request_id = Uuid::new_v4();
    let span = info_span!("webhook", %request_id, path, key = %key);

    async move {
        info!("Received webhook request");
        debug!(bytes = body.len(), "Request body size");

        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Err(e) = state.verifier.verify(body, signature) {
            warn!(reason = %e, "Unauthorized request: invalid signature");
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }

        let payload: WebhookPayload = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to parse JSON from request");
                return (StatusCode::BAD_REQUEST, "Bad JSON").into_response();
            }
        };
        debug!(event_type = ?payload.data.event_type, "Parsed JSON payload");

        let Some(kind) = WebhookKind::from_route_key(&key) else {
            warn!("Unknown webhook type");
            return (StatusCode::NOT_FOUND, "Not Found").into_response();
        };

        let outcome = state.propagator.dispatch(kind, &payload).await;
        let response = WebhookResponse {
            outcome,
            lag_ms: lag_ms(&payload, Timestamp::now()),
        };

        match serde_json::to_string(&response) {
            Ok(rendered) => info!(result = %rendered, "Webhook processing complete"),
            Err(e) => warn!(error = %e, "Webhook processing complete; result not loggable"),
        }
        (StatusCode::OK, Json(response)).into_response()
    }
    .instrument(span)
    .await
}

/// Delivery lag, when the payload carries a usable timestamp.
fn lag_ms(payload: &WebhookPayload, now: Timestamp) -> Option<i64> {
    let raw = payload.timestamp.as_ref()?;
    match payload.emitted_at() {
        Some(emitted) => {
            let lag = emitted.millis_until(now);
            info!(lag_ms = lag, "Event processing lag");
            Some(lag)
        }
        None => {
            warn!(timestamp = %raw, "Bad timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use propagation::{
        EntityTracker, Shot, ShotId, Status, StatusMapping, Task, TaskId, TrackerError, Version,
        VersionId,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    /// Knows no entities; every write fails.
    struct EmptyTracker;

    fn unavailable() -> TrackerError {
        TrackerError::Transport {
            message: "offline".to_string(),
        }
    }

    #[async_trait]
    impl EntityTracker for EmptyTracker {
        async fn find_version(&self, _id: VersionId) -> Result<Option<Version>, TrackerError> {
            Ok(None)
        }
        async fn find_task(&self, _id: TaskId) -> Result<Option<Task>, TrackerError> {
            Ok(None)
        }
        async fn find_shot(&self, _id: ShotId) -> Result<Option<Shot>, TrackerError> {
            Ok(None)
        }
        async fn set_task_statuses(
            &self,
            _ids: &[TaskId],
            _status: &Status,
        ) -> Result<Vec<Task>, TrackerError> {
            Err(unavailable())
        }
        async fn set_shot_status(&self, _id: ShotId, _status: &Status) -> Result<Shot, TrackerError> {
            Err(unavailable())
        }
        async fn set_version_status(
            &self,
            _id: VersionId,
            _status: &Status,
        ) -> Result<Version, TrackerError> {
            Err(unavailable())
        }
    }

    const SECRET: &str = "s3cret";

    fn app() -> Router {
        let propagator = Propagator::new(Arc::new(EmptyTracker), Arc::new(StatusMapping::default()));
        let verifier = SignatureVerifier::new(SECRET).unwrap();
        create_router(ListenerState::new(propagator, verifier))
    }

    fn signed_post(path: &str, body: &str) -> Request<Body> {
        let signature = SignatureVerifier::new(SECRET).unwrap().sign(body.as_bytes());
        Request::post(path)
            .header(SIGNATURE_HEADER, signature)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn task_event() -> String {
        json!({
            "data": {
                "entity_id": 5,
                "meta": { "attribute_name": "sg_status_list", "new_value": "apr" }
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn health_check_is_unauthenticated() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send_json(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn unsigned_requests_are_unauthorized() {
        let request = Request::post("/task_webhook")
            .body(Body::from(task_event()))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, b"Unauthorized");
    }

    #[tokio::test]
    async fn signature_is_checked_before_the_route() {
        let request = Request::post("/shot").body(Body::from("{}")).unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn legacy_endpoints_check_the_signature_for_any_method() {
        for method in ["GET", "PUT"] {
            let request = Request::builder()
                .method(method)
                .uri("/task_webhook")
                .body(Body::empty())
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, b"Unauthorized");
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (status, body) = send(signed_post("/task_webhook", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Bad JSON");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, body) = send(signed_post("/hooks/shot", "{}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Not Found");
    }

    #[tokio::test]
    async fn missing_entity_is_reported_inline() {
        let (status, body) = send_json(signed_post("/task_webhook", &task_event())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "Task 5 not found" }));
    }

    #[tokio::test]
    async fn arbitrary_paths_dispatch_on_their_last_segment() {
        let (status, body) = send_json(signed_post("/hooks/Task/", &task_event())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "Task 5 not found" }));

        let (status, body) = send_json(signed_post("/status", &task_event())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "version_id": 5, "task_id": null, "new_status": "apr" })
        );
    }

    #[tokio::test]
    async fn valid_timestamp_adds_lag() {
        let event = json!({
            "timestamp": "2024-05-01T10:00:00Z",
            "data": { "entity_id": 5, "meta": { "attribute_name": "sg_status_list" } }
        })
        .to_string();

        let (_, body) = send_json(signed_post("/version_created_webhook", &event)).await;

        assert_eq!(body["error"], json!("Version 5 not found"));
        assert!(body["lag_ms"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn unparsable_timestamp_is_omitted() {
        let event = json!({ "timestamp": "last tuesday", "data": { "entity_id": 5 } }).to_string();

        let (status, body) = send_json(signed_post("/version_created_webhook", &event)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "Version 5 not found" }));
    }

    #[tokio::test]
    async fn numeric_timestamp_is_processed_without_lag() {
        let event = json!({ "timestamp": 1714557600, "data": { "entity_id": 5 } }).to_string();

        let (status, body) = send_json(signed_post("/version_created_webhook", &event)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "Version 5 not found" }));
    }

    #[test]
    fn route_keys_come_from_the_last_segment() {
        assert_eq!(route_key_from_path("/task"), "task");
        assert_eq!(route_key_from_path("/api/hooks/Version_Created/"), "version_created");
        assert_eq!(route_key_from_path("/"), "");
        assert_eq!(route_key_from_path(""), "");
    }

    #[test]
    fn lag_is_measured_from_the_event_timestamp() {
        let payload = WebhookPayload {
            timestamp: Some(json!("2024-05-01T10:00:00Z")),
            ..WebhookPayload::default()
        };
        let now = Timestamp::parse_rfc3339("2024-05-01T10:00:02Z").unwrap();
        assert_eq!(lag_ms(&payload, now), Some(2000));
        assert_eq!(lag_ms(&WebhookPayload::default(), now), None);
    }
}
