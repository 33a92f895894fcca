//! Shared utilities for integration testing.
//!
//! Spins up a programmable mock API speaking the `{code, message, data}`
//! envelope, with switchable token validity and refresh behavior.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Shared, mutable behavior knobs for the mock API.
pub struct MockState {
    /// Token the protected endpoints currently accept.
    pub valid_token: Mutex<String>,

    /// Number of refresh calls received.
    pub refresh_calls: AtomicUsize,

    /// Whether the refresh endpoint succeeds.
    pub refresh_ok: AtomicBool,

    /// Token handed out by a successful refresh.
    pub refreshed_token: Mutex<String>,

    /// When false, a successful refresh hands out a token the protected
    /// endpoints still reject.
    pub accept_refreshed: AtomicBool,

    /// Artificial latency of the refresh call, to widen the window in
    /// which concurrent 401s pile up.
    pub refresh_delay_ms: u64,

    /// Authorization header values seen by /profile, in arrival order.
    pub profile_auth_headers: Mutex<Vec<Option<String>>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            valid_token: Mutex::new("abc".to_string()),
            refresh_calls: AtomicUsize::new(0),
            refresh_ok: AtomicBool::new(true),
            refreshed_token: Mutex::new("xyz".to_string()),
            accept_refreshed: AtomicBool::new(true),
            refresh_delay_ms: 150,
            profile_auth_headers: Mutex::new(Vec::new()),
        }
    }
}

impl MockState {
    pub fn set_valid_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = token.to_string();
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn seen_auth_headers(&self) -> Vec<Option<String>> {
        self.profile_auth_headers.lock().unwrap().clone()
    }
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({"code": 200, "message": "ok", "data": data}))
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

async fn login() -> Json<Value> {
    envelope(json!({
        "token": "abc",
        "user": {"id": 1, "name": "dara"},
        "role": "admin",
    }))
}

async fn refresh(State(state): State<Arc<MockState>>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(state.refresh_delay_ms)).await;

    if !state.refresh_ok.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 401, "message": "refresh token expired"})),
        )
            .into_response();
    }

    let token = state.refreshed_token.lock().unwrap().clone();
    if state.accept_refreshed.load(Ordering::SeqCst) {
        state.set_valid_token(&token);
    }
    envelope(json!({"token": token})).into_response()
}

async fn profile(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let auth = bearer(&headers);
    state
        .profile_auth_headers
        .lock()
        .unwrap()
        .push(auth.clone());

    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    if auth.as_deref() == Some(expected.as_str()) {
        envelope(json!({"id": 1, "name": "dara"})).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    envelope(json!({"authorization": bearer(&headers)}))
}

async fn forbidden() -> StatusCode {
    StatusCode::FORBIDDEN
}

async fn missing() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn boom() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"code": 500, "message": "backend exploded"})),
    )
        .into_response()
}

async fn business() -> Json<Value> {
    Json(json!({"code": 4001, "message": "insufficient balance", "data": null}))
}

async fn orders() -> Json<Value> {
    envelope(json!({
        "items": [{"id": 1}, {"id": 2}],
        "total": 41,
        "page": 1,
        "per_page": 20,
    }))
}

/// Start the mock API on an ephemeral port, returning its base URL.
pub async fn start_mock_api(state: Arc<MockState>) -> String {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/profile", get(profile))
        .route("/echo-auth", get(echo_auth))
        .route("/forbidden", get(forbidden))
        .route("/missing", get(missing))
        .route("/boom", get(boom))
        .route("/business", get(business))
        .route("/orders", get(orders))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock api");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock api");
    });

    format!("http://{addr}")
}

/// An address nothing listens on, for provoking connection failures.
#[allow(dead_code)]
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
