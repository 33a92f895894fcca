//! Tests for the single-flight refresh policy: one refresh call per 401
//! burst, ordered replay, and exactly-once session teardown on failure.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::{json, Value};

use portico::session::store::{MemoryStore, SessionStore};
use portico::session::SessionEvent;
use portico::{ApiClient, ApiError, ClientConfig};

use common::{start_mock_api, MockState};

async fn logged_in_client(state: &Arc<MockState>) -> (ApiClient, Arc<MemoryStore>) {
    let base_url = start_mock_api(state.clone()).await;
    let mut config = ClientConfig::default();
    config.base_url = base_url;

    let store = Arc::new(MemoryStore::new());
    let client = ApiClient::with_store(config, store.clone()).unwrap();
    client
        .login("/auth/login", &json!({"username": "dara", "password": "hunter42x"}))
        .await
        .unwrap();
    (client, store)
}

#[tokio::test]
async fn test_concurrent_401s_trigger_exactly_one_refresh() {
    let state = Arc::new(MockState::default());
    let (client, _store) = logged_in_client(&state).await;

    // Rotate the token server-side; every in-flight "abc" request 401s.
    state.set_valid_token("xyz");

    let (a, b, c) = tokio::join!(
        client.get::<Value>("/profile"),
        client.get::<Value>("/profile"),
        client.get::<Value>("/profile"),
    );
    assert_eq!(a.unwrap()["id"], 1);
    assert_eq!(b.unwrap()["id"], 1);
    assert_eq!(c.unwrap()["id"], 1);

    assert_eq!(state.refresh_count(), 1);

    // Three stale attempts, then three replays with the refreshed token.
    let headers = state.seen_auth_headers();
    assert_eq!(headers.len(), 6);
    let stale = headers
        .iter()
        .filter(|h| h.as_deref() == Some("Bearer abc"))
        .count();
    let fresh = headers
        .iter()
        .filter(|h| h.as_deref() == Some("Bearer xyz"))
        .count();
    assert_eq!(stale, 3);
    assert_eq!(fresh, 3);

    assert_eq!(client.session().token().as_deref(), Some("xyz"));
}

#[tokio::test]
async fn test_refresh_failure_rejects_all_and_clears_once() {
    let state = Arc::new(MockState::default());
    let (client, store) = logged_in_client(&state).await;
    let mut events = client.session().subscribe();

    state.set_valid_token("xyz");
    state.refresh_ok.store(false, Ordering::SeqCst);

    let (a, b, c) = tokio::join!(
        client.get::<Value>("/profile"),
        client.get::<Value>("/profile"),
        client.get::<Value>("/profile"),
    );
    assert!(matches!(a, Err(ApiError::Auth)));
    assert!(matches!(b, Err(ApiError::Auth)));
    assert!(matches!(c, Err(ApiError::Auth)));

    assert_eq!(state.refresh_count(), 1);
    assert!(client.session().snapshot().is_none());
    assert!(store.load().unwrap().is_none());

    // Exactly one logged-out event despite three failing requests.
    let mut logouts = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::LoggedOut { .. }) {
            logouts += 1;
        }
    }
    assert_eq!(logouts, 1);
}

#[tokio::test]
async fn test_replayed_request_never_reenters_refresh() {
    let state = Arc::new(MockState::default());
    let (client, _store) = logged_in_client(&state).await;

    // Refresh succeeds but hands out a token the server still rejects,
    // so the replay 401s again.
    state.set_valid_token("rotated");
    state.accept_refreshed.store(false, Ordering::SeqCst);

    let result = client.get::<Value>("/profile").await;
    assert!(matches!(result, Err(ApiError::Auth)));

    // One refresh for the first 401, none for the replayed one.
    assert_eq!(state.refresh_count(), 1);
    assert!(client.session().snapshot().is_none());
}

#[tokio::test]
async fn test_refreshed_token_is_persisted() {
    let state = Arc::new(MockState::default());
    let (client, store) = logged_in_client(&state).await;

    state.set_valid_token("xyz");
    client.get::<Value>("/profile").await.unwrap();

    let persisted = store.load().unwrap().unwrap();
    assert_eq!(persisted.token.as_deref(), Some("xyz"));
    // User and role survive the token swap.
    assert_eq!(persisted.role, "admin");
    assert_eq!(persisted.user.unwrap()["id"], 1);
}

#[tokio::test]
async fn test_sequential_bursts_refresh_independently() {
    let state = Arc::new(MockState::default());
    let (client, _store) = logged_in_client(&state).await;

    state.set_valid_token("xyz");
    client.get::<Value>("/profile").await.unwrap();
    assert_eq!(state.refresh_count(), 1);

    // A second rotation opens a fresh refresh window.
    state.set_valid_token("later");
    *state.refreshed_token.lock().unwrap() = "later".to_string();
    client.get::<Value>("/profile").await.unwrap();
    assert_eq!(state.refresh_count(), 2);
}
