//! Session state and lifecycle.
//!
//! # Responsibilities
//! - Hold the current session (token, user, role) in a shared cell
//! - Restore a persisted session at startup without re-login
//! - Guarantee the logged-out signal fires at most once per session
//!
//! # Design Decisions
//! - No ambient globals: the handle is constructed once and injected
//! - The cell is an `ArcSwapOption` so readers never block writers
//! - Logout events ride a broadcast channel; the library has no router,
//!   so "redirect to login" is a signal subscribers act on

pub mod store;

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::ApiResult;
use crate::session::store::SessionStore;

pub use store::{FileStore, MemoryStore};

/// An authenticated (or anonymous) client session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Bearer token attached to outgoing requests, if any.
    pub token: Option<String>,

    /// Server-supplied user object, kept opaque.
    pub user: Option<serde_json::Value>,

    /// Role string used for client-side gating.
    pub role: String,
}

impl Session {
    /// True when the session carries a token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Lifecycle events emitted by the session handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was established after a successful login.
    LoggedIn,

    /// The session ended; the application should navigate to `redirect_to`.
    LoggedOut { redirect_to: String },
}

struct HandleInner {
    current: ArcSwapOption<Session>,
    events: broadcast::Sender<SessionEvent>,
}

/// Shared, swappable handle to the current session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl SessionHandle {
    /// Create an empty (anonymous) handle.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(HandleInner {
                current: ArcSwapOption::const_empty(),
                events,
            }),
        }
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Install a session and announce the login.
    pub fn establish(&self, session: Session) {
        self.inner.current.store(Some(Arc::new(session)));
        let _ = self.inner.events.send(SessionEvent::LoggedIn);
    }

    /// Load a persisted session from storage, if one exists.
    ///
    /// Restoring does not emit `LoggedIn`; the user never acted.
    pub fn restore(&self, store: &dyn SessionStore) -> ApiResult<bool> {
        match store.load()? {
            Some(session) if session.is_authenticated() => {
                tracing::debug!(role = %session.role, "session restored from storage");
                self.inner.current.store(Some(Arc::new(session)));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Tear down the current session and announce the logout.
    ///
    /// Returns true only for the call that actually removed a session, so
    /// concurrent teardown paths cannot double-fire the redirect.
    pub fn clear(&self, redirect_to: &str) -> bool {
        if self.inner.current.swap(None).is_some() {
            let _ = self.inner.events.send(SessionEvent::LoggedOut {
                redirect_to: redirect_to.to_string(),
            });
            true
        } else {
            false
        }
    }

    /// Announce a redirect without tearing anything down.
    ///
    /// Used for a 401 on an anonymous request: there is no session to
    /// clear, but the application should still navigate to login.
    pub(crate) fn redirect(&self, route: &str) {
        let _ = self.inner.events.send(SessionEvent::LoggedOut {
            redirect_to: route.to_string(),
        });
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.inner
            .current
            .load()
            .as_ref()
            .and_then(|s| s.token.clone())
    }

    /// Snapshot of the whole current session.
    pub fn snapshot(&self) -> Option<Arc<Session>> {
        self.inner.current.load_full()
    }

    /// True when a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Replace only the token, keeping user and role (refresh path).
    pub fn update_token(&self, token: String) {
        let mut session = self
            .inner
            .current
            .load_full()
            .map(|s| (*s).clone())
            .unwrap_or_default();
        session.token = Some(token);
        self.inner.current.store(Some(Arc::new(session)));
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_fires_once() {
        let handle = SessionHandle::new();
        let mut events = handle.subscribe();
        handle.establish(Session {
            token: Some("abc".into()),
            user: None,
            role: "user".into(),
        });

        assert!(handle.clear("/login"));
        assert!(!handle.clear("/login"));
        assert!(!handle.clear("/login"));

        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::LoggedOut {
                redirect_to: "/login".into()
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_update_token_keeps_user() {
        let handle = SessionHandle::new();
        handle.establish(Session {
            token: Some("abc".into()),
            user: Some(serde_json::json!({"id": 1})),
            role: "admin".into(),
        });

        handle.update_token("xyz".into());

        let snapshot = handle.snapshot().unwrap();
        assert_eq!(snapshot.token.as_deref(), Some("xyz"));
        assert_eq!(snapshot.role, "admin");
        assert_eq!(snapshot.user, Some(serde_json::json!({"id": 1})));
    }

    #[test]
    fn test_anonymous_handle() {
        let handle = SessionHandle::new();
        assert!(!handle.is_authenticated());
        assert!(handle.token().is_none());
        assert!(!handle.clear("/login"));
    }
}
