//! Request descriptors and the middleware chain.
//!
//! # Responsibilities
//! - Describe an outbound request before it touches the transport
//! - Run the ordered transformer chain composed at client construction
//! - Inject auth credentials from the session handle
//!
//! # Design Decisions
//! - Middleware is an explicit ordered list, not implicit hooks
//! - The bearer transformer reads the session at send time, so a token
//!   swapped in by a refresh is picked up on replay

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;

use crate::error::{ApiError, ApiResult};
use crate::session::SessionHandle;

/// Descriptor for one outbound request.
#[derive(Debug, Clone)]
pub struct RequestCtx {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,

    /// Set after a refresh-driven replay; a retried request must never
    /// re-enter the refresh path.
    pub(crate) retried: bool,
}

impl RequestCtx {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            retried: false,
        }
    }

    /// Append one query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<B: serde::Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("failed to encode request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Set one header, replacing any previous value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A request transformer in the chain.
pub trait Middleware: Send + Sync {
    fn apply(&self, ctx: &mut RequestCtx);
}

/// Injects `Authorization: <scheme> <token>` when a session token exists.
///
/// Does not touch the request when no token is present, and never
/// validates the token's shape; expiry is discovered via server rejection.
pub struct BearerAuth {
    session: SessionHandle,
    scheme: String,
}

impl BearerAuth {
    pub fn new(session: SessionHandle, scheme: impl Into<String>) -> Self {
        Self {
            session,
            scheme: scheme.into(),
        }
    }
}

impl Middleware for BearerAuth {
    fn apply(&self, ctx: &mut RequestCtx) {
        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("{} {}", self.scheme, token)) {
                Ok(value) => {
                    ctx.headers.insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    tracing::warn!("session token is not a valid header value, skipping auth header");
                }
            }
        }
    }
}

/// Fills in default headers without overriding caller-set ones.
pub struct DefaultHeaders {
    headers: HeaderMap,
}

impl DefaultHeaders {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-client"),
            HeaderValue::from_static(concat!("portico/", env!("CARGO_PKG_VERSION"))),
        );
        Self { headers }
    }
}

impl Default for DefaultHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for DefaultHeaders {
    fn apply(&self, ctx: &mut RequestCtx) {
        for (name, value) in self.headers.iter() {
            if !ctx.headers.contains_key(name) {
                ctx.headers.insert(name.clone(), value.clone());
            }
        }
    }
}
