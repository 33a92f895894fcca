//! The HTTP client pipeline.
//!
//! # Responsibilities
//! - Run the middleware chain over every outbound request
//! - Unwrap the `{code, message, data}` envelope on success
//! - Drive the configured 401 policy (redirect or single-flight refresh)
//! - Normalize every failure into an `ApiError` and surface it as a
//!   notification exactly once before returning it to the caller
//!
//! # Design Decisions
//! - The session handle is injected at construction, never ambient
//! - A request replayed after a refresh carries a `retried` marker and
//!   can never re-enter the refresh path

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::refresh::{RefreshGate, Ticket};
use crate::config::validation::ValidationError;
use crate::config::{AuthPolicy, ClientConfig, ConfigError};
use crate::error::{status_message, ApiError, ApiResult};
use crate::http::envelope::{Envelope, Page, PageQuery};
use crate::http::middleware::{BearerAuth, DefaultHeaders, Middleware, RequestCtx};
use crate::notify::Notifier;
use crate::session::store::{FileStore, SessionStore};
use crate::session::{Session, SessionHandle};
use crate::validation::FormValidator;

/// Payload of a successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub token: String,

    #[serde(default)]
    pub user: Option<serde_json::Value>,

    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
struct RefreshPayload {
    token: String,
}

/// Session-aware API client.
///
/// Cheap to clone; clones share the session, notifier and refresh gate.
/// Extra middleware must be registered before the client is cloned.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    config: ClientConfig,
    session: SessionHandle,
    store: Arc<dyn SessionStore>,
    notifier: Notifier,
    middleware: Vec<Arc<dyn Middleware>>,
    gate: Arc<RefreshGate>,
}

impl ApiClient {
    /// Create a client persisting its session to the configured file path.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let store = Arc::new(FileStore::new(config.storage.path.clone()));
        Self::with_store(config, store)
    }

    /// Create a client with an explicit storage backend.
    pub fn with_store(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        crate::config::validation::validate_config(&config).map_err(ConfigError::Validation)?;

        // Validation already accepted the URL; surface a parse failure as
        // a validation error rather than panicking.
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ConfigError::Validation(vec![ValidationError {
                field: "base_url".to_string(),
                message: e.to_string(),
            }])
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;

        let session = SessionHandle::new();
        match session.restore(store.as_ref()) {
            Ok(true) => tracing::info!("persisted session restored"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "could not restore persisted session"),
        }

        let middleware: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(DefaultHeaders::new()),
            Arc::new(BearerAuth::new(
                session.clone(),
                config.auth.header_scheme.clone(),
            )),
        ];

        let notifier = Notifier::new(config.notifications.clone());

        Ok(Self {
            http,
            base_url,
            config,
            session,
            store,
            notifier,
            middleware,
            gate: Arc::new(RefreshGate::new()),
        })
    }

    /// Append a transformer to the middleware chain.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- typed request surface -------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(RequestCtx::new(Method::GET, path)).await
    }

    /// Fetch one page of a paginated listing.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: PageQuery,
    ) -> ApiResult<Page<T>> {
        let mut ctx = RequestCtx::new(Method::GET, path);
        ctx.query.extend(query.to_query());
        self.execute(ctx).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let ctx = self.json_ctx(Method::POST, path, body)?;
        self.execute(ctx).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let ctx = self.json_ctx(Method::PUT, path, body)?;
        self.execute(ctx).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.execute_unit(RequestCtx::new(Method::DELETE, path))
            .await
    }

    /// Run a request descriptor through the pipeline and unwrap the payload.
    pub async fn execute<T: DeserializeOwned>(&self, ctx: RequestCtx) -> ApiResult<T> {
        let result = match self.run::<T>(ctx).await {
            Ok(envelope) => envelope.into_data(self.config.auth.success_code),
            Err(e) => Err(e),
        };
        if let Err(error) = &result {
            self.notifier.report(error);
        }
        result
    }

    /// Like `execute` for endpoints whose envelope carries no payload.
    pub async fn execute_unit(&self, ctx: RequestCtx) -> ApiResult<()> {
        let result = match self.run::<serde_json::Value>(ctx).await {
            Ok(envelope) => envelope
                .into_optional(self.config.auth.success_code)
                .map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(error) = &result {
            self.notifier.report(error);
        }
        result
    }

    // ---- auth convenience -------------------------------------------------

    /// POST credentials, establish and persist the returned session.
    pub async fn login<C: Serialize + ?Sized>(
        &self,
        path: &str,
        credentials: &C,
    ) -> ApiResult<Session> {
        let payload: LoginPayload = self.post(path, credentials).await?;
        let session = Session {
            token: Some(payload.token),
            user: payload.user,
            role: payload.role,
        };
        if let Err(e) = self.store.save(&session) {
            tracing::warn!(error = %e, "failed to persist session");
        }
        self.session.establish(session.clone());
        tracing::info!(role = %session.role, "login succeeded");
        Ok(session)
    }

    /// Tear down the session and persisted state, announcing the logout.
    pub fn logout(&self) {
        tracing::info!("logout requested");
        self.force_logout();
    }

    /// Run a client-side form validator, surfacing every field failure.
    ///
    /// On failure the request must not be sent; callers use
    /// `client.check_form(form)?` before submitting.
    pub fn check_form(&self, form: FormValidator) -> ApiResult<()> {
        form.validate().inspect_err(|e| self.notifier.report(e))
    }

    // ---- pipeline internals -----------------------------------------------

    fn json_ctx<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<RequestCtx> {
        RequestCtx::new(method, path)
            .json(body)
            .inspect_err(|e| self.notifier.report(e))
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| ApiError::Decode(format!("invalid request path '{path}': {e}")))
    }

    fn classify_transport(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.config.timeouts.request_secs)
        } else {
            ApiError::Network(error.to_string())
        }
    }

    async fn send(&self, ctx: &RequestCtx) -> ApiResult<reqwest::Response> {
        let mut ctx = ctx.clone();
        for middleware in &self.middleware {
            middleware.apply(&mut ctx);
        }

        let url = self.endpoint(&ctx.path)?;
        let mut request = self.http.request(ctx.method.clone(), url).headers(ctx.headers);
        if !ctx.query.is_empty() {
            request = request.query(&ctx.query);
        }
        if let Some(body) = &ctx.body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| self.classify_transport(e))
    }

    async fn run<T: DeserializeOwned>(&self, mut ctx: RequestCtx) -> ApiResult<Envelope<T>> {
        loop {
            let response = self.send(&ctx).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                self.handle_unauthorized(&mut ctx).await?;
                continue;
            }
            if !status.is_success() {
                return Err(self.error_for_status(status, response, &ctx.path).await);
            }

            return response
                .json::<Envelope<T>>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()));
        }
    }

    /// Apply the 401 policy. `Ok(())` means the caller should replay.
    async fn handle_unauthorized(&self, ctx: &mut RequestCtx) -> ApiResult<()> {
        let refreshable = self.config.auth.policy == AuthPolicy::Refresh
            && !ctx.retried
            && self.session.is_authenticated();

        if !refreshable {
            tracing::info!(path = %ctx.path, retried = ctx.retried, "unauthorized, ending session");
            if self.session.clear(&self.config.auth.login_route) {
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "failed to clear persisted session");
                }
            } else if !ctx.retried {
                // Anonymous 401: nothing to tear down, still steer to login.
                self.session.redirect(&self.config.auth.login_route);
            }
            return Err(ApiError::Auth);
        }

        self.refresh_token().await?;
        tracing::debug!(path = %ctx.path, "replaying request with refreshed token");
        ctx.retried = true;
        Ok(())
    }

    /// Single-flight token refresh; at most one refresh call in flight.
    async fn refresh_token(&self) -> ApiResult<String> {
        match self.gate.enter().await {
            Ticket::Leader => {
                tracing::info!("token refresh started");
                let outcome = match self.request_refresh().await {
                    Ok(token) => {
                        self.session.update_token(token.clone());
                        if let Some(snapshot) = self.session.snapshot() {
                            if let Err(e) = self.store.save(&snapshot) {
                                tracing::warn!(error = %e, "failed to persist refreshed session");
                            }
                        }
                        tracing::info!("token refresh succeeded");
                        Ok(token)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "token refresh failed, ending session");
                        self.force_logout();
                        Err(ApiError::Auth)
                    }
                };
                self.gate.settle(outcome.clone()).await;
                outcome
            }
            Ticket::Follower(rx) => rx.await.unwrap_or(Err(ApiError::Auth)),
        }
    }

    /// The actual refresh call, outside the regular pipeline so it can
    /// never recurse into the 401 handling.
    async fn request_refresh(&self) -> ApiResult<String> {
        let url = self.endpoint(&self.config.auth.refresh_path)?;
        let mut request = self.http.post(url);
        if let Some(token) = self.session.token() {
            request = request.header(
                AUTHORIZATION,
                format!("{} {}", self.config.auth.header_scheme, token),
            );
        }

        let response = request.send().await.map_err(|e| self.classify_transport(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: status_message(status.as_u16()).to_string(),
            });
        }

        let envelope: Envelope<RefreshPayload> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(envelope.into_data(self.config.auth.success_code)?.token)
    }

    fn force_logout(&self) {
        if self.session.clear(&self.config.auth.login_route) {
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "failed to clear persisted session");
            }
        }
    }

    async fn error_for_status(
        &self,
        status: StatusCode,
        response: reqwest::Response,
        path: &str,
    ) -> ApiError {
        // Prefer a server-supplied envelope message when the body has one.
        let server_message = response
            .json::<Envelope<serde_json::Value>>()
            .await
            .ok()
            .map(|envelope| envelope.message)
            .filter(|message| !message.is_empty());

        match status {
            StatusCode::FORBIDDEN => ApiError::Permission,
            StatusCode::NOT_FOUND => ApiError::NotFound {
                resource: path.to_string(),
            },
            _ => ApiError::Http {
                status: status.as_u16(),
                message: server_message
                    .unwrap_or_else(|| status_message(status.as_u16()).to_string()),
            },
        }
    }
}
