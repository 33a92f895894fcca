//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client
//! pipeline. All types derive Serde traits for deserialization from config
//! files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every request path is resolved against.
    pub base_url: String,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Authentication and 401 handling.
    pub auth: AuthConfig,

    /// Session persistence settings.
    pub storage: StorageConfig,

    /// Notification defaults.
    pub notifications: NotificationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeouts: TimeoutConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Timeout configuration for outbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total per-request deadline in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 10,
        }
    }
}

/// How an unauthorized (401) response is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthPolicy {
    /// Clear the session and signal a redirect to the login route.
    Redirect,

    /// Attempt exactly one token refresh, queueing concurrent failures,
    /// then replay; fall back to redirect when the refresh itself fails.
    Refresh,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Policy applied when a request comes back 401.
    pub policy: AuthPolicy,

    /// Route the application should navigate to after logout.
    pub login_route: String,

    /// Path of the token-refresh endpoint (refresh policy only).
    pub refresh_path: String,

    /// Envelope code the server uses to signal logical success.
    pub success_code: i64,

    /// Scheme prefix for the `Authorization` header.
    pub header_scheme: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            policy: AuthPolicy::Refresh,
            login_route: "/login".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            success_code: 200,
            header_scheme: "Bearer".to_string(),
        }
    }
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON key-value file holding the persisted session.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: ".portico/session.json".to_string(),
        }
    }
}

/// Default display durations per notification level, in milliseconds.
/// A duration of 0 means the notification stays until dismissed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub info_duration_ms: u64,
    pub warning_duration_ms: u64,
    pub error_duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            info_duration_ms: 3000,
            warning_duration_ms: 4500,
            error_duration_ms: 5000,
        }
    }
}
