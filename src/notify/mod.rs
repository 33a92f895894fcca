//! Notification surface.
//!
//! # Responsibilities
//! - Turn pipeline errors into user-facing notifications
//! - Broadcast posted/dismissed events to subscribers
//! - Auto-dismiss after the configured duration (0 = sticky)
//!
//! # Design Decisions
//! - The active set lives in a `DashMap` keyed by notification id
//! - Each timed notification gets its own sleep task; a notification
//!   dismissed early just makes that task a no-op

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::error::ApiError;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// A single user-facing notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub level: Level,

    /// Display time in milliseconds; 0 keeps it until dismissed.
    pub duration_ms: u64,

    pub timestamp: DateTime<Utc>,
}

/// Events observable by notification subscribers.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Posted(Notification),
    Dismissed(Uuid),
}

struct NotifierInner {
    tx: broadcast::Sender<NotificationEvent>,
    active: DashMap<Uuid, Notification>,
    defaults: NotificationConfig,
}

/// Posts notifications and manages their lifetimes.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

impl Notifier {
    pub fn new(defaults: NotificationConfig) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(NotifierInner {
                tx,
                active: DashMap::new(),
                defaults,
            }),
        }
    }

    /// Subscribe to posted/dismissed events.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.tx.subscribe()
    }

    /// Post a notification with an explicit duration.
    pub fn post(&self, level: Level, message: impl Into<String>, duration_ms: u64) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            level,
            duration_ms,
            timestamp: Utc::now(),
        };
        let id = notification.id;

        tracing::debug!(%id, ?level, message = %notification.message, "notification posted");
        self.inner.active.insert(id, notification.clone());
        let _ = self.inner.tx.send(NotificationEvent::Posted(notification));

        if duration_ms > 0 {
            let notifier = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                notifier.dismiss(id);
            });
        }

        id
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.post(Level::Info, message, self.inner.defaults.info_duration_ms)
    }

    pub fn warn(&self, message: impl Into<String>) -> Uuid {
        self.post(
            Level::Warning,
            message,
            self.inner.defaults.warning_duration_ms,
        )
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.post(Level::Error, message, self.inner.defaults.error_duration_ms)
    }

    /// Remove a notification and announce the dismissal.
    pub fn dismiss(&self, id: Uuid) {
        if self.inner.active.remove(&id).is_some() {
            let _ = self.inner.tx.send(NotificationEvent::Dismissed(id));
        }
    }

    /// Snapshot of currently visible notifications.
    pub fn active(&self) -> Vec<Notification> {
        self.inner
            .active
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Surface a pipeline error as one or more notifications.
    ///
    /// Validation errors post one notification per field; network-level
    /// failures get a generic connectivity message rather than transport
    /// detail.
    pub fn report(&self, error: &ApiError) {
        match error {
            ApiError::Validation(fields) => {
                for field in fields {
                    self.warn(field.to_string());
                }
            }
            ApiError::Permission => {
                self.warn(error.to_string());
            }
            err if err.is_network() => {
                self.error("unable to reach the server, check your connection");
            }
            _ => {
                self.error(error.to_string());
            }
        }
    }
}
