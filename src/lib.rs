//! Session-aware REST API client pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                  API CLIENT                    │
//!                    │                                                │
//!   RequestCtx ──────┼─▶ middleware chain ──▶ transport (reqwest)     │
//!                    │    (default headers,         │                 │
//!                    │     bearer injection)        ▼                 │
//!                    │                        status check            │
//!                    │      ┌── 401 ──▶ auth policy ──▶ refresh gate  │
//!                    │      │            (single flight, FIFO queue)  │
//!                    │      ▼                                         │
//!   data | ApiError ◀┼─ envelope unwrap ──▶ notifier (toasts)         │
//!                    │                                                │
//!                    │  ┌──────────────────────────────────────────┐  │
//!                    │  │  config   session + storage   validation │  │
//!                    │  └──────────────────────────────────────────┘  │
//!                    └───────────────────────────────────────────────┘
//! ```
//!
//! Every outbound request carries current credentials; every inbound
//! response or error is normalized into a single shape the rest of the
//! application consumes uniformly.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod notify;
pub mod session;
pub mod validation;

pub use config::{AuthPolicy, ClientConfig};
pub use error::{ApiError, ApiResult, FieldError};
pub use http::{ApiClient, Envelope, Page, PageQuery, RequestCtx};
pub use notify::{Level, Notification, Notifier};
pub use session::{Session, SessionEvent, SessionHandle};
pub use validation::{FormValidator, Rule};
