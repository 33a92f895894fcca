//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! RequestCtx ──middleware chain──▶ transport ──▶ status check
//!      ▲                                             │
//!      │ replay with refreshed token            401? │ other error?
//!      └──────────── auth::refresh ◀────────────────┤
//!                                                    ▼
//!                            Envelope unwrap ──▶ data | ApiError ──▶ notifier
//! ```

pub mod client;
pub mod envelope;
pub mod middleware;

pub use client::{ApiClient, LoginPayload};
pub use envelope::{Envelope, Page, PageQuery};
pub use middleware::{BearerAuth, DefaultHeaders, Middleware, RequestCtx};
