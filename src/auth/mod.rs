//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! 401 received
//!     → policy "redirect": clear session, emit LoggedOut
//!     → policy "refresh": refresh.rs single-flight gate
//!         leader issues the one refresh call, followers queue,
//!         replay with the new token or tear the session down
//! ```
//!
//! # Design Decisions
//! - Which policy applies is configuration, never inferred
//! - Refresh failure is terminal for the session; no automatic re-login

pub mod refresh;

// Re-export AuthPolicy from the config module to avoid duplication.
pub use crate::config::schema::AuthPolicy;
pub use refresh::{RefreshGate, Ticket};
