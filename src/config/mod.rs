//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file → loader.rs → schema.rs structs → validation.rs → accepted config
//! ```
//!
//! # Design Decisions
//! - Every section has serde defaults so a partial file is usable
//! - Validation is a pure function returning all problems at once
//! - The 401 policy is an explicit config choice, never inferred

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AuthConfig, AuthPolicy, ClientConfig, NotificationConfig, StorageConfig, TimeoutConfig};
