//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Returns all validation errors, not just the first, so a config file can
//! be fixed in one pass.

use url::Url;

use crate::config::schema::{AuthPolicy, ClientConfig};

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,

    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(err(
            "base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(err("base_url", format!("not an absolute URL: {e}"))),
    }

    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be greater than zero"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(err("timeouts.connect_secs", "must be greater than zero"));
    }

    if config.auth.policy == AuthPolicy::Refresh && config.auth.refresh_path.is_empty() {
        errors.push(err(
            "auth.refresh_path",
            "required when auth.policy is 'refresh'",
        ));
    }
    if !config.auth.refresh_path.is_empty() && !config.auth.refresh_path.starts_with('/') {
        errors.push(err("auth.refresh_path", "must start with '/'"));
    }
    if !config.auth.login_route.starts_with('/') {
        errors.push(err("auth.login_route", "must start with '/'"));
    }
    if config.auth.header_scheme.is_empty() {
        errors.push(err("auth.header_scheme", "must not be empty"));
    }

    if config.storage.path.is_empty() {
        errors.push(err("storage.path", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ClientConfig::default();
        config.base_url = "not a url".to_string();
        config.timeouts.request_secs = 0;
        config.auth.refresh_path = String::new();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"base_url"));
        assert!(fields.contains(&"timeouts.request_secs"));
        assert!(fields.contains(&"auth.refresh_path"));
    }

    #[test]
    fn test_redirect_policy_needs_no_refresh_path() {
        let mut config = ClientConfig::default();
        config.auth.policy = AuthPolicy::Redirect;
        config.auth.refresh_path = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = ClientConfig::default();
        config.base_url = "ftp://files.example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("ftp"));
    }
}
