//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing upstreams)
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    let timeouts = [
        ("client.connect_timeout_secs", config.client.connect_timeout_secs),
        ("client.request_timeout_secs", config.client.request_timeout_secs),
        ("client.health_timeout_secs", config.client.health_timeout_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    let mut keys = HashSet::new();
    for (i, upstream) in config.upstreams.iter().enumerate() {
        let field = format!("upstreams[{}]", i);
        if upstream.key.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.key", field), "must not be empty"));
        } else if !keys.insert(upstream.key.to_ascii_lowercase()) {
            errors.push(ValidationError::new(
                format!("{}.key", field),
                format!("duplicate upstream key '{}'", upstream.key),
            ));
        }
        if upstream.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        }
        match Url::parse(&upstream.base_url) {
            Ok(url) if url.scheme() == "http" && url.host_str().is_some() => {}
            Ok(_) => errors.push(ValidationError::new(
                format!("{}.base_url", field),
                "must be an http:// URL with a host",
            )),
            Err(e) => errors.push(ValidationError::new(
                format!("{}.base_url", field),
                format!("'{}' is not a valid URL: {}", upstream.base_url, e),
            )),
        }
    }

    let known = |key: &str| keys.contains(&key.to_ascii_lowercase());

    for (i, route) in config.routes.iter().enumerate() {
        let field = format!("routes[{}]", i);
        if !route.prefix.starts_with('/') || route.prefix.len() < 2 {
            errors.push(ValidationError::new(
                format!("{}.prefix", field),
                "must start with '/' and name at least one segment",
            ));
        } else if route.prefix.ends_with('/') {
            errors.push(ValidationError::new(
                format!("{}.prefix", field),
                "must not end with '/'",
            ));
        }
        if !known(&route.upstream) {
            errors.push(ValidationError::new(
                format!("{}.upstream", field),
                format!("unknown upstream '{}'", route.upstream),
            ));
        }
    }

    for (field, key) in [
        ("composite.storage_upstream", &config.composite.storage_upstream),
        ("composite.analysis_upstream", &config.composite.analysis_upstream),
        ("reports.upstream", &config.reports.upstream),
    ] {
        if !known(key) {
            errors.push(ValidationError::new(field, format!("unknown upstream '{}'", key)));
        }
    }

    for (field, path) in [
        ("composite.upload_path", &config.composite.upload_path),
        ("composite.analyze_path", &config.composite.analyze_path),
        ("reports.path_template", &config.reports.path_template),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }
    if !config.reports.path_template.contains("{id}") {
        errors.push(ValidationError::new(
            "reports.path_template",
            "must contain the '{id}' placeholder",
        ));
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
    use crate::config::schema::RouteConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.client.request_timeout_secs = 0;
        config.upstreams[0].base_url = "not a url".into();
        config.routes.push(RouteConfig {
            prefix: "api/other/".into(),
            upstream: "missing".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"client.request_timeout_secs"));
        assert!(fields.contains(&"upstreams[0].base_url"));
        assert!(fields.contains(&"routes[2].prefix"));
        assert!(fields.contains(&"routes[2].upstream"));
    }

    #[test]
    fn test_duplicate_keys_case_insensitive() {
        let mut config = GatewayConfig::default();
        config.upstreams[1].key = "FILES".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = GatewayConfig::default();
        config.upstreams[0].base_url = "https://file-service".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "upstreams[0].base_url");
    }

    #[test]
    fn test_report_template_needs_placeholder() {
        let mut config = GatewayConfig::default();
        config.reports.path_template = "/works/reports".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "reports.path_template");
    }
}
