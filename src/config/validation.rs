//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the hostname is present and usable as a URL host
//! - Validate value ranges (ports distinct, status code classes)
//! - Detect ambiguous rules and duplicate routes
//! - Reject route paths the HTTP router cannot register
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SslConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::schema::SslConfig;
use crate::routes::RoutePattern;

/// Built-in endpoint listing the generated helpers. Routes may not live under
/// [`RESERVED_PREFIX`].
pub const HELPERS_PATH: &str = "/_ssl/helpers";

/// First path segment reserved for built-in endpoints.
pub const RESERVED_PREFIX: &str = "_ssl";

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("hostname is required")]
    MissingHostname,

    #[error("hostname {0:?} is not a valid host")]
    InvalidHostname(String),

    #[error("https_port and http_port are both {0}")]
    PortCollision(u16),

    #[error("redirect_status {0} is not a redirection status")]
    InvalidRedirectStatus(u16),

    #[error("reject_status {0} is not a client error status")]
    InvalidRejectStatus(u16),

    #[error("rule for resource {0:?} sets both `only` and `except`")]
    AmbiguousRule(String),

    #[error("route {0:?} is defined more than once")]
    DuplicateRoute(String),

    #[error("route {0:?} path must start with '/'")]
    RelativeRoutePath(String),

    #[error("route {0:?} reuses the path of another route")]
    DuplicatePath(String),

    #[error("route {0:?} is under the reserved /_ssl prefix")]
    ReservedRoutePath(String),

    #[error("route {route:?} has invalid segment {segment:?}: {reason}")]
    InvalidRouteSegment {
        route: String,
        segment: String,
        reason: &'static str,
    },

    #[error("route {route:?} names parameter {param:?} where another route uses {other:?}")]
    ConflictingParam {
        route: String,
        param: String,
        other: String,
    },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SslConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.hostname.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingHostname),
        Some(host) => {
            if url::Host::parse(host).is_err() || host.contains(['/', ':', '@', '?', '#']) {
                errors.push(ValidationError::InvalidHostname(host.to_string()));
            }
        }
    }

    let https_port = config.effective_https_port();
    if https_port == config.effective_http_port() {
        errors.push(ValidationError::PortCollision(https_port));
    }

    let redirect = config.responses.redirect_status;
    if !matches!(redirect, 301 | 302 | 303 | 307 | 308) {
        errors.push(ValidationError::InvalidRedirectStatus(redirect));
    }

    let reject = config.responses.reject_status;
    if !(400..500).contains(&reject) {
        errors.push(ValidationError::InvalidRejectStatus(reject));
    }

    for rule in &config.rules {
        if !rule.only.is_empty() && !rule.except.is_empty() {
            errors.push(ValidationError::AmbiguousRule(rule.resource.clone()));
        }
    }

    let mut names = HashSet::new();
    let mut paths = HashSet::new();
    // Parameter name seen after each path prefix; the router cannot hold two
    // differently named parameters at the same position.
    let mut params: HashMap<String, String> = HashMap::new();
    for route in &config.routes {
        if !route.path.starts_with('/') {
            errors.push(ValidationError::RelativeRoutePath(route.name.clone()));
        }

        let segments: Vec<&str> = route.path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.first() == Some(&RESERVED_PREFIX) {
            errors.push(ValidationError::ReservedRoutePath(route.name.clone()));
            continue;
        }

        let mut well_formed = true;
        for segment in &segments {
            if let Some(reason) = segment_problem(segment) {
                errors.push(ValidationError::InvalidRouteSegment {
                    route: route.name.clone(),
                    segment: segment.to_string(),
                    reason,
                });
                well_formed = false;
            }
        }
        if !well_formed {
            continue;
        }

        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
            continue;
        }
        if !paths.insert(RoutePattern::parse(&route.path).shape()) {
            errors.push(ValidationError::DuplicatePath(route.name.clone()));
            continue;
        }

        for (i, segment) in segments.iter().enumerate() {
            let Some(param) = segment.strip_prefix(':') else {
                continue;
            };
            let prefix = RoutePattern::parse(&segments[..i].join("/")).shape();
            match params.get(&prefix) {
                Some(other) if other != param => {
                    errors.push(ValidationError::ConflictingParam {
                        route: route.name.clone(),
                        param: param.to_string(),
                        other: other.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    params.insert(prefix, param.to_string());
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Why the router would refuse `segment`, if it would.
fn segment_problem(segment: &str) -> Option<&'static str> {
    if segment.starts_with('*') {
        return Some("wildcard segments are not supported");
    }
    if segment.contains(['{', '}']) {
        return Some("braces are not allowed");
    }
    if let Some(param) = segment.strip_prefix(':') {
        if param.is_empty() {
            return Some("parameter name is empty");
        }
        if !param.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Some("parameter names may only use letters, digits and '_'");
        }
    }
    None
}
