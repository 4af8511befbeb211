//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the SSL helper.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::policy::EnforcementMode;

/// Default HTTPS port; omitted from generated URLs.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Default HTTP port; omitted from generated URLs.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SslConfig {
    /// Canonical host used for both secure and insecure URLs.
    pub hostname: Option<String>,

    /// Port the HTTPS site answers on. Zero or absent means 443.
    pub https_port: Option<u16>,

    /// Port the plain HTTP site answers on. Zero or absent means 80.
    pub http_port: Option<u16>,

    /// Enforcement mode.
    pub mode: EnforcementMode,

    /// Status codes used by the guard.
    pub responses: ResponseConfig,

    /// Which named builders receive `ssl_`/`plain_` variants.
    pub helpers: HelperConfig,

    /// Per-resource / per-action protocol requirements.
    pub rules: Vec<RuleConfig>,

    /// Demo server routes.
    pub routes: Vec<RouteConfig>,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl SslConfig {
    /// Effective HTTPS port after applying the default.
    pub fn effective_https_port(&self) -> u16 {
        match self.https_port {
            Some(0) | None => DEFAULT_HTTPS_PORT,
            Some(port) => port,
        }
    }

    /// Effective HTTP port after applying the default.
    pub fn effective_http_port(&self) -> u16 {
        match self.http_port {
            Some(0) | None => DEFAULT_HTTP_PORT,
            Some(port) => port,
        }
    }
}

/// Response status configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Status for redirects issued to safe requests.
    pub redirect_status: u16,

    /// Status for protocol violations on unsafe requests.
    pub reject_status: u16,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            redirect_status: 302,
            reject_status: 421,
        }
    }
}

/// Helper name filtering.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Builder names starting with any of these are skipped.
    pub exclude_prefixes: Vec<String>,

    /// Builder names ending with any of these are skipped.
    pub exclude_suffixes: Vec<String>,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            exclude_prefixes: vec![
                "hash_for_".to_string(),
                "formatted_".to_string(),
                "polymorphic_".to_string(),
                "redirect_".to_string(),
            ],
            exclude_suffixes: vec!["_path".to_string()],
        }
    }
}

/// Requirement keyword in a rule.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SslKeyword {
    Require,
    Refuse,
    Ignore,
}

/// A protocol rule for a resource, optionally narrowed to some actions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Resource (controller) name.
    pub resource: String,

    /// Requirement applied by this rule.
    pub ssl: SslKeyword,

    /// Apply only to these actions.
    #[serde(default)]
    pub only: Vec<String>,

    /// Apply to every action except these.
    #[serde(default)]
    pub except: Vec<String>,
}

/// A route served by the demo server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route name; builders are registered as `<name>_url` and `<name>_path`.
    pub name: String,

    /// Path pattern, `:param` segments allowed (e.g. "/profile/:id").
    pub path: String,

    /// Resource the route belongs to.
    pub resource: String,

    /// Action within the resource.
    pub action: String,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Plain HTTP bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS listener.
    pub tls: Option<TlsConfig>,

    /// Honour `X-Forwarded-Proto` / `X-Forwarded-Ssl` when deciding whether a
    /// request is secure. Disable when no TLS-terminating proxy sits in front,
    /// since any client can send these headers.
    pub trust_forwarded_headers: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            trust_forwarded_headers: true,
        }
    }
}

/// TLS configuration for the secure listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Bind address for HTTPS (e.g., "0.0.0.0:8443").
    pub bind_address: String,

    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
