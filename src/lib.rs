//! HTTP/HTTPS protocol enforcement for web applications.
//!
//! - [`policy`]: canonical secure/insecure URL parameters and the enforcement mode
//! - [`routes`]: named URL builders and their generated `ssl_`/`plain_` variants
//! - [`guard`]: per-action redirect/reject middleware
//! - [`testing`]: scoped protocol overrides for tests

pub mod config;
pub mod guard;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod routes;
pub mod state;
pub mod testing;

pub use config::SslConfig;
pub use guard::{guard, ActionGuard, GuardDecision, SslRequirement, SslRules};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use policy::{EnforcementMode, Protocol, ProtocolPolicy};
pub use routes::{generate, BuilderSet, DerivedBuilderRegistry, UrlBuilder};
pub use state::SslState;
