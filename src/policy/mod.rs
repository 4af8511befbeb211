//! Protocol policy subsystem.
//!
//! # Data Flow
//! ```text
//! SslConfig (hostname, ports, mode)
//!     → policy.rs (apply port defaults, omit default ports)
//!     → params.rs (secure / insecure UrlParams)
//!     → ProtocolPolicy (immutable, shared via Arc)
//!
//! Per request:
//!     RequestContext + required Protocol
//!     → ProtocolPolicy::evaluate
//!     → Satisfied | Violation(target params)
//! ```
//!
//! # Design Decisions
//! - All environment-dependent behaviour lives in `EnforcementMode`
//! - Default ports (443/80) never appear in generated URLs

#[allow(clippy::module_inception)]
pub mod policy;
pub mod params;

use thiserror::Error;

pub use params::{Protocol, UrlParams};
pub use policy::{EnforcementMode, Evaluation, ProtocolPolicy};

/// Errors raised while building a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("hostname is required")]
    MissingHostname,

    #[error("invalid hostname: {0}")]
    InvalidHost(String),

    #[error("https and http cannot share port {0}")]
    PortCollision(u16),
}
