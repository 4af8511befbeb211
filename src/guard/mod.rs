//! Request-time protocol enforcement.
//!
//! # Data Flow
//! ```text
//! Incoming request on a guarded route
//!     → middleware.rs (requirement for this resource/action)
//!     → rules.rs (require / refuse / ignore, most specific wins)
//!     → context.rs (is the request secure? is the method safe?)
//!     → decision.rs (Proceed | Redirect | Reject)
//!     → next handler, 30x with Location, or 4xx
//! ```
//!
//! # Design Decisions
//! - Safe requests are redirected; requests with side effects are rejected
//!   so a body is never dropped or replayed by a redirect
//! - Status codes come from configuration

pub mod context;
pub mod decision;
pub mod middleware;
pub mod rules;

pub use context::{DirectRequest, RequestContext, Transport};
pub use decision::{guard, GuardDecision, ProtocolViolation};
pub use middleware::{ssl_guard_middleware, ActionGuard};
pub use rules::{ActionScope, SslRequirement, SslRules};
