//! Axum middleware attaching the guard to a route.
//!
//! ```ignore
//! let login = ActionGuard::for_action(state.clone(), "accounts", "login");
//! let app = Router::new().route(
//!     "/login",
//!     get(show_login)
//!         .post(do_login)
//!         .route_layer(middleware::from_fn_with_state(login, ssl_guard_middleware)),
//! );
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::guard::context::DirectRequest;
use crate::guard::decision::{guard, GuardDecision};
use crate::guard::rules::SslRequirement;
use crate::observability::metrics;
use crate::state::SslState;

#[derive(Debug, Clone)]
enum Source {
    Fixed(SslRequirement),
    Rules {
        resource: Arc<str>,
        action: Arc<str>,
    },
}

/// Guard configuration for one endpoint.
#[derive(Debug, Clone)]
pub struct ActionGuard {
    state: Arc<SslState>,
    source: Source,
}

impl ActionGuard {
    /// Requirement looked up in the rule set on every request, so reloads
    /// take effect without rebuilding the router.
    pub fn for_action(
        state: Arc<SslState>,
        resource: impl Into<Arc<str>>,
        action: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            state,
            source: Source::Rules {
                resource: resource.into(),
                action: action.into(),
            },
        }
    }

    /// A requirement that ignores the rule set.
    pub fn fixed(state: Arc<SslState>, requirement: SslRequirement) -> Self {
        Self {
            state,
            source: Source::Fixed(requirement),
        }
    }

    pub fn requirement(&self) -> SslRequirement {
        match &self.source {
            Source::Fixed(requirement) => *requirement,
            Source::Rules { resource, action } => self.state.requirement(resource, action),
        }
    }
}

/// Redirect or reject requests that use the wrong protocol.
pub async fn ssl_guard_middleware(
    State(action): State<ActionGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(required) = action.requirement().protocol() else {
        return next.run(request).await;
    };

    let settings = action.state.settings();
    let decision = if settings.trust_forwarded {
        guard(&settings.policy, &request, required)
    } else {
        guard(&settings.policy, &DirectRequest(&request), required)
    };
    metrics::record_guard_decision(decision.label(), required);

    match decision {
        GuardDecision::Proceed => next.run(request).await,
        GuardDecision::Redirect(target) => {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                target = %target,
                "SSL helper: redirecting to {} url",
                required
            );
            match HeaderValue::from_str(target.as_str()) {
                Ok(location) => {
                    (settings.responses.redirect, [(header::LOCATION, location)]).into_response()
                }
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
        GuardDecision::Reject(violation) => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                reason = %violation,
                "SSL helper: refusing request"
            );
            (settings.responses.reject, violation.to_string()).into_response()
        }
    }
}
