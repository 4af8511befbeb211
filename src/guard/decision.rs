//! The request-time protocol check.

use thiserror::Error;
use url::Url;

use crate::guard::context::RequestContext;
use crate::policy::{Evaluation, Protocol, ProtocolPolicy};

/// Why a request was refused outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("this action must be requested over HTTPS")]
    SslRequired,

    #[error("this action must be requested over plain HTTP")]
    SslRefused,
}

impl ProtocolViolation {
    pub fn for_required(required: Protocol) -> Self {
        match required {
            Protocol::Secure => ProtocolViolation::SslRequired,
            Protocol::Insecure => ProtocolViolation::SslRefused,
        }
    }
}

/// What to do with a guarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Same path and query under the required protocol.
    Redirect(Url),
    /// The request has side effects and must not be silently redirected.
    Reject(ProtocolViolation),
}

impl GuardDecision {
    pub fn label(&self) -> &'static str {
        match self {
            GuardDecision::Proceed => "proceed",
            GuardDecision::Redirect(_) => "redirect",
            GuardDecision::Reject(_) => "reject",
        }
    }
}

/// Decide whether `ctx` may proceed under `required`.
pub fn guard<C>(policy: &ProtocolPolicy, ctx: &C, required: Protocol) -> GuardDecision
where
    C: RequestContext + ?Sized,
{
    if policy.is_pass_through() {
        return GuardDecision::Proceed;
    }

    match policy.evaluate(ctx, required) {
        Evaluation::Satisfied => GuardDecision::Proceed,
        Evaluation::Violation(target) if ctx.is_safe_method() => {
            GuardDecision::Redirect(target.url_for(ctx.path(), ctx.query()))
        }
        Evaluation::Violation(_) => GuardDecision::Reject(ProtocolViolation::for_required(required)),
    }
}
