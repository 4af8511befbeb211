//! The protocol policy: canonical secure/insecure parameters plus the
//! enforcement mode.

use serde::{Deserialize, Serialize};

use crate::config::schema::{SslConfig, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT};
use crate::guard::context::RequestContext;
use crate::policy::params::{Protocol, UrlParams};
use crate::policy::PolicyError;

/// How strictly the policy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Every guarded request is checked.
    #[default]
    Strict,

    /// Nothing is enforced and URL variants are left unaltered. For local
    /// setups with self-signed certificates where redirects get in the way.
    #[serde(alias = "development")]
    PassThroughInDevelopment,
}

/// Outcome of evaluating a request against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation<'a> {
    Satisfied,
    /// The request uses the wrong protocol; carries the parameters of the
    /// required side to redirect to.
    Violation(&'a UrlParams),
}

/// Immutable protocol policy, built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolPolicy {
    secure: UrlParams,
    insecure: UrlParams,
    mode: EnforcementMode,
}

impl ProtocolPolicy {
    /// Build a policy for `hostname`.
    ///
    /// Ports of `None` or `0` fall back to 443/80. When both ports are the
    /// defaults no port is written into URLs; otherwise both sides carry
    /// their port explicitly.
    pub fn new(
        hostname: &str,
        https_port: Option<u16>,
        http_port: Option<u16>,
        mode: EnforcementMode,
    ) -> Result<Self, PolicyError> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(PolicyError::MissingHostname);
        }

        let https_port = https_port.filter(|p| *p != 0).unwrap_or(DEFAULT_HTTPS_PORT);
        let http_port = http_port.filter(|p| *p != 0).unwrap_or(DEFAULT_HTTP_PORT);
        if https_port == http_port {
            return Err(PolicyError::PortCollision(https_port));
        }

        let explicit = https_port != DEFAULT_HTTPS_PORT || http_port != DEFAULT_HTTP_PORT;
        let (secure_port, insecure_port) = if explicit {
            (Some(https_port), Some(http_port))
        } else {
            (None, None)
        };

        Ok(Self {
            secure: UrlParams::new(Protocol::Secure, hostname, secure_port)?,
            insecure: UrlParams::new(Protocol::Insecure, hostname, insecure_port)?,
            mode,
        })
    }

    /// Build the policy from a loaded configuration.
    pub fn from_config(config: &SslConfig) -> Result<Self, PolicyError> {
        let hostname = config.hostname.as_deref().ok_or(PolicyError::MissingHostname)?;
        Self::new(hostname, config.https_port, config.http_port, config.mode)
    }

    pub fn secure(&self) -> &UrlParams {
        &self.secure
    }

    pub fn insecure(&self) -> &UrlParams {
        &self.insecure
    }

    /// Parameters for the given protocol.
    pub fn params(&self, protocol: Protocol) -> &UrlParams {
        match protocol {
            Protocol::Secure => &self.secure,
            Protocol::Insecure => &self.insecure,
        }
    }

    pub fn mode(&self) -> EnforcementMode {
        self.mode
    }

    pub fn is_pass_through(&self) -> bool {
        self.mode == EnforcementMode::PassThroughInDevelopment
    }

    /// Check whether `ctx` satisfies `required`.
    pub fn evaluate<C>(&self, ctx: &C, required: Protocol) -> Evaluation<'_>
    where
        C: RequestContext + ?Sized,
    {
        if self.is_pass_through() || required.is_satisfied_by(ctx.is_secure()) {
            Evaluation::Satisfied
        } else {
            Evaluation::Violation(self.params(required))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockContext;

    fn strict(https: Option<u16>, http: Option<u16>) -> ProtocolPolicy {
        ProtocolPolicy::new("example.com", https, http, EnforcementMode::Strict).unwrap()
    }

    #[test]
    fn test_default_ports_are_omitted() {
        for (https, http) in [(None, None), (Some(443), Some(80)), (Some(0), Some(0))] {
            let policy = strict(https, http);
            assert_eq!(policy.secure().port(), None);
            assert_eq!(policy.insecure().port(), None);
            assert_eq!(policy.secure().origin().as_str(), "https://example.com/");
            assert_eq!(policy.insecure().origin().as_str(), "http://example.com/");
        }
    }

    #[test]
    fn test_non_default_ports_are_explicit() {
        let policy = strict(Some(8443), Some(8080));
        assert_eq!(policy.secure().port(), Some(8443));
        assert_eq!(policy.insecure().port(), Some(8080));

        // One non-default port makes both explicit.
        let policy = strict(Some(8443), None);
        assert_eq!(policy.secure().port(), Some(8443));
        assert_eq!(policy.insecure().port(), Some(80));
        assert_ne!(policy.secure().port(), policy.insecure().port());
    }

    #[test]
    fn test_schemes_differ() {
        let policy = strict(None, None);
        assert_eq!(policy.secure().scheme(), "https");
        assert_eq!(policy.insecure().scheme(), "http");
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            ProtocolPolicy::new("  ", None, None, EnforcementMode::Strict),
            Err(PolicyError::MissingHostname)
        );
        assert_eq!(
            ProtocolPolicy::new("example.com", Some(8000), Some(8000), EnforcementMode::Strict),
            Err(PolicyError::PortCollision(8000))
        );
        assert!(matches!(
            ProtocolPolicy::new("bad/host", None, None, EnforcementMode::Strict),
            Err(PolicyError::InvalidHost(_))
        ));
        assert_eq!(
            ProtocolPolicy::from_config(&SslConfig::default()),
            Err(PolicyError::MissingHostname)
        );
    }

    #[test]
    fn test_evaluate() {
        let policy = strict(None, None);

        let plain = MockContext::get("/login");
        let secure = MockContext::get("/login").secure();

        assert_eq!(policy.evaluate(&secure, Protocol::Secure), Evaluation::Satisfied);
        assert_eq!(policy.evaluate(&plain, Protocol::Insecure), Evaluation::Satisfied);
        assert_eq!(
            policy.evaluate(&plain, Protocol::Secure),
            Evaluation::Violation(policy.secure())
        );
        assert_eq!(
            policy.evaluate(&secure, Protocol::Insecure),
            Evaluation::Violation(policy.insecure())
        );
    }

    #[test]
    fn test_pass_through_always_satisfied() {
        let policy = ProtocolPolicy::new(
            "example.com",
            None,
            None,
            EnforcementMode::PassThroughInDevelopment,
        )
        .unwrap();

        for ctx in [MockContext::get("/"), MockContext::post("/").secure()] {
            assert_eq!(policy.evaluate(&ctx, Protocol::Secure), Evaluation::Satisfied);
            assert_eq!(policy.evaluate(&ctx, Protocol::Insecure), Evaluation::Satisfied);
        }
    }
}
