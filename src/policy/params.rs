//! Connection parameters for one side of the policy.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::policy::PolicyError;

/// The protocol a request is required to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// HTTPS.
    Secure,
    /// Plain HTTP.
    Insecure,
}

impl Protocol {
    /// URL scheme for this protocol.
    pub fn scheme(self) -> &'static str {
        match self {
            Protocol::Secure => "https",
            Protocol::Insecure => "http",
        }
    }

    /// The port a client assumes when none is given.
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Secure => 443,
            Protocol::Insecure => 80,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Protocol::Secure => Protocol::Insecure,
            Protocol::Insecure => Protocol::Secure,
        }
    }

    /// Whether a request with the given security satisfies this protocol.
    pub fn is_satisfied_by(self, is_secure: bool) -> bool {
        is_secure == (self == Protocol::Secure)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Scheme, host and optional port forced onto URLs for one protocol.
///
/// A `None` port means "the protocol default" and is never written into
/// generated URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParams {
    protocol: Protocol,
    host: String,
    port: Option<u16>,
    origin: Url,
}

impl UrlParams {
    /// Build parameters, checking that `host` can stand in a URL.
    pub fn new(protocol: Protocol, host: &str, port: Option<u16>) -> Result<Self, PolicyError> {
        let invalid = || PolicyError::InvalidHost(host.to_string());

        if host.is_empty() || host.contains(['/', ':', '@', '?', '#']) {
            return Err(invalid());
        }
        let mut origin =
            Url::parse(&format!("{}://{}/", protocol.scheme(), host)).map_err(|_| invalid())?;
        origin.set_port(port).map_err(|_| invalid())?;

        Ok(Self {
            protocol,
            host: origin.host_str().unwrap_or(host).to_string(),
            port,
            origin,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn scheme(&self) -> &'static str {
        self.protocol.scheme()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Origin URL (`scheme://host[:port]/`).
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Build the URL for `path` and `query` under these parameters.
    ///
    /// The path is always rooted at this origin, so a path such as
    /// `//other.host/x` cannot move the redirect to another host.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.origin.clone();
        url.set_path(path);
        url.set_query(query.filter(|q| !q.is_empty()));
        url
    }

    /// Rewrite scheme, host and port of `url` to these parameters.
    ///
    /// Returns `false` when the URL cannot carry a host (e.g. `mailto:`),
    /// leaving it untouched.
    pub fn apply_to(&self, url: &mut Url) -> bool {
        if url.cannot_be_a_base() {
            return false;
        }
        let mut rewritten = self.origin.clone();
        rewritten.set_path(url.path());
        rewritten.set_query(url.query());
        rewritten.set_fragment(url.fragment());
        *url = rewritten;
        true
    }
}
