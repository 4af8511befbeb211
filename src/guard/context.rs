//! Request context seen by the guard.
//!
//! # Header Detection
//!
//! An HTTP request counts as secure when, in this order:
//! 1. the listener marked it with [`Transport::Tls`]
//! 2. `X-Forwarded-Proto` says `https` (set by a TLS-terminating proxy)
//! 3. `X-Forwarded-Ssl` is `on` (legacy proxies)
//! 4. the request URI itself carries the `https` scheme

use axum::http::{HeaderMap, Method, Request};

pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
pub const X_FORWARDED_SSL: &str = "x-forwarded-ssl";
pub const X_FORWARDED_PORT: &str = "x-forwarded-port";

/// What the guard needs to know about the current request.
pub trait RequestContext {
    /// Whether the request arrived over HTTPS.
    fn is_secure(&self) -> bool;

    /// Whether the method has no side effects.
    fn is_safe_method(&self) -> bool;

    /// Path of the requested resource.
    fn path(&self) -> &str;

    /// Query string, without the leading `?`.
    fn query(&self) -> Option<&str>;
}

/// Transport the request was accepted on, inserted as a request extension by
/// the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Plain,
    Tls,
}

/// GET, HEAD, OPTIONS and TRACE.
pub fn is_safe(method: &Method) -> bool {
    method.is_safe()
}

/// Secure-connection hint carried by forwarding headers, if any.
pub fn forwarded_secure(headers: &HeaderMap) -> Option<bool> {
    if let Some(proto) = headers.get(X_FORWARDED_PROTO).and_then(|v| v.to_str().ok()) {
        // Proxies chaining their values produce "https, http"; the first hop wins.
        let first = proto.split(',').next().unwrap_or_default().trim();
        return Some(first.eq_ignore_ascii_case("https"));
    }

    headers
        .get(X_FORWARDED_SSL)
        .and_then(|v| v.to_str().ok())
        .map(|ssl| ssl.trim().eq_ignore_ascii_case("on"))
}

fn accepted_over_tls<B>(request: &Request<B>) -> bool {
    request.extensions().get::<Transport>() == Some(&Transport::Tls)
}

fn uri_is_https<B>(request: &Request<B>) -> bool {
    request
        .uri()
        .scheme_str()
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https"))
}

impl<B> RequestContext for Request<B> {
    fn is_secure(&self) -> bool {
        if accepted_over_tls(self) {
            return true;
        }
        if let Some(secure) = forwarded_secure(self.headers()) {
            return secure;
        }
        uri_is_https(self)
    }

    fn is_safe_method(&self) -> bool {
        is_safe(self.method())
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn query(&self) -> Option<&str> {
        self.uri().query()
    }
}

/// A request seen without its forwarding headers.
///
/// Used when no trusted proxy sits in front of the listener: only the
/// transport marker and the URI scheme decide whether it is secure.
#[derive(Debug)]
pub struct DirectRequest<'a, B>(pub &'a Request<B>);

impl<B> RequestContext for DirectRequest<'_, B> {
    fn is_secure(&self) -> bool {
        accepted_over_tls(self.0) || uri_is_https(self.0)
    }

    fn is_safe_method(&self) -> bool {
        is_safe(self.0.method())
    }

    fn path(&self) -> &str {
        self.0.uri().path()
    }

    fn query(&self) -> Option<&str> {
        self.0.uri().query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_plain_request() {
        let req = request(Method::GET, "/login?next=%2F");
        assert!(!req.is_secure());
        assert!(req.is_safe_method());
        assert_eq!(req.path(), "/login");
        assert_eq!(req.query(), Some("next=%2F"));
    }

    #[test]
    fn test_forwarded_proto() {
        let mut req = request(Method::GET, "/");
        req.headers_mut().insert(X_FORWARDED_PROTO, "HTTPS".parse().unwrap());
        assert!(req.is_secure());

        req.headers_mut().insert(X_FORWARDED_PROTO, "http, https".parse().unwrap());
        assert!(!req.is_secure());
    }

    #[test]
    fn test_forwarded_ssl() {
        let mut req = request(Method::GET, "/");
        req.headers_mut().insert(X_FORWARDED_SSL, "on".parse().unwrap());
        assert!(req.is_secure());
    }

    #[test]
    fn test_transport_extension_and_uri_scheme() {
        let mut req = request(Method::GET, "/");
        req.extensions_mut().insert(Transport::Tls);
        assert!(req.is_secure());

        let req = request(Method::GET, "https://example.com/");
        assert!(req.is_secure());
    }

    #[test]
    fn test_safe_methods() {
        for method in [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE] {
            assert!(is_safe(&method), "{method} should be safe");
        }
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(!is_safe(&method), "{method} should not be safe");
        }
    }

    #[test]
    fn test_direct_request_ignores_forwarding_headers() {
        let mut req = request(Method::GET, "/login?x=1");
        req.headers_mut().insert(X_FORWARDED_PROTO, "https".parse().unwrap());
        req.headers_mut().insert(X_FORWARDED_SSL, "on".parse().unwrap());
        assert!(req.is_secure());

        let direct = DirectRequest(&req);
        assert!(!direct.is_secure());
        assert_eq!(direct.path(), "/login");
        assert_eq!(direct.query(), Some("x=1"));

        req.extensions_mut().insert(Transport::Tls);
        assert!(DirectRequest(&req).is_secure());
    }
}
