//! Test helpers for code that sits behind the guard.
//!
//! `force_secure` / `force_insecure` flip the protocol a request reports
//! and return a guard that puts the previous state back when dropped, so the
//! original values return even when the test body panics.
//!
//! ```ignore
//! let mut request = Request::get("/login").body(Body::empty())?;
//! with_ssl(&mut request, |req| assert!(req.is_secure()));
//! assert!(!request.is_secure());
//! ```

use std::ops::{Deref, DerefMut};

use axum::http::{HeaderValue, Method, Request};

use crate::guard::context::{
    RequestContext, Transport, X_FORWARDED_PORT, X_FORWARDED_PROTO, X_FORWARDED_SSL,
};

/// Something whose reported protocol can be switched in tests.
pub trait SslToggle {
    type Saved;

    fn save_ssl(&self) -> Self::Saved;
    fn restore_ssl(&mut self, saved: Self::Saved);

    /// Report HTTPS on port 443.
    fn use_ssl(&mut self);

    /// Report plain HTTP on port 80.
    fn forget_ssl(&mut self);
}

/// Restores the saved protocol state on drop.
pub struct SslOverride<'a, T: SslToggle> {
    target: &'a mut T,
    saved: Option<T::Saved>,
}

impl<T: SslToggle> Deref for SslOverride<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: SslToggle> DerefMut for SslOverride<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: SslToggle> Drop for SslOverride<'_, T> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.target.restore_ssl(saved);
        }
    }
}

/// Make `target` report HTTPS until the returned guard is dropped.
pub fn force_secure<T: SslToggle>(target: &mut T) -> SslOverride<'_, T> {
    let saved = target.save_ssl();
    target.use_ssl();
    SslOverride {
        target,
        saved: Some(saved),
    }
}

/// Make `target` report plain HTTP until the returned guard is dropped.
pub fn force_insecure<T: SslToggle>(target: &mut T) -> SslOverride<'_, T> {
    let saved = target.save_ssl();
    target.forget_ssl();
    SslOverride {
        target,
        saved: Some(saved),
    }
}

/// Run `f` with `target` reporting HTTPS, then restore it.
pub fn with_ssl<T: SslToggle, R>(target: &mut T, f: impl FnOnce(&mut T) -> R) -> R {
    let mut guard = force_secure(target);
    f(&mut guard)
}

/// Run `f` with `target` reporting plain HTTP, then restore it.
pub fn without_ssl<T: SslToggle, R>(target: &mut T, f: impl FnOnce(&mut T) -> R) -> R {
    let mut guard = force_insecure(target);
    f(&mut guard)
}

/// Forwarding headers and transport marker of a request.
#[derive(Debug, Clone)]
pub struct SavedRequestSsl {
    proto: Option<HeaderValue>,
    port: Option<HeaderValue>,
    ssl: Option<HeaderValue>,
    transport: Option<Transport>,
}

impl<B> SslToggle for Request<B> {
    type Saved = SavedRequestSsl;

    fn save_ssl(&self) -> SavedRequestSsl {
        SavedRequestSsl {
            proto: self.headers().get(X_FORWARDED_PROTO).cloned(),
            port: self.headers().get(X_FORWARDED_PORT).cloned(),
            ssl: self.headers().get(X_FORWARDED_SSL).cloned(),
            transport: self.extensions().get::<Transport>().copied(),
        }
    }

    fn restore_ssl(&mut self, saved: SavedRequestSsl) {
        let headers = self.headers_mut();
        for (name, value) in [
            (X_FORWARDED_PROTO, saved.proto),
            (X_FORWARDED_PORT, saved.port),
            (X_FORWARDED_SSL, saved.ssl),
        ] {
            match value {
                Some(value) => {
                    headers.insert(name, value);
                }
                None => {
                    headers.remove(name);
                }
            }
        }
        match saved.transport {
            Some(transport) => {
                self.extensions_mut().insert(transport);
            }
            None => {
                self.extensions_mut().remove::<Transport>();
            }
        }
    }

    fn use_ssl(&mut self) {
        let headers = self.headers_mut();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
        headers.insert(X_FORWARDED_PORT, HeaderValue::from_static("443"));
        headers.remove(X_FORWARDED_SSL);
    }

    fn forget_ssl(&mut self) {
        let headers = self.headers_mut();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
        headers.insert(X_FORWARDED_PORT, HeaderValue::from_static("80"));
        headers.remove(X_FORWARDED_SSL);
        self.extensions_mut().insert(Transport::Plain);
    }
}

/// A plain in-memory request context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub secure: bool,
}

impl MockContext {
    /// Context for `method` on `target` (`/path?query`), over plain HTTP.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            secure: false,
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    /// Same context arriving over HTTPS.
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }
}

impl RequestContext for MockContext {
    fn is_secure(&self) -> bool {
        self.secure
    }

    fn is_safe_method(&self) -> bool {
        self.method.is_safe()
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

impl SslToggle for MockContext {
    type Saved = bool;

    fn save_ssl(&self) -> bool {
        self.secure
    }

    fn restore_ssl(&mut self, saved: bool) {
        self.secure = saved;
    }

    fn use_ssl(&mut self) {
        self.secure = true;
    }

    fn forget_ssl(&mut self) {
        self.secure = false;
    }
}
