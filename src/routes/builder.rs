//! Named URL builders and their arguments.
//!
//! A builder is a first-class function registered under a name. It takes
//! positional parameters and, optionally, a trailing [`UrlOptions`] that can
//! override scheme, host and port or add query parameters.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::policy::UrlParams;

/// Errors raised while building a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("{builder}: missing parameter `{param}`")]
    MissingParam { builder: String, param: String },

    #[error("{builder}: expected {expected} parameters, got {given}")]
    TooManyParams {
        builder: String,
        expected: usize,
        given: usize,
    },

    #[error("{builder}: value {value:?} for `{param}` is not a usable path segment")]
    InvalidParam {
        builder: String,
        param: String,
        value: String,
    },

    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid host {0:?}")]
    InvalidHost(String),

    #[error("no helper named {0:?}")]
    UnknownHelper(String),
}

/// Options map accepted as the trailing argument of a builder call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlOptions {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Extra query parameters.
    pub params: BTreeMap<String, String>,
    pub anchor: Option<String>,
}

impl UrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Overwrite scheme, host and port with `forced`.
    ///
    /// A forced port of `None` clears any caller port so the protocol
    /// default applies.
    pub fn force(&mut self, forced: &UrlParams) {
        self.scheme = Some(forced.scheme().to_string());
        self.host = Some(forced.host().to_string());
        self.port = forced.port();
    }
}

/// One argument of a builder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteArg {
    Param(String),
    Options(UrlOptions),
}

impl From<&str> for RouteArg {
    fn from(value: &str) -> Self {
        RouteArg::Param(value.to_string())
    }
}

impl From<String> for RouteArg {
    fn from(value: String) -> Self {
        RouteArg::Param(value)
    }
}

impl From<u64> for RouteArg {
    fn from(value: u64) -> Self {
        RouteArg::Param(value.to_string())
    }
}

impl From<i64> for RouteArg {
    fn from(value: i64) -> Self {
        RouteArg::Param(value.to_string())
    }
}

impl From<UrlOptions> for RouteArg {
    fn from(options: UrlOptions) -> Self {
        RouteArg::Options(options)
    }
}

/// Split arguments into positional parameters and the trailing options.
pub fn split_args(args: &[RouteArg]) -> (Vec<&str>, Option<&UrlOptions>) {
    let (options, positional) = match args.split_last() {
        Some((RouteArg::Options(options), rest)) => (Some(options), rest),
        _ => (None, args),
    };
    let params = positional
        .iter()
        .filter_map(|arg| match arg {
            RouteArg::Param(value) => Some(value.as_str()),
            RouteArg::Options(_) => None,
        })
        .collect();
    (params, options)
}

/// What a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderKind {
    /// Absolute URL with scheme and host.
    Url,
    /// Path only, relative to the current host.
    Path,
    /// Parameter map that does not resolve to a URL.
    Params,
}

pub type BuildFn = dyn Fn(&[RouteArg]) -> Result<String, UrlError> + Send + Sync;

/// A named URL-building function.
#[derive(Clone)]
pub struct UrlBuilder {
    name: Arc<str>,
    kind: BuilderKind,
    build: Arc<BuildFn>,
}

impl UrlBuilder {
    pub fn new<F>(name: impl Into<Arc<str>>, kind: BuilderKind, build: F) -> Self
    where
        F: Fn(&[RouteArg]) -> Result<String, UrlError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            build: Arc::new(build),
        }
    }

    /// Absolute URL builder for a `/segment/:param` pattern, rooted at
    /// `origin` unless the call's options say otherwise.
    pub fn url_for_pattern(name: impl Into<Arc<str>>, pattern: &str, origin: UrlParams) -> Self {
        let name = name.into();
        let pattern = RoutePattern::parse(pattern);
        let builder_name = name.clone();
        Self::new(name, BuilderKind::Url, move |args| {
            let (params, options) = split_args(args);
            let defaults = UrlOptions::default();
            let options = options.unwrap_or(&defaults);

            let scheme = options.scheme.as_deref().unwrap_or(origin.scheme());
            if !matches!(scheme, "http" | "https") {
                return Err(UrlError::UnsupportedScheme(scheme.to_string()));
            }
            let host = options.host.as_deref().unwrap_or(origin.host());
            let mut url = Url::parse(&format!("{scheme}://{host}/"))
                .map_err(|_| UrlError::InvalidHost(host.to_string()))?;
            let port = if options.host.is_some() || options.scheme.is_some() {
                options.port
            } else {
                options.port.or(origin.port())
            };
            url.set_port(port)
                .map_err(|_| UrlError::InvalidHost(host.to_string()))?;

            pattern.render(&builder_name, &params, &mut url)?;
            finish(&mut url, options);
            Ok(url.to_string())
        })
    }

    /// Path-only builder for a `/segment/:param` pattern.
    pub fn path_for_pattern(name: impl Into<Arc<str>>, pattern: &str) -> Self {
        let name = name.into();
        let pattern = RoutePattern::parse(pattern);
        let builder_name = name.clone();
        Self::new(name, BuilderKind::Path, move |args| {
            let (params, options) = split_args(args);
            let mut url = Url::parse("http://localhost/").map_err(|_| {
                UrlError::InvalidHost("localhost".to_string())
            })?;
            pattern.render(&builder_name, &params, &mut url)?;
            if let Some(options) = options {
                finish(&mut url, options);
            }
            let mut path = url.path().to_string();
            if let Some(query) = url.query() {
                path.push('?');
                path.push_str(query);
            }
            if let Some(fragment) = url.fragment() {
                path.push('#');
                path.push_str(fragment);
            }
            Ok(path)
        })
    }

    /// Builder that maps a pattern's parameters to a JSON object.
    pub fn params_for_pattern(name: impl Into<Arc<str>>, pattern: &str) -> Self {
        let name = name.into();
        let pattern = RoutePattern::parse(pattern);
        let builder_name = name.clone();
        Self::new(name, BuilderKind::Params, move |args| {
            let (params, _) = split_args(args);
            let map = pattern.bind(&builder_name, &params)?;
            Ok(serde_json::Value::from(serde_json::Map::from_iter(
                map.into_iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::from(v))),
            ))
            .to_string())
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BuilderKind {
        self.kind
    }

    /// Invoke the builder.
    pub fn call(&self, args: &[RouteArg]) -> Result<String, UrlError> {
        (self.build)(args)
    }
}

impl fmt::Debug for UrlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlBuilder")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn finish(url: &mut Url, options: &UrlOptions) {
    if !options.params.is_empty() {
        url.query_pairs_mut().extend_pairs(options.params.iter());
    }
    url.set_fragment(options.anchor.as_deref());
}

#[derive(Debug, Clone)]
enum Segment {
    Static(String),
    Param(String),
}

/// A parsed `/users/:id/posts` route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(param) => Segment::Param(param.to_string()),
                None => Segment::Static(s.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Names of the `:param` segments, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Same pattern in axum's `{param}` syntax.
    pub fn to_axum_path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(text) => format!("/{text}"),
                Segment::Param(name) => format!("/{{{name}}}"),
            })
            .collect()
    }

    /// Path with parameter names erased; two patterns with the same shape
    /// match the same requests.
    pub fn shape(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(text) => format!("/{text}"),
                Segment::Param(_) => "/:".to_string(),
            })
            .collect()
    }

    fn bind<'a, 'p>(
        &'a self,
        builder: &str,
        params: &[&'p str],
    ) -> Result<Vec<(&'a str, &'p str)>, UrlError> {
        let names: Vec<&str> = self.param_names().collect();
        if params.len() > names.len() {
            return Err(UrlError::TooManyParams {
                builder: builder.to_string(),
                expected: names.len(),
                given: params.len(),
            });
        }
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                params.get(i).map(|value| (*name, *value)).ok_or_else(|| {
                    UrlError::MissingParam {
                        builder: builder.to_string(),
                        param: name.to_string(),
                    }
                })
            })
            .collect()
    }

    fn render(&self, builder: &str, params: &[&str], url: &mut Url) -> Result<(), UrlError> {
        let bound = self.bind(builder, params)?;
        // Empty, "." and ".." segments would be dropped or collapsed and the
        // URL would name another resource.
        if let Some((param, value)) = bound
            .iter()
            .find(|(_, value)| matches!(*value, "" | "." | ".."))
        {
            return Err(UrlError::InvalidParam {
                builder: builder.to_string(),
                param: param.to_string(),
                value: value.to_string(),
            });
        }
        let mut values = bound.into_iter().map(|(_, value)| value);
        let mut path = url
            .path_segments_mut()
            .map_err(|()| UrlError::InvalidHost(builder.to_string()))?;
        path.clear();
        for segment in &self.segments {
            match segment {
                Segment::Static(text) => path.push(text),
                Segment::Param(_) => path.push(values.next().unwrap_or_default()),
            };
        }
        Ok(())
    }
}
