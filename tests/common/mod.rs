//! Shared utilities for integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use ssl_helper::config::{parse_config, SslConfig};

/// Site used across the integration tests.
pub const SITE: &str = r#"
hostname = "shop.example.com"

[[rules]]
resource = "accounts"
ssl = "require"

[[rules]]
resource = "accounts"
ssl = "ignore"
only = ["logout"]

[[rules]]
resource = "pages"
ssl = "refuse"

[[routes]]
name = "home"
path = "/"
resource = "pages"
action = "home"

[[routes]]
name = "login"
path = "/login"
resource = "accounts"
action = "login"

[[routes]]
name = "logout"
path = "/logout"
resource = "accounts"
action = "logout"

[[routes]]
name = "profile"
path = "/profile/:id"
resource = "accounts"
action = "show"

[[routes]]
name = "catalog"
path = "/catalog"
resource = "products"
action = "index"
"#;

pub fn site_config() -> SslConfig {
    parse_config(SITE).unwrap()
}

/// `SITE` with extra top-level keys prepended.
pub fn site_config_with(extra: &str) -> SslConfig {
    parse_config(&format!("{extra}\n{SITE}")).unwrap()
}

/// Build a request; `headers` are added as given.
pub fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request through the router in-process.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
}
