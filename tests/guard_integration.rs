//! Guard behaviour through the full router.

use axum::http::{Method, StatusCode};

use ssl_helper::HttpServer;

mod common;

use common::{body_string, location, request, send, site_config, site_config_with};

const HTTPS: (&str, &str) = ("x-forwarded-proto", "https");

#[tokio::test]
async fn test_safe_request_redirected_to_https() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::GET, "/login?next=%2Fcart", &[])).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(
        location(&res),
        Some("https://shop.example.com/login?next=%2Fcart")
    );
}

#[tokio::test]
async fn test_unsafe_request_rejected() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::POST, "/login", &[])).await;
    assert_eq!(res.status(), StatusCode::MISDIRECTED_REQUEST);
    assert!(location(&res).is_none());
    assert_eq!(
        body_string(res).await,
        "this action must be requested over HTTPS"
    );
}

#[tokio::test]
async fn test_secure_request_proceeds() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    for method in [Method::GET, Method::POST] {
        let res = send(&router, request(method, "/login", &[HTTPS])).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "accounts#login");
    }
}

#[tokio::test]
async fn test_refused_action_redirected_to_http() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::GET, "/?page=2", &[HTTPS])).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), Some("http://shop.example.com/?page=2"));

    let res = send(&router, request(Method::DELETE, "/", &[HTTPS])).await;
    assert_eq!(res.status(), StatusCode::MISDIRECTED_REQUEST);

    let res = send(&router, request(Method::GET, "/", &[])).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ignored_actions_accept_both_protocols() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    // `logout` is carved out of the accounts requirement; products has no rule.
    for uri in ["/logout", "/catalog"] {
        let plain = send(&router, request(Method::POST, uri, &[])).await;
        assert_eq!(plain.status(), StatusCode::OK, "{uri} over http");

        let secure = send(&router, request(Method::POST, uri, &[HTTPS])).await;
        assert_eq!(secure.status(), StatusCode::OK, "{uri} over https");
    }
}

#[tokio::test]
async fn test_dynamic_path_keeps_segments() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::GET, "/profile/42", &[])).await;
    assert_eq!(location(&res), Some("https://shop.example.com/profile/42"));
}

#[tokio::test]
async fn test_host_header_does_not_leak_into_redirect() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    let res = send(
        &router,
        request(Method::GET, "/login", &[("host", "evil.example.net")]),
    )
    .await;
    assert_eq!(location(&res), Some("https://shop.example.com/login"));
}

#[tokio::test]
async fn test_non_default_ports_in_redirects() {
    let server = HttpServer::new(site_config_with("https_port = 8443\nhttp_port = 8080")).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::GET, "/login", &[])).await;
    assert_eq!(location(&res), Some("https://shop.example.com:8443/login"));

    let res = send(&router, request(Method::GET, "/", &[HTTPS])).await;
    assert_eq!(location(&res), Some("http://shop.example.com:8080/"));
}

#[tokio::test]
async fn test_forwarded_headers_ignored_when_distrusted() {
    let mut config = site_config();
    config.listener.trust_forwarded_headers = false;
    let server = HttpServer::new(config).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::GET, "/login", &[HTTPS])).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), Some("https://shop.example.com/login"));

    let res = send(&router, request(Method::POST, "/login", &[("x-forwarded-ssl", "on")])).await;
    assert_eq!(res.status(), StatusCode::MISDIRECTED_REQUEST);

    let res = send(&router, request(Method::GET, "https://shop.example.com/login", &[])).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_pass_through_mode_never_redirects() {
    let server =
        HttpServer::new(site_config_with(r#"mode = "pass_through_in_development""#)).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::GET, "/login", &[])).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&router, request(Method::POST, "/", &[HTTPS])).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_configured_status_codes() {
    let mut config = site_config();
    config.responses.redirect_status = 301;
    config.responses.reject_status = 403;
    let server = HttpServer::new(config).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::GET, "/login", &[])).await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);

    let res = send(&router, request(Method::PUT, "/login", &[])).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reload_changes_policy_and_rules() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();
    let state = server.state();

    let mut updated = site_config_with("https_port = 8443");
    updated.rules.retain(|rule| rule.resource != "pages");
    state.reload(&updated).unwrap();

    let res = send(&router, request(Method::GET, "/login", &[])).await;
    assert_eq!(location(&res), Some("https://shop.example.com:8443/login"));

    // The refuse rule is gone, so the home page is served over HTTPS.
    let res = send(&router, request(Method::GET, "/", &[HTTPS])).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_reload_keeps_previous_settings() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    let mut broken = site_config();
    broken.hostname = None;
    assert!(server.state().reload(&broken).is_err());

    let res = send(&router, request(Method::GET, "/login", &[])).await;
    assert_eq!(location(&res), Some("https://shop.example.com/login"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = HttpServer::new(site_config()).unwrap();
    let router = server.router();

    let res = send(&router, request(Method::GET, "/catalog", &[])).await;
    assert!(res.headers().contains_key("x-request-id"));
}
