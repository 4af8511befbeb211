//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router from the configured routes
//! - Attach the SSL guard to every route, keyed by resource/action
//! - Register the route builders once all routes exist
//! - Serve plain HTTP and, when configured, HTTPS
//! - Apply configuration reloads to the shared SSL state

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Extension, Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::HELPERS_PATH;
use crate::config::SslConfig;
use crate::guard::{ssl_guard_middleware, ActionGuard, Transport};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::policy::PolicyError;
use crate::routes::{BuilderSet, RouteArg, RoutePattern, UrlError};
use crate::state::SslState;

/// Errors raised while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TLS bind address: {0}")]
    Addr(#[from] std::net::AddrParseError),
}

/// HTTP server for the configured site.
pub struct HttpServer {
    router: Router,
    config: SslConfig,
    state: Arc<SslState>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: SslConfig) -> Result<Self, PolicyError> {
        let state = Arc::new(SslState::from_config(&config)?);
        let router = Self::build_router(&config, state.clone());

        // Every route is in the router now; only at this point is the set of
        // named builders complete.
        let origin = state.settings().policy.insecure().clone();
        let builders = BuilderSet::from_routes(&config.routes, &origin);
        if !state.register_builders(builders) {
            tracing::warn!("No URL helpers registered; ssl_/plain_ helpers unavailable");
        }

        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &SslConfig, state: Arc<SslState>) -> Router {
        let mut router = Router::new();

        for route in &config.routes {
            let path = RoutePattern::parse(&route.path).to_axum_path();
            let guard = ActionGuard::for_action(
                state.clone(),
                route.resource.as_str(),
                route.action.as_str(),
            );
            let page = format!("{}#{}", route.resource, route.action);
            let handler = any(move || {
                let page = page.clone();
                async move { page }
            });

            router = router.merge(
                Router::new()
                    .route(&path, handler)
                    .layer(middleware::from_fn_with_state(guard, ssl_guard_middleware)),
            );
        }

        router
            .route(HELPERS_PATH, get(list_helpers))
            .route(&format!("{HELPERS_PATH}/{{helper}}"), get(build_helper))
            .with_state(state)
            .layer(request_timeout(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Also starts the HTTPS listener when `listener.tls` is configured, and
    /// applies every config received on `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<SslConfig>,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = state.reload(&config) {
                    tracing::error!(error = %e, "Rejected config reload");
                }
            }
        });

        if let Some(tls) = &self.config.listener.tls {
            let tls_addr: SocketAddr = tls.bind_address.parse()?;
            let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
            let handle = axum_server::Handle::new();

            let drain = handle.clone();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                signal.wait().await;
                drain.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            let app = self.router.clone().layer(Extension(Transport::Tls));
            tracing::info!(address = %tls_addr, "HTTPS server starting");
            tokio::spawn(async move {
                if let Err(e) = axum_server::bind_rustls(tls_addr, rustls)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                {
                    tracing::error!(error = %e, "HTTPS server failed");
                }
            });
        }

        let app = self.router.layer(Extension(Transport::Plain));
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, with plain transport; for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> Arc<SslState> {
        self.state.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SslConfig {
        &self.config
    }
}

/// Requests still running after `timeout` are answered with 408.
fn request_timeout(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Names of all `ssl_` / `plain_` helpers.
async fn list_helpers(State(state): State<Arc<SslState>>) -> Response {
    match state.registry() {
        Some(registry) => {
            let helpers: Vec<&str> = registry.helper_names().collect();
            Json(serde_json::json!({ "helpers": helpers })).into_response()
        }
        None => (StatusCode::SERVICE_UNAVAILABLE, "URL helpers not registered yet").into_response(),
    }
}

/// Build a URL with a helper; positional parameters come from `?args=a,b`.
async fn build_helper(
    State(state): State<Arc<SslState>>,
    Path(helper): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(registry) = state.registry() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "URL helpers not registered yet").into_response();
    };

    let args: Vec<RouteArg> = query
        .get("args")
        .map(|args| args.split(',').filter(|a| !a.is_empty()).map(RouteArg::from).collect())
        .unwrap_or_default();

    match registry.call(&helper, &args) {
        Ok(url) => url.into_response(),
        Err(e @ UrlError::UnknownHelper(_)) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use crate::config::parse_config;

    #[tokio::test]
    async fn test_shipped_config_builds_guarded_router() {
        let config = parse_config(include_str!("../../ssl-helper.toml")).unwrap();
        let server = HttpServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(Request::get("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://localhost:8443/login"
        );

        let response = server
            .router()
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "late"
                }),
            )
            .layer(request_timeout(Duration::from_millis(20)));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
