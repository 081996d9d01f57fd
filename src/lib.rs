//! Administration panel for crowdfunding user accounts.

#![forbid(unsafe_code)]
pub mod admin;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
mod middleware;
mod router;
pub mod storage;
pub mod telemetry;
pub mod token;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::admin::AdminPanel;
use crate::storage::LocalStorage;
use crate::user::{Identity, UserRepository};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    state: Option<&AppState>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    let token = match state {
        Some(state) => Some(
            state
                .token
                .create(router::tests::ADMIN)
                .expect("cannot create JWT"),
        ),
        None => None,
    };

    make_request_with(
        app,
        method,
        path,
        token.as_deref(),
        "application/json",
        body,
    )
    .await
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request_with(
    app: Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    content_type: &str,
    body: impl Into<axum::body::Body>,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut req = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(req.body(body.into()).unwrap()).await.unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub panel: AdminPanel,
    pub token: token::TokenManager,
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `GET /metrics` goes to Prometheus exposition.
        .route("/metrics", get(router::status::metrics))
        .nest("/admin/users", router::users::router(state.clone()))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
///
/// Metrics export is left disabled; `main` installs the recorder.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>> {
    // read configuration file. let it in memory.
    let path = std::env::var("CONFIG_PATH").unwrap_or_default();
    let config = config::Configuration::default().path(path.into()).read()?;

    let pwd = crypto::PasswordManager::new(config.argon2.clone())?;
    let identity = Identity::new(
        UserRepository::new(),
        pwd,
        config.password_policy.clone(),
    );
    for user in &config.users {
        identity.seed(user).await?;
    }
    tracing::info!(users = config.users.len(), "identity store seeded");

    // handle jwt.
    let Some(token_config) = &config.token else {
        return Err("missing `token` entry on `config.yaml` file".into());
    };
    let mut token = token::TokenManager::new(&config.name, &token_config.secret);
    if let Some(audience) = &token_config.audience {
        token.audience(audience);
    }

    let panel = AdminPanel::new(
        Arc::new(identity),
        Arc::new(LocalStorage),
        &config.uploads,
    );

    Ok(AppState {
        config: Arc::new(config),
        panel,
        token,
        metrics: None,
    })
}
