pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    middleware::from_fn_with_state,
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::{AppConfig, ConfigError};
use crate::database::Store;
use crate::middleware::security::{self, OriginGuard};

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            started_at: Utc::now(),
        }
    }
}

/// Build the full application.
///
/// Layers run outermost first: trace, CORS, security headers, origin guard
/// (if enabled), panic catcher, body limit, then the route table.
pub fn app(state: AppState) -> Result<Router, ConfigError> {
    let config = state.config.clone();
    config.validate()?;

    let router: Router = routes::build(&state)
        .fallback(error::route_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(CatchPanicLayer::custom(error::panic_response));

    let router = if config.security.reject_foreign_origins {
        let guard = OriginGuard::new(&config.security)?;
        router.layer(from_fn_with_state(guard, security::reject_foreign_origins))
    } else {
        router
    };

    // Outside the guard so its 403 carries the same headers as everything else
    let router = security::with_security_headers(router, &config.security)?;
    let router = router.layer(security::cors_layer(&config.security)?);

    Ok(router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let route = routes::resolve(request.method(), request.uri().path())
            .map(|resolved| resolved.capability.name())
            .unwrap_or("unmatched");
        tracing::info_span!("request", method = %request.method(), uri = %request.uri(), route)
    })))
}
