//! Cross-origin policy and response hardening headers.
//!
//! Every response, static assets and errors included, leaves through these
//! layers. The origin allow-list and extra script sources come from
//! [`SecurityConfig`]; everything else is fixed.

use axum::{
    extract::{Request, State},
    http::{
        header::{self, HeaderName, HeaderValue},
        request::Parts,
        Method,
    },
    middleware::Next,
    response::Response,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowCredentials, AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{ConfigError, SecurityConfig};
use crate::error::ApiError;

pub const CORS_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

fn parse_origins(config: &SecurityConfig) -> Result<Vec<HeaderValue>, ConfigError> {
    config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
        })
        .collect()
}

/// CORS for the configured origins only. Unlisted origins get neither an
/// allow-origin nor an allow-credentials header.
pub fn cors_layer(config: &SecurityConfig) -> Result<CorsLayer, ConfigError> {
    let origins = parse_origins(config)?;
    let credential_origins = Arc::new(origins.clone());

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(CORS_METHODS.to_vec())
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::AUTHORIZATION]))
        .allow_credentials(AllowCredentials::predicate(move |origin: &HeaderValue, _: &Parts| {
            credential_origins.contains(origin)
        })))
}

pub fn content_security_policy(config: &SecurityConfig) -> String {
    let mut script_src = vec!["'self'", "'unsafe-inline'"];
    script_src.extend(config.csp_script_sources.iter().map(String::as_str));

    let mut directives = vec![
        "default-src 'self'".to_string(),
        "base-uri 'self'".to_string(),
        "font-src 'self' https: data:".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'self'".to_string(),
        "img-src 'self' data:".to_string(),
        "object-src 'none'".to_string(),
        format!("script-src {}", script_src.join(" ")),
        "script-src-attr 'none'".to_string(),
        "style-src 'self' 'unsafe-inline'".to_string(),
    ];
    if config.require_https {
        directives.push("upgrade-insecure-requests".to_string());
    }
    directives.join("; ")
}

/// Fixed hardening headers sent alongside the CSP.
pub fn hardening_headers(config: &SecurityConfig) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
    ];
    if config.require_https {
        headers.push((
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ));
    }
    headers
}

/// Attach the CSP and hardening headers to every response of `router`.
pub fn with_security_headers<S>(router: Router<S>, config: &SecurityConfig) -> Result<Router<S>, ConfigError>
where
    S: Clone + Send + Sync + 'static,
{
    let policy = content_security_policy(config);
    let csp = HeaderValue::from_str(&policy).map_err(|_| ConfigError::InvalidHeader {
        name: "content-security-policy",
        value: policy.clone(),
    })?;

    let mut router = router.layer(SetResponseHeaderLayer::overriding(header::CONTENT_SECURITY_POLICY, csp));
    for (name, value) in hardening_headers(config) {
        router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
    }
    Ok(router)
}

/// Origins allowed past the guard; shared with the guard middleware.
#[derive(Clone)]
pub struct OriginGuard {
    allowed: Arc<Vec<HeaderValue>>,
}

impl OriginGuard {
    pub fn new(config: &SecurityConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            allowed: Arc::new(parse_origins(config)?),
        })
    }

    /// Same-origin requests (origin authority equals `Host`) always pass.
    pub fn permits(&self, origin: &HeaderValue, host: Option<&HeaderValue>) -> bool {
        if self.allowed.contains(origin) {
            return true;
        }
        let authority = origin
            .to_str()
            .ok()
            .and_then(|o| o.split_once("://"))
            .map(|(_, rest)| rest);
        match (authority, host.and_then(|h| h.to_str().ok())) {
            (Some(authority), Some(host)) => authority.eq_ignore_ascii_case(host),
            _ => false,
        }
    }
}

/// Rejects requests carrying an `Origin` outside the allow-list before routing.
pub async fn reject_foreign_origins(
    State(guard): State<OriginGuard>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        if !guard.permits(origin, request.headers().get(header::HOST)) {
            tracing::warn!(origin = ?origin, "Rejected request from foreign origin");
            return Err(ApiError::forbidden("Origin not allowed"));
        }
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, FRONTEND_ORIGIN};

    #[test]
    fn csp_lists_configured_script_sources() {
        let config = AppConfig::development().security;
        let policy = content_security_policy(&config);

        assert!(policy.starts_with("default-src 'self'"));
        assert!(policy.contains("script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net"));
        assert!(policy.contains("style-src 'self' 'unsafe-inline'"));
        assert!(!policy.contains("upgrade-insecure-requests"));
    }

    #[test]
    fn hsts_only_when_https_required() {
        let mut config = AppConfig::development().security;
        assert!(!hardening_headers(&config).iter().any(|(n, _)| n == header::STRICT_TRANSPORT_SECURITY));

        config.require_https = true;
        assert!(hardening_headers(&config).iter().any(|(n, _)| n == header::STRICT_TRANSPORT_SECURITY));
    }

    #[test]
    fn guard_accepts_listed_and_same_origin() {
        let guard = OriginGuard::new(&AppConfig::development().security).unwrap();
        let host = HeaderValue::from_static("forms.example.com");

        assert!(guard.permits(&HeaderValue::from_static(FRONTEND_ORIGIN), None));
        assert!(guard.permits(&HeaderValue::from_static("https://forms.example.com"), Some(&host)));
        assert!(!guard.permits(&HeaderValue::from_static("https://evil.example"), Some(&host)));
        assert!(!guard.permits(&HeaderValue::from_static("null"), None));
    }
}
