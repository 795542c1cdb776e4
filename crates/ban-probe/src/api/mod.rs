//! HTTP API for the ban probe.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{caller_identity, logging_middleware};
pub use types::*;

use crate::config::Config;
use crate::error::ProbeError;
use crate::limiter::RateLimiter;
use crate::probe::{ProxySelector, RandomSource, RetryOrchestrator, RetryPolicy, ThreadRandom};
use crate::upstream::HttpTransport;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Per-caller request quota
    pub limiter: Arc<RateLimiter>,
    /// Proxy pool and selection
    pub selector: ProxySelector,
    /// Probe pipeline
    pub orchestrator: Arc<RetryOrchestrator>,
    /// Include upstream bodies in responses
    pub expose_raw: bool,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        limiter: RateLimiter,
        selector: ProxySelector,
        orchestrator: RetryOrchestrator,
        expose_raw: bool,
    ) -> Self {
        Self {
            limiter: Arc::new(limiter),
            selector,
            orchestrator: Arc::new(orchestrator),
            expose_raw,
        }
    }

    /// Wire the production pipeline from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ProbeError> {
        let rng: Arc<dyn RandomSource> = Arc::new(ThreadRandom);

        let transport = HttpTransport::new(config.upstream.url.clone(), config.upstream.timeout)?;
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            timeout: config.upstream.timeout,
            ..RetryPolicy::default()
        };

        Ok(Self::new(
            RateLimiter::new(config.rate_limit_per_min),
            ProxySelector::new(config.proxy_pool(), rng.clone()),
            RetryOrchestrator::new(Arc::new(transport), rng, policy),
            config.expose_raw,
        ))
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        // Probe endpoint; rate limiting happens after the method check
        .route(
            "/api/check-ban",
            post(handlers::check_ban).fallback(handlers::method_not_allowed),
        )
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
