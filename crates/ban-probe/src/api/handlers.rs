//! HTTP request handlers.

use super::middleware::caller_identity;
use super::types::{CheckRequest, HealthResponse, ProbeOutcome, ProxyUsage};
use super::AppState;
use crate::error::ProbeError;
use crate::probe::normalize_number;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use std::net::SocketAddr;
use tracing::{info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        tracked_callers: state.limiter.tracked_callers(),
        proxies: state.selector.pool().len(),
    })
}

/// Probe a number for an administrative ban.
pub async fn check_ban(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProbeOutcome>, ProbeError> {
    let caller = caller_identity(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    if !state.limiter.admit(&caller) {
        warn!(caller = %caller, "Rate limit exceeded");
        return Err(ProbeError::RateLimited {
            limit: state.limiter.limit(),
        });
    }

    let number = CheckRequest::from_body(&body)
        .raw_number()
        .ok_or(ProbeError::NumberRequired)?;

    let normalized = normalize_number(&number).map_err(ProbeError::InvalidNumber)?;

    let proxy = state.selector.select();

    info!(
        caller = %caller,
        cc = %normalized.country_code,
        proxied = proxy.is_some(),
        "Probe request received"
    );

    let attempt = state
        .orchestrator
        .probe(&normalized, proxy.as_ref())
        .await?;

    info!(
        cc = %normalized.country_code,
        banned = attempt.banned,
        status = attempt.status_code,
        rule = attempt.classification.rule,
        attempts = attempt.attempts,
        "Probe completed"
    );

    Ok(Json(ProbeOutcome {
        number,
        normalized,
        banned: attempt.banned,
        status_code: attempt.status_code,
        proxy: if proxy.is_some() {
            ProxyUsage::Used
        } else {
            ProxyUsage::None
        },
        raw: state.expose_raw.then_some(attempt.raw_body),
    }))
}

/// Any non-POST method on the probe route.
pub async fn method_not_allowed() -> ProbeError {
    ProbeError::MethodNotAllowed
}
