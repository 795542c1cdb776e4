//! Transport seam between the probe pipeline and the network.

mod client;

pub use client::HttpTransport;

use crate::error::TransportError;
use crate::probe::{ProbeRequest, ProxyEndpoint};
use async_trait::async_trait;

/// Completed upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// Performs a single probe call, optionally through a proxy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: ProbeRequest,
        proxy: Option<ProxyEndpoint>,
    ) -> Result<UpstreamResponse, TransportError>;
}
