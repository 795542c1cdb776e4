//! reqwest-backed transport for the registration endpoint.

use super::{Transport, UpstreamResponse};
use crate::error::{ProbeError, TransportError};
use crate::probe::{ProbeRequest, ProxyEndpoint};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Connect phase deadline, shorter than the per-attempt deadline.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP transport with one cached client per proxy.
pub struct HttpTransport {
    endpoint: String,
    timeout: Duration,
    direct: Client,
    proxied: DashMap<String, Client>,
}

impl HttpTransport {
    /// Create a transport posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProbeError> {
        let direct = Self::client_builder(timeout)
            .build()
            .map_err(|e| ProbeError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
            direct,
            proxied: DashMap::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
    }

    /// Client routed through `proxy`, or the direct client if the proxy
    /// cannot be constructed.
    fn client_for(&self, proxy: Option<&ProxyEndpoint>) -> Client {
        let Some(proxy) = proxy else {
            return self.direct.clone();
        };

        if let Some(client) = self.proxied.get(proxy.uri()) {
            return client.clone();
        }

        let built = reqwest::Proxy::all(proxy.uri())
            .and_then(|p| Self::client_builder(self.timeout).proxy(p).build());

        match built {
            Ok(client) => {
                self.proxied.insert(proxy.uri().to_string(), client.clone());
                client
            }
            Err(e) => {
                // Proxy URIs may hold credentials; log only the error kind.
                warn!(
                    error = %e.without_url(),
                    "Proxy agent construction failed, sending directly"
                );
                self.direct.clone()
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, fields(proxied = proxy.is_some()))]
    async fn send(
        &self,
        request: ProbeRequest,
        proxy: Option<ProxyEndpoint>,
    ) -> Result<UpstreamResponse, TransportError> {
        let client = self.client_for(proxy.as_ref());

        let mut builder = client.post(&self.endpoint);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, body_len = body.len(), "Upstream responded");

        Ok(UpstreamResponse { status, body })
    }
}
