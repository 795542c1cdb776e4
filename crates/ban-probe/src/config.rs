//! Configuration for the ban probe service.

use crate::probe::ProxyPool;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Service configuration.
///
/// Flat keys (`RATE_LIMIT_PER_MIN`, `MAX_RETRIES`, `PROXIES`, `EXPOSE_RAW`)
/// are read straight from the environment; nested sections use the `__`
/// separator (`SERVER__PORT`, `UPSTREAM__TIMEOUT`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Requests admitted per caller per minute
    #[serde(default = "default_rate_limit_per_min")]
    pub rate_limit_per_min: u32,

    /// Additional attempts after the first one fails at the network level
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Newline-delimited proxy URIs
    #[serde(default)]
    pub proxies: String,

    /// Include the upstream response body in probe results
    #[serde(default)]
    pub expose_raw: bool,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream endpoint configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Rate limiter housekeeping
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Registration endpoint probed for each number
    #[serde(default = "default_upstream_url")]
    pub url: String,

    /// Deadline for a single attempt
    #[serde(default = "default_upstream_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// How often stale per-caller records are dropped
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_limit_per_min: default_rate_limit_per_min(),
            max_retries: default_max_retries(),
            proxies: String::new(),
            expose_raw: false,
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            rate_limit: RateLimitConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout: default_upstream_timeout(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_rate_limit_per_min() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_upstream_url() -> String {
    "https://v.whatsapp.net/v2/register".into()
}

fn default_upstream_timeout() -> Duration {
    Duration::from_secs(12)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if config.rate_limit_per_min == 0 {
            config.rate_limit_per_min = default_rate_limit_per_min();
        }

        Ok(config)
    }

    /// Parse the configured proxy list.
    pub fn proxy_pool(&self) -> ProxyPool {
        ProxyPool::parse(&self.proxies)
    }
}
