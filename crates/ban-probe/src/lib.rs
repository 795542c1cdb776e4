//! Ban Probe - checks whether a phone number's account has been banned.
//!
//! Each request is probed against the provider's registration endpoint:
//! - Disguised as a mobile client with a rotated identity
//! - Optionally routed through a proxy from a configured pool
//! - Retried with jittered backoff on network failures
//! - Classified by an ordered table of response rules
//!
//! Callers are limited per minute by source address.

pub mod api;
pub mod config;
pub mod error;
pub mod limiter;
pub mod probe;
pub mod upstream;

pub use config::Config;
pub use error::{ProbeError, TransportError};
pub use limiter::RateLimiter;
pub use probe::{normalize_number, NormalizedNumber, ResponseClassifier, RetryOrchestrator};
pub use upstream::{HttpTransport, Transport, UpstreamResponse};
