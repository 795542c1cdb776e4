//! The probe pipeline: number parsing, disguise, request assembly,
//! response classification and retry.

mod classifier;
mod identity;
mod number;
mod proxy;
mod random;
mod request;
mod retry;

pub use classifier::{Classification, ResponseClassifier, Rule, Verdict};
pub use identity::{Identity, IdentityRotator, MCC_OPTIONS, MNC_OPTIONS, USER_AGENTS};
pub use number::{normalize_number, NormalizedNumber};
pub use proxy::{ProxyEndpoint, ProxyPool, ProxySelector};
pub use random::{RandomSource, SequenceRandom, ThreadRandom};
pub use request::{ProbeMethod, ProbeRequest, ProbeRequestBuilder};
pub use retry::{ProbeAttempt, RetryOrchestrator, RetryPolicy};
