//! Attempt loop: rotate identity, call upstream, classify, back off on
//! transient failures.

use super::classifier::{Classification, ResponseClassifier};
use super::identity::IdentityRotator;
use super::number::NormalizedNumber;
use super::proxy::ProxyEndpoint;
use super::random::RandomSource;
use super::request::{ProbeMethod, ProbeRequestBuilder};
use crate::error::{ProbeError, TransportError};
use crate::upstream::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, instrument, warn};

/// Retry and deadline settings.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Deadline for one transport call
    pub timeout: Duration,
    pub base_backoff: Duration,
    /// Upper bound (exclusive) of the random extra delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(12),
            base_backoff: Duration::from_millis(500),
            max_jitter: Duration::from_millis(700),
        }
    }
}

impl RetryPolicy {
    /// Base delay plus uniform jitter.
    pub fn backoff(&self, rng: &dyn RandomSource) -> Duration {
        let jitter_ms = rng.below(self.max_jitter.as_millis() as u64);
        self.base_backoff + Duration::from_millis(jitter_ms)
    }
}

/// Final result of a successful round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub banned: bool,
    pub classification: Classification,
    pub status_code: u16,
    pub raw_body: String,
    /// Attempts made, including the successful one
    pub attempts: u32,
}

pub struct RetryOrchestrator {
    transport: Arc<dyn Transport>,
    rotator: IdentityRotator,
    builder: ProbeRequestBuilder,
    classifier: ResponseClassifier,
    rng: Arc<dyn RandomSource>,
    policy: RetryPolicy,
}

impl RetryOrchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        rng: Arc<dyn RandomSource>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            rotator: IdentityRotator::new(rng.clone()),
            builder: ProbeRequestBuilder::new(rng.clone()),
            classifier: ResponseClassifier::default(),
            rng,
            policy,
        }
    }

    /// Replace the identity catalogs.
    pub fn with_rotator(mut self, rotator: IdentityRotator) -> Self {
        self.rotator = rotator;
        self
    }

    /// Replace the classification rules.
    pub fn with_classifier(mut self, classifier: ResponseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Probe one number through a fixed proxy.
    ///
    /// Makes at most `1 + max_retries` attempts. Only network failures and
    /// timeouts are retried; any completed response is classified and returned.
    #[instrument(skip(self, number, proxy), fields(cc = %number.country_code, proxied = proxy.is_some()))]
    pub async fn probe(
        &self,
        number: &NormalizedNumber,
        proxy: Option<&ProxyEndpoint>,
    ) -> Result<ProbeAttempt, ProbeError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let identity = self.rotator.next_identity();
            let request = self.builder.build(number, ProbeMethod::Sms, &identity);

            let result = match timeout(
                self.policy.timeout,
                self.transport.send(request, proxy.cloned()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout),
            };

            let error = match result {
                Ok(response) => {
                    let classification = self.classifier.classify(response.status, &response.body);
                    debug!(
                        status = response.status,
                        rule = classification.rule,
                        attempt,
                        "Probe classified"
                    );
                    return Ok(ProbeAttempt {
                        banned: classification.verdict.is_banned(),
                        classification,
                        status_code: response.status,
                        raw_body: response.body,
                        attempts: attempt,
                    });
                }
                Err(e) => e,
            };

            if attempt > self.policy.max_retries {
                warn!(attempt, error = %error, "Probe failed, retries exhausted");
                return Err(ProbeError::Network {
                    attempts: attempt,
                    message: error.to_string(),
                });
            }

            let delay = self.policy.backoff(self.rng.as_ref());
            warn!(attempt, error = %error, ?delay, "Probe attempt failed, retrying");
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{SequenceRandom, Verdict};
    use crate::upstream::{MockTransport, UpstreamResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    fn number() -> NormalizedNumber {
        NormalizedNumber {
            country_code: "62".into(),
            national_number: "81234567890".into(),
        }
    }

    fn orchestrator(transport: impl Transport + 'static, max_retries: u32) -> RetryOrchestrator {
        RetryOrchestrator::new(
            Arc::new(transport),
            Arc::new(SequenceRandom::new(vec![0, 1, 2, 3, 4, 5])),
            RetryPolicy {
                max_retries,
                ..RetryPolicy::default()
            },
        )
    }

    #[test]
    fn test_backoff_bounds() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(&SequenceRandom::zeros()),
            Duration::from_millis(500)
        );
        assert_eq!(
            policy.backoff(&SequenceRandom::new(vec![699])),
            Duration::from_millis(1199)
        );
        assert_eq!(
            policy.backoff(&SequenceRandom::new(vec![700])),
            Duration::from_millis(500)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_banned_on_first_attempt() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_, _| {
            Ok(UpstreamResponse {
                status: 200,
                body: r#"{"status":"fail","reason":"blocked"}"#.into(),
            })
        });

        let result = orchestrator(transport, 2).probe(&number(), None).await;
        let attempt = assert_ok!(result);
        assert!(attempt.banned);
        assert_eq!(attempt.classification.verdict, Verdict::Banned);
        assert_eq!(attempt.status_code, 200);
        assert_eq!(attempt.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(3)
            .returning(|_, _| Err(TransportError::Request("connection refused".into())));

        let result = orchestrator(transport, 2).probe(&number(), None).await;
        match assert_err!(result) {
            ProbeError::Network { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_means_single_attempt() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Err(TransportError::Timeout));

        let result = orchestrator(transport, 0).probe(&number(), None).await;
        assert!(matches!(result, Err(ProbeError::Network { attempts: 1, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_with_fresh_identity_and_same_proxy() {
        let seen: Arc<Mutex<Vec<(String, Option<String>)>>> = Arc::default();
        let log = seen.clone();
        let mut calls = 0;

        let mut transport = MockTransport::new();
        transport.expect_send().times(2).returning(move |request, proxy| {
            log.lock().unwrap().push((
                request.body.clone(),
                proxy.map(|p| p.uri().to_string()),
            ));
            calls += 1;
            if calls == 1 {
                Err(TransportError::Request("reset".into()))
            } else {
                Ok(UpstreamResponse {
                    status: 200,
                    body: r#"{"status":"ok"}"#.into(),
                })
            }
        });

        let proxy = ProxyEndpoint::new("http://127.0.0.1:3128");
        let attempt = orchestrator(transport, 2)
            .probe(&number(), Some(&proxy))
            .await
            .unwrap();

        assert!(!attempt.banned);
        assert_eq!(attempt.attempts, 2);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0].0, seen[1].0);
        assert!(seen.iter().all(|(body, _)| body.starts_with("cc=62&in=81234567890&method=sms")));
        assert!(seen
            .iter()
            .all(|(_, p)| p.as_deref() == Some("http://127.0.0.1:3128")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_errors_are_not_retried() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_, _| {
            Ok(UpstreamResponse {
                status: 503,
                body: "service unavailable".into(),
            })
        });

        let attempt = orchestrator(transport, 2)
            .probe(&number(), None)
            .await
            .unwrap();
        assert!(!attempt.banned);
        assert_eq!(attempt.status_code, 503);
        assert_eq!(attempt.classification.rule, "no_signal");
    }

    struct HangingTransport {
        calls: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(
            &self,
            _request: crate::probe::ProbeRequest,
            _proxy: Option<ProxyEndpoint>,
        ) -> Result<UpstreamResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            sleep(Duration::from_secs(3600)).await;
            Ok(UpstreamResponse {
                status: 200,
                body: String::new(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_counts_as_network_failure() {
        let calls = Arc::new(Mutex::new(0));
        let transport = HangingTransport {
            calls: calls.clone(),
        };

        let started = tokio::time::Instant::now();
        let result = orchestrator(transport, 1).probe(&number(), None).await;

        match result {
            Err(ProbeError::Network { attempts, message }) => {
                assert_eq!(attempts, 2);
                assert_eq!(message, TransportError::Timeout.to_string());
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(*calls.lock().unwrap(), 2);
        // Two 12s deadlines plus one backoff of at most 1.2s.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(24));
        assert!(elapsed < Duration::from_secs(26));
    }
}
