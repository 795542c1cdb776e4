//! Outbound registration request assembly.

use super::identity::Identity;
use super::number::NormalizedNumber;
use super::random::RandomSource;
use std::sync::Arc;
use urlencoding::encode;

/// Upper bound (exclusive) for the `r` nonce field.
const NONCE_RANGE: u64 = 1_000_000;

/// Verification delivery method requested from the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMethod {
    #[default]
    Sms,
}

impl ProbeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeMethod::Sms => "sms",
        }
    }
}

/// A fully assembled request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// `application/x-www-form-urlencoded` body
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
}

impl ProbeRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Builds form bodies and headers. No I/O.
#[derive(Clone)]
pub struct ProbeRequestBuilder {
    rng: Arc<dyn RandomSource>,
}

impl ProbeRequestBuilder {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }

    pub fn build(
        &self,
        number: &NormalizedNumber,
        method: ProbeMethod,
        identity: &Identity,
    ) -> ProbeRequest {
        let nonce = self.rng.below(NONCE_RANGE).to_string();

        let mut fields: Vec<(&str, &str)> = vec![
            ("cc", number.country_code.as_str()),
            ("in", number.national_number.as_str()),
            ("method", method.as_str()),
        ];
        if !identity.mcc.is_empty() {
            fields.push(("mcc", identity.mcc.as_str()));
        }
        if !identity.mnc.is_empty() {
            fields.push(("mnc", identity.mnc.as_str()));
        }
        fields.push(("r", nonce.as_str()));

        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let headers = vec![
            (
                "Content-Type",
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("User-Agent", identity.user_agent.clone()),
            ("Accept", "*/*".to_string()),
            ("Connection", "keep-alive".to_string()),
        ];

        ProbeRequest { body, headers }
    }
}
