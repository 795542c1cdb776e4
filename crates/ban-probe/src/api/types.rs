//! API request and response types.

use crate::probe::NormalizedNumber;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Probe request body. `number` takes precedence over `phone`.
#[derive(Debug, Default, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub number: Option<Value>,
    #[serde(default)]
    pub phone: Option<Value>,
}

impl CheckRequest {
    /// Lenient parse: anything that is not a JSON object yields an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The submitted number as trimmed text, if any.
    pub fn raw_number(&self) -> Option<String> {
        [&self.number, &self.phone]
            .into_iter()
            .filter_map(|v| v.as_ref().and_then(value_text))
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether the probe went out through a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyUsage {
    Used,
    None,
}

/// Successful probe result.
#[derive(Debug, Serialize)]
pub struct ProbeOutcome {
    /// The number as submitted
    pub number: String,
    pub normalized: NormalizedNumber,
    pub banned: bool,
    /// Upstream HTTP status
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub proxy: ProxyUsage,
    /// Upstream body, only when raw exposure is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub tracked_callers: usize,
    pub proxies: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_precedence() {
        let req = CheckRequest::from_body(br#"{"number":" +62812 ","phone":"+1555"}"#);
        assert_eq!(req.raw_number().as_deref(), Some("+62812"));

        let req = CheckRequest::from_body(br#"{"number":"","phone":"+1555"}"#);
        assert_eq!(req.raw_number().as_deref(), Some("+1555"));
    }

    #[test]
    fn test_numeric_and_garbage_bodies() {
        let req = CheckRequest::from_body(br#"{"number":6281234567890}"#);
        assert_eq!(req.raw_number().as_deref(), Some("6281234567890"));

        assert!(CheckRequest::from_body(b"not json").raw_number().is_none());
        assert!(CheckRequest::from_body(br#""+6281234567890""#).raw_number().is_none());
        assert!(CheckRequest::from_body(br#"{"number":true}"#).raw_number().is_none());
    }

    #[test]
    fn test_outcome_shape() {
        let outcome = ProbeOutcome {
            number: "+6281234567890".into(),
            normalized: NormalizedNumber {
                country_code: "62".into(),
                national_number: "81234567890".into(),
            },
            banned: false,
            status_code: 200,
            proxy: ProxyUsage::None,
            raw: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "number": "+6281234567890",
                "normalized": {"cc": "62", "in": "81234567890"},
                "banned": false,
                "statusCode": 200,
                "proxy": "none"
            })
        );
    }
}
