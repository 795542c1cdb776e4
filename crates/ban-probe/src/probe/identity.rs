//! Client disguise: user agent and mobile network identifiers.

use super::random::RandomSource;
use std::sync::Arc;

/// Client signatures presented to the upstream.
pub const USER_AGENTS: &[&str] = &[
    "WhatsApp/2.23.8.76 Android/13 Device/Pixel",
    "WhatsApp/2.22.18 Android/12 Device/Generic",
    "WhatsApp/2.21.23 Android/11 Device/Samsung",
    "Mozilla/5.0 (Linux; Android 11) AppleWebKit/537.36 (KHTML, like Gecko) WhatsApp/2.21.23",
];

/// Mobile country codes.
pub const MCC_OPTIONS: &[&str] = &["510", "440", "310", "404", "505", "520"];

/// Mobile network codes.
pub const MNC_OPTIONS: &[&str] = &["00", "01", "10", "20", "70", "01"];

/// Disguise drawn for a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    pub mcc: String,
    pub mnc: String,
}

/// Draws identities uniformly from fixed catalogs. Keeps no state between draws.
#[derive(Clone)]
pub struct IdentityRotator {
    user_agents: Vec<String>,
    mcc: Vec<String>,
    mnc: Vec<String>,
    rng: Arc<dyn RandomSource>,
}

impl IdentityRotator {
    /// Rotator over the built-in catalogs.
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self::with_catalogs(
            USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            MCC_OPTIONS.iter().map(|s| s.to_string()).collect(),
            MNC_OPTIONS.iter().map(|s| s.to_string()).collect(),
            rng,
        )
    }

    /// Rotator over custom catalogs. Empty catalogs yield empty strings.
    pub fn with_catalogs(
        user_agents: Vec<String>,
        mcc: Vec<String>,
        mnc: Vec<String>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            user_agents,
            mcc,
            mnc,
            rng,
        }
    }

    /// Draw a fresh identity.
    pub fn next_identity(&self) -> Identity {
        Identity {
            user_agent: self.pick(&self.user_agents),
            mcc: self.pick(&self.mcc),
            mnc: self.pick(&self.mnc),
        }
    }

    fn pick(&self, catalog: &[String]) -> String {
        if catalog.is_empty() {
            return String::new();
        }
        catalog[self.rng.index(catalog.len())].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{SequenceRandom, ThreadRandom};

    #[test]
    fn test_deterministic_draw() {
        let rotator = IdentityRotator::new(Arc::new(SequenceRandom::new(vec![1, 3, 4])));
        let identity = rotator.next_identity();

        assert_eq!(identity.user_agent, USER_AGENTS[1]);
        assert_eq!(identity.mcc, "404");
        assert_eq!(identity.mnc, "70");
    }

    #[test]
    fn test_draws_come_from_catalogs() {
        let rotator = IdentityRotator::new(Arc::new(ThreadRandom));
        for _ in 0..50 {
            let identity = rotator.next_identity();
            assert!(USER_AGENTS.contains(&identity.user_agent.as_str()));
            assert!(MCC_OPTIONS.contains(&identity.mcc.as_str()));
            assert!(MNC_OPTIONS.contains(&identity.mnc.as_str()));
        }
    }

    #[test]
    fn test_empty_catalog() {
        let rotator = IdentityRotator::with_catalogs(
            vec!["ua".into()],
            vec![],
            vec![],
            Arc::new(SequenceRandom::zeros()),
        );
        let identity = rotator.next_identity();
        assert_eq!(identity.user_agent, "ua");
        assert!(identity.mcc.is_empty());
    }
}
