use crate::provider::{ProviderError, ProviderErrorKind};

/// When a link that has given up should hand over to the next one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EscalationPolicy {
    /// Any failure that outlives the link's retries escalates.
    #[default]
    AnyFailure,
    /// Only the listed kinds escalate; anything else ends the run on the
    /// current link.
    HardFailuresOnly(Vec<ProviderErrorKind>),
}

impl EscalationPolicy {
    /// Two-tier mode: escalate on authentication problems, rate limiting and
    /// unknown models only. Transient outages are retried in place on the
    /// primary and never reach the fallback.
    pub fn two_tier() -> Self {
        EscalationPolicy::HardFailuresOnly(vec![
            ProviderErrorKind::Authentication,
            ProviderErrorKind::MissingCredential,
            ProviderErrorKind::RateLimited,
            ProviderErrorKind::NotFound,
        ])
    }

    pub fn should_escalate(&self, error: &ProviderError) -> bool {
        match self {
            EscalationPolicy::AnyFailure => true,
            EscalationPolicy::HardFailuresOnly(kinds) => kinds.contains(&error.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_tier_escalates_only_hard_failures() {
        let policy = EscalationPolicy::two_tier();
        let escalate = |kind| policy.should_escalate(&ProviderError::new(kind, "x"));

        assert!(escalate(ProviderErrorKind::Authentication));
        assert!(escalate(ProviderErrorKind::RateLimited));
        assert!(escalate(ProviderErrorKind::NotFound));
        assert!(!escalate(ProviderErrorKind::ServerError));
        assert!(!escalate(ProviderErrorKind::Connection));
        assert!(!escalate(ProviderErrorKind::InvalidRequest));
    }

    #[test]
    fn default_escalates_everything() {
        let policy = EscalationPolicy::default();
        assert!(policy.should_escalate(&ProviderError::new(ProviderErrorKind::InvalidRequest, "x")));
    }
}
