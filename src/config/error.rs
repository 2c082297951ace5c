//! Configuration error types

/// Errors raised while loading or validating a router mapping, or while
/// resolving a model name against it.
///
/// These are operator/caller mistakes: they are never retried and never
/// trigger fallback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown model '{name}'{}", fmt_hint(.hint))]
    UnknownModel { name: String, hint: Option<String> },

    #[error("Fallback rule for '{primary}' references unregistered model '{target}'{}", fmt_hint(.hint))]
    MissingFallbackTarget {
        primary: String,
        target: String,
        hint: Option<String>,
    },

    #[error("Fallback rule for '{primary}' lists itself as a fallback")]
    SelfReference { primary: String },

    #[error("Model '{name}' is registered more than once")]
    DuplicateModel { name: String },

    #[error("Fallback rule references unregistered primary model '{primary}'")]
    UnknownRulePrimary { primary: String },

    #[error("No fallback configured for primary '{primary}'")]
    NoFallbackConfigured { primary: String },

    #[error("Malformed router mapping at {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Failed to load router mapping from {path}: {reason}{}", fmt_hint(.hint))]
    Load {
        path: String,
        reason: String,
        hint: Option<String>,
    },

    #[error("Failed to parse router mapping: {0}")]
    Parse(String),
}

fn fmt_hint(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n Hint: {}", h))
        .unwrap_or_default()
}

impl ConfigError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            ConfigError::UnknownModel { ref mut hint, .. } => *hint = hint_val,
            ConfigError::MissingFallbackTarget { ref mut hint, .. } => *hint = hint_val,
            ConfigError::Load { ref mut hint, .. } => *hint = hint_val,
            _ => (),
        }
        self
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_is_rendered_on_its_own_line() {
        let err = ConfigError::UnknownModel {
            name: "gpt-9".into(),
            hint: None,
        }
        .with_hint("check model_list");
        assert_eq!(
            err.to_string(),
            "Unknown model 'gpt-9'\n Hint: check model_list"
        );
    }

    #[test]
    fn hint_ignored_for_variants_without_one() {
        let err = ConfigError::SelfReference {
            primary: "a".into(),
        }
        .with_hint("unused");
        assert_eq!(err.to_string(), "Fallback rule for 'a' lists itself as a fallback");
    }
}
