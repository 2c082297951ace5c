//! Router configuration loader for local YAML/JSON files.

use crate::config::{ConfigError, RouterConfig};
use crate::registry::RouterMapping;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the configuration file when no explicit path is given.
pub const CONFIG_ENV_VAR: &str = "LLM_ROUTER_CONFIG";

/// File name looked up in the base directory as a last resort.
pub const DEFAULT_CONFIG_FILE: &str = "router.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

/// Loads a [`RouterMapping`] from disk.
///
/// Source order: explicit path, then `$LLM_ROUTER_CONFIG`, then
/// `<base_path>/router.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory searched for `router.yaml`
    pub fn with_base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Resolve the configuration path and build a validated mapping from it.
    pub async fn load(&self, explicit: Option<&Path>) -> Result<RouterMapping, ConfigError> {
        let path = self.resolve_path(explicit)?;
        let config = self.load_file(&path).await?;
        RouterMapping::from_config(config)
    }

    /// Read and parse a configuration file without validating it.
    pub async fn load_file(&self, path: &Path) -> Result<RouterConfig, ConfigError> {
        let format = Self::detect_format(path)?;
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Load {
                path: path.display().to_string(),
                reason: e.to_string(),
                hint: None,
            })?;
        debug!(path = %path.display(), bytes = raw.len(), "loaded router configuration");

        match format {
            Format::Yaml => RouterConfig::from_yaml_str(&raw),
            Format::Json => RouterConfig::from_json_str(&raw),
        }
    }

    fn resolve_path(&self, explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(p) = explicit {
            return Ok(p.to_path_buf());
        }
        if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
            if !p.trim().is_empty() {
                return Ok(PathBuf::from(p));
            }
        }
        if let Some(ref base) = self.base_path {
            return Ok(base.join(DEFAULT_CONFIG_FILE));
        }
        Err(ConfigError::Load {
            path: "<unset>".to_string(),
            reason: "no configuration path provided".to_string(),
            hint: None,
        }
        .with_hint(format!(
            "Pass --config <path> or set {} to a YAML/JSON router mapping",
            CONFIG_ENV_VAR
        )))
    }

    fn detect_format(path: &Path) -> Result<Format, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            other => Err(ConfigError::Load {
                path: path.display().to_string(),
                reason: format!("unsupported file extension {:?}", other.unwrap_or("")),
                hint: Some("Use a .yaml, .yml or .json file".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(ext: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("router-{}.{}", uuid::Uuid::new_v4(), ext));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_yaml_by_extension() {
        let path = scratch_file(
            "yml",
            "model_list:\n  - model_name: a\n    provider_kind: direct\n    params: { model: gpt-4o }\n",
        );
        let mapping = ConfigLoader::new().load(Some(&path)).await.unwrap();
        assert!(mapping.registry().lookup("a").is_ok());
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn loads_json_by_extension() {
        let path = scratch_file(
            "json",
            r#"{"model_list":[{"model_name":"a","provider_kind":"unified","params":{"model":"m"}}],"fallbacks":[]}"#,
        );
        let cfg = ConfigLoader::new().load_file(&path).await.unwrap();
        assert_eq!(cfg.model_list.len(), 1);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let err = ConfigLoader::new()
            .load_file(Path::new("router.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let dir = std::env::temp_dir().join(format!("router-missing-{}", uuid::Uuid::new_v4()));
        let err = ConfigLoader::new()
            .with_base_path(&dir)
            .load(Some(&dir.join(DEFAULT_CONFIG_FILE)))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }
}
