//! Model registry and fallback table.
//!
//! [`RouterMapping`] is the validated, read-only form of a
//! [`RouterConfig`]: every fallback target resolves to a registered entry,
//! and no rule lists its own primary. It is built once and shared by
//! reference across concurrent requests without locking.

mod handle;

pub use handle::MappingHandle;

use crate::config::{ConfigError, ModelEntry, RouterConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

/// Immutable name → [`ModelEntry`] mapping, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRegistry {
    entries: Vec<Arc<ModelEntry>>,
    index: HashMap<String, usize>,
}

impl ModelRegistry {
    /// Look up a registered entry by logical name.
    pub fn lookup(&self, name: &str) -> Result<&Arc<ModelEntry>, ConfigError> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ConfigError::UnknownModel {
                name: name.to_string(),
                hint: Some(format!(
                    "Registered models: {}",
                    self.entries
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<ModelEntry>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One primary model and its ordered fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRule {
    pub primary: String,
    pub fallback_order: Vec<String>,
}

/// Immutable primary name → fallback order mapping, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackTable {
    rules: Vec<FallbackRule>,
    index: HashMap<String, usize>,
}

impl FallbackTable {
    /// Ordered fallback names for `name`; empty when no rule is registered.
    pub fn fallbacks_for(&self, name: &str) -> &[String] {
        self.index
            .get(name)
            .map(|&i| self.rules[i].fallback_order.as_slice())
            .unwrap_or(&[])
    }

    pub fn rules(&self) -> &[FallbackRule] {
        &self.rules
    }
}

/// Validated registry + fallback table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouterMapping {
    registry: ModelRegistry,
    table: FallbackTable,
}

impl RouterMapping {
    /// Validate a configuration and build the mapping.
    ///
    /// Fails fast with [`ConfigError`] on the first problem found; call time
    /// never sees an unresolvable fallback target.
    pub fn from_config(config: RouterConfig) -> Result<Self, ConfigError> {
        let registry = Self::build_registry(config.model_list)?;
        let table = Self::build_table(config.fallbacks, &registry)?;
        Ok(Self { registry, table })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Self::from_config(RouterConfig::from_yaml_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Self::from_config(RouterConfig::from_json_str(raw)?)
    }

    /// Rebuild the serializable configuration, preserving entry and rule order.
    pub fn to_config(&self) -> RouterConfig {
        RouterConfig {
            model_list: self
                .registry
                .entries
                .iter()
                .map(|e| e.as_ref().clone())
                .collect(),
            fallbacks: self
                .table
                .rules
                .iter()
                .map(|r| {
                    let mut m = BTreeMap::new();
                    m.insert(r.primary.clone(), r.fallback_order.clone());
                    m
                })
                .collect(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn fallback_table(&self) -> &FallbackTable {
        &self.table
    }

    pub fn lookup(&self, name: &str) -> Result<&Arc<ModelEntry>, ConfigError> {
        self.registry.lookup(name)
    }

    pub fn fallbacks_for(&self, name: &str) -> &[String] {
        self.table.fallbacks_for(name)
    }

    fn build_registry(model_list: Vec<ModelEntry>) -> Result<ModelRegistry, ConfigError> {
        let mut entries = Vec::with_capacity(model_list.len());
        let mut index = HashMap::with_capacity(model_list.len());

        for (i, entry) in model_list.into_iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::malformed(
                    format!("model_list[{}].model_name", i),
                    "must not be empty",
                ));
            }
            if entry.params.model.trim().is_empty() {
                return Err(ConfigError::malformed(
                    format!("model_list[{}].params.model", i),
                    "must not be empty",
                ));
            }
            if entry.params.rpm == Some(0) {
                return Err(ConfigError::malformed(
                    format!("model_list[{}].params.rpm", i),
                    "must be positive",
                ));
            }
            if let Some(ref base) = entry.params.api_base {
                if let Err(e) = url::Url::parse(base) {
                    return Err(ConfigError::malformed(
                        format!("model_list[{}].params.api_base", i),
                        format!("'{}' is not an absolute URL: {}", base, e),
                    ));
                }
            }
            if index.contains_key(&entry.name) {
                return Err(ConfigError::DuplicateModel { name: entry.name });
            }
            index.insert(entry.name.clone(), entries.len());
            entries.push(Arc::new(entry));
        }

        Ok(ModelRegistry { entries, index })
    }

    fn build_table(
        fallbacks: Vec<BTreeMap<String, Vec<String>>>,
        registry: &ModelRegistry,
    ) -> Result<FallbackTable, ConfigError> {
        let mut rules: Vec<FallbackRule> = Vec::with_capacity(fallbacks.len());
        let mut index = HashMap::with_capacity(fallbacks.len());

        for (i, rule) in fallbacks.into_iter().enumerate() {
            if rule.len() != 1 {
                return Err(ConfigError::malformed(
                    format!("fallbacks[{}]", i),
                    format!("expected exactly one primary model, found {}", rule.len()),
                ));
            }
            let Some((primary, order)) = rule.into_iter().next() else {
                continue;
            };

            if !registry.contains(&primary) {
                return Err(ConfigError::UnknownRulePrimary { primary });
            }
            if index.contains_key(&primary) {
                warn!(primary = primary.as_str(), rule_index = i, "duplicate fallback rule ignored; first match wins");
                continue;
            }
            if order.iter().any(|t| t == &primary) {
                return Err(ConfigError::SelfReference { primary });
            }
            if let Some(target) = order.iter().find(|t| !registry.contains(t)) {
                return Err(ConfigError::MissingFallbackTarget {
                    primary: primary.clone(),
                    target: target.clone(),
                    hint: None,
                }
                .with_hint(format!("Add '{}' to model_list or remove it from the rule", target)));
            }

            index.insert(primary.clone(), rules.len());
            rules.push(FallbackRule {
                primary,
                fallback_order: order,
            });
        }

        Ok(FallbackTable { rules, index })
    }
}
