//! Chain resolution.
//!
//! A chain is exactly the primary followed by its one configured fallback
//! list. Fallback targets' own rules are not expanded, so chain length is
//! bounded by `1 + len(fallbacks)` and cycles across rules cannot occur.
//! Repeated names are kept: the same model listed twice is attempted twice.

use crate::config::{ConfigError, ModelEntry};
use crate::registry::RouterMapping;
use std::sync::Arc;

/// One entry of a resolved chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Position in the chain, primary is 0.
    pub index: usize,
    pub entry: Arc<ModelEntry>,
}

impl Link {
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn provider_label(&self) -> String {
        self.entry.provider_label()
    }
}

/// Ordered links attempted for one request, primary first.
///
/// Never empty. Owned by the run that resolved it.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationChain {
    links: Vec<Link>,
}

impl InvocationChain {
    /// Build a chain from caller-chosen entries.
    pub fn from_entries(entries: Vec<Arc<ModelEntry>>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::malformed("chain", "must contain at least one link"));
        }
        let links = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Link { index, entry })
            .collect();
        Ok(Self { links })
    }

    pub fn primary(&self) -> &Link {
        &self.links[0]
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn get(&self, index: usize) -> Option<&Link> {
        self.links.get(index)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(Link::name).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.links.iter().map(Link::provider_label).collect()
    }
}

/// Turns a primary model name into an [`InvocationChain`].
#[derive(Debug, Clone, Copy)]
pub struct ChainResolver<'a> {
    mapping: &'a RouterMapping,
}

impl<'a> ChainResolver<'a> {
    pub fn new(mapping: &'a RouterMapping) -> Self {
        Self { mapping }
    }

    /// `[primary] ++ fallbacks_for(primary)`, in configured order.
    ///
    /// An unknown primary is a caller error and fails with
    /// [`ConfigError::UnknownModel`].
    pub fn resolve(&self, primary: &str) -> Result<InvocationChain, ConfigError> {
        let head = self.mapping.lookup(primary)?.clone();
        let fallbacks = self.mapping.fallbacks_for(primary);

        let mut entries = Vec::with_capacity(1 + fallbacks.len());
        entries.push(head);
        for name in fallbacks {
            entries.push(self.mapping.lookup(name)?.clone());
        }
        InvocationChain::from_entries(entries)
    }

    /// Two-tier chain: `[primary, first fallback]` by default, or just
    /// `[first fallback]` when `use_fallback` is set. Either way the primary
    /// needs a fallback rule.
    pub fn resolve_two_tier(&self, primary: &str, use_fallback: bool) -> Result<InvocationChain, ConfigError> {
        let head = self.mapping.lookup(primary)?.clone();
        let first = self
            .mapping
            .fallbacks_for(primary)
            .first()
            .ok_or_else(|| ConfigError::NoFallbackConfigured {
                primary: primary.to_string(),
            })?;
        let second = self.mapping.lookup(first)?.clone();
        if use_fallback {
            return InvocationChain::from_entries(vec![second]);
        }
        InvocationChain::from_entries(vec![head, second])
    }
}
