use crate::registry::RouterMapping;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// Shared, atomically replaceable reference to a [`RouterMapping`].
///
/// The mapping itself is never mutated. Reloading builds a new mapping and
/// swaps the whole snapshot in; requests already running keep the snapshot
/// they started with.
#[derive(Clone)]
pub struct MappingHandle {
    inner: Arc<ArcSwap<RouterMapping>>,
}

impl MappingHandle {
    pub fn new(mapping: RouterMapping) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(mapping)),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<RouterMapping> {
        self.inner.load_full()
    }

    /// Install a new mapping, returning the one it replaced.
    pub fn replace(&self, mapping: RouterMapping) -> Arc<RouterMapping> {
        self.inner.swap(Arc::new(mapping))
    }
}

impl From<RouterMapping> for MappingHandle {
    fn from(mapping: RouterMapping) -> Self {
        Self::new(mapping)
    }
}

impl fmt::Debug for MappingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.inner.load();
        f.debug_struct("MappingHandle")
            .field("models", &snap.registry().len())
            .field("rules", &snap.fallback_table().rules().len())
            .finish()
    }
}
