// Tue Jan 13 2026 - Alex

use super::layout::RecordLayout;
use crate::registry::TypeId;
use ahash::AHashMap;
use parking_lot::RwLock;

/// A record, or one instantiation of a template record. The argument key
/// is empty for plain records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub id: TypeId,
    pub args: String,
}

impl InstanceKey {
    pub fn plain(id: TypeId) -> Self {
        Self {
            id,
            args: String::new(),
        }
    }
}

/// Layouts computed as dependencies of other layouts, shared by all
/// layout threads.
pub struct LayoutCache {
    cache: RwLock<AHashMap<InstanceKey, RecordLayout>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(AHashMap::new()),
        }
    }

    pub fn get(&self, key: &InstanceKey) -> Option<RecordLayout> {
        self.cache.read().get(key).cloned()
    }

    pub fn insert(&self, key: InstanceKey, layout: RecordLayout) {
        self.cache.write().insert(key, layout);
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    pub fn size(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}
