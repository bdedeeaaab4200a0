// Thu Oct 15 2026 - Alex

use super::model::SnapshotModel;
use crate::diff::{DiffError, TypeComparator, TypeDiff};
use indexmap::IndexMap;
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

/// Snapshots side by side, keyed by snapshot id. The same qualified name
/// may appear in every snapshot.
pub struct TypeRegistry {
    snapshots: RwLock<IndexMap<String, Arc<SnapshotModel>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(IndexMap::new()),
        }
    }

    /// Stores a model, returning the one it replaces.
    pub fn insert(&self, model: SnapshotModel) -> Option<Arc<SnapshotModel>> {
        debug!("registering snapshot {} ({} types)", model.id, model.types.len());
        self.snapshots.write().insert(model.id.clone(), Arc::new(model))
    }

    pub fn get(&self, id: &str) -> Option<Arc<SnapshotModel>> {
        self.snapshots.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<SnapshotModel>> {
        self.snapshots.write().shift_remove(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.snapshots.read().keys().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Compares one qualified type across two snapshots.
    pub fn diff(&self, old: &str, new: &str, qualified: &str) -> Result<TypeDiff, DiffError> {
        self.diff_with(&TypeComparator::new(), old, new, qualified)
    }

    pub fn diff_with(&self, comparator: &TypeComparator, old: &str, new: &str, qualified: &str) -> Result<TypeDiff, DiffError> {
        let old_model = self.get(old).ok_or_else(|| DiffError::UnknownSnapshot(old.to_string()))?;
        let new_model = self.get(new).ok_or_else(|| DiffError::UnknownSnapshot(new.to_string()))?;
        let before = old_model.get(qualified).ok_or_else(|| DiffError::UnknownType {
            snapshot: old.to_string(),
            qualified: qualified.to_string(),
        })?;
        let after = new_model.get(qualified).ok_or_else(|| DiffError::UnknownType {
            snapshot: new.to_string(),
            qualified: qualified.to_string(),
        })?;
        let mut diff = comparator.compare(before, after)?;
        diff.old_snapshot = old.to_string();
        diff.new_snapshot = new.to_string();
        Ok(diff)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::{analyze_snapshot, SourceText};

    fn model(id: &str, source: &str) -> SnapshotModel {
        analyze_snapshot(id, &[SourceText::new("game.hpp", source)], &Config::default().with_parallel(false))
    }

    #[test]
    fn test_snapshots_kept_side_by_side() {
        let registry = TypeRegistry::new();
        assert!(registry.insert(model("v1", "struct Player { int hp; };")).is_none());
        registry.insert(model("v2", "struct Player { int hp; float speed; };"));
        assert_eq!(registry.ids(), vec!["v1", "v2"]);
        assert_eq!(registry.get("v1").unwrap().get("Player").unwrap().fields.len(), 1);
        assert_eq!(registry.get("v2").unwrap().get("Player").unwrap().fields.len(), 2);
        assert!(registry.insert(model("v1", "struct Player {};")).is_some());
        assert_eq!(registry.size(), 2);
    }

    #[test]
    fn test_diff_errors() {
        let registry = TypeRegistry::new();
        registry.insert(model("v1", "struct Player { int hp; };"));
        registry.insert(model("v2", "enum class Player { A };"));
        assert!(matches!(registry.diff("v1", "v3", "Player"), Err(DiffError::UnknownSnapshot(id)) if id == "v3"));
        assert!(matches!(registry.diff("v1", "v2", "Enemy"), Err(DiffError::UnknownType { .. })));
        assert!(matches!(registry.diff("v1", "v2", "Player"), Err(DiffError::KindMismatch { .. })));
    }

    #[test]
    fn test_diff_through_registry() {
        let registry = TypeRegistry::new();
        registry.insert(model("v1", "struct Player { int hp; };"));
        registry.insert(model("v2", "struct Player { int hp; int armor; };"));
        let diff = registry.diff("v1", "v2", "Player").unwrap();
        assert_eq!(diff.old_snapshot, "v1");
        assert_eq!(diff.added_fields(), vec!["armor"]);
    }
}
