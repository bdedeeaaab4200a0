// Tue Oct 13 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declaration order inside a batch: file index first, then preorder position
/// within the file. Registration happens in any order; this key restores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclKey {
    pub file: u32,
    pub ordinal: u32,
}

impl DeclKey {
    pub fn new(file: u32, ordinal: u32) -> Self {
        Self { file, ordinal }
    }
}

impl fmt::Display for DeclKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file, self.ordinal)
    }
}

/// Index of a surviving type declaration in a frozen snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Type,
    Field,
    Enumerator,
    Constant,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Type => write!(f, "a type"),
            SymbolKind::Field => write!(f, "a field"),
            SymbolKind::Enumerator => write!(f, "an enumerator"),
            SymbolKind::Constant => write!(f, "a constant"),
        }
    }
}

/// A name registered during phase one, still keyed by declaration position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub kind: SymbolKind,
    /// The declaring type; for `Type` registrations the type itself.
    pub owner: DeclKey,
    /// Member position inside the owner.
    pub index: usize,
    /// Unscoped enumerators are also visible in the enclosing scope. Those
    /// injected names never count as redefinitions.
    pub weak: bool,
}

impl Registration {
    pub fn sort_key(&self) -> (DeclKey, usize) {
        (self.owner, self.index)
    }
}

/// A name after the barrier, pointing into the frozen type list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolRef {
    Type(TypeId),
    Field { owner: TypeId, index: usize },
    Enumerator { owner: TypeId, index: usize },
    Constant { owner: TypeId, index: usize },
}

impl SymbolRef {
    pub fn kind(&self) -> SymbolKind {
        match self {
            SymbolRef::Type(_) => SymbolKind::Type,
            SymbolRef::Field { .. } => SymbolKind::Field,
            SymbolRef::Enumerator { .. } => SymbolKind::Enumerator,
            SymbolRef::Constant { .. } => SymbolKind::Constant,
        }
    }

    pub fn owner(&self) -> TypeId {
        match *self {
            SymbolRef::Type(id) => id,
            SymbolRef::Field { owner, .. } | SymbolRef::Enumerator { owner, .. } | SymbolRef::Constant { owner, .. } => owner,
        }
    }
}

/// Everything bound to one qualified name.
#[derive(Debug, Clone, Default)]
pub struct SymbolEntry {
    /// The surviving strong definition.
    pub primary: Option<SymbolRef>,
    /// Injected enumerators, in declaration order.
    pub weak: Vec<SymbolRef>,
}

/// Outcome of a scoped lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeHit {
    Found(SymbolRef),
    /// Several injected enumerators share the name; the first is used.
    Ambiguous { first: SymbolRef, candidates: usize },
    Missing,
}

impl ScopeHit {
    pub fn symbol(&self) -> Option<SymbolRef> {
        match self {
            ScopeHit::Found(symbol) => Some(*symbol),
            ScopeHit::Ambiguous { first, .. } => Some(*first),
            ScopeHit::Missing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decl_key_order() {
        let mut keys = vec![DeclKey::new(1, 0), DeclKey::new(0, 5), DeclKey::new(0, 2)];
        keys.sort();
        assert_eq!(keys, vec![DeclKey::new(0, 2), DeclKey::new(0, 5), DeclKey::new(1, 0)]);
    }

    #[test]
    fn test_symbol_ref_owner() {
        let field = SymbolRef::Field {
            owner: TypeId(3),
            index: 1,
        };
        assert_eq!(field.owner(), TypeId(3));
        assert_eq!(field.kind(), SymbolKind::Field);
        assert_eq!(ScopeHit::Missing.symbol(), None);
    }
}
