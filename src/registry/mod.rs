// Tue Oct 13 2026 - Alex

pub mod builder;
pub mod model;
pub mod resolve;
pub mod snapshot;
pub mod symbol;
pub mod type_registry;

pub use builder::{SnapshotBuilder, TypeBody, TypeEntry};
pub use model::{
    ArrayDim, ResolvedArg, ResolvedBase, ResolvedConstant, ResolvedEnumerator, ResolvedField, ResolvedType,
    ResolvedTypeRef, SnapshotModel, TypeKind, TypeTarget,
};
pub use resolve::Resolver;
pub use snapshot::Snapshot;
pub use symbol::{DeclKey, ScopeHit, SymbolKind, SymbolRef, TypeId};
pub use type_registry::TypeRegistry;
