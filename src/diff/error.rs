// Tue Jan 15 2026 - Alex

use crate::registry::TypeKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffError {
    #[error("Unknown snapshot: {0}")]
    UnknownSnapshot(String),

    #[error("Type `{qualified}` not found in snapshot {snapshot}")]
    UnknownType { snapshot: String, qualified: String },

    #[error("`{qualified}` changed kind from {old} to {new}")]
    KindMismatch {
        qualified: String,
        old: TypeKind,
        new: TypeKind,
    },
}
