// Tue Jan 15 2026 - Alex

pub mod config;
pub mod diagnostic;
pub mod diff;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod structure;
pub mod utils;

pub use config::Config;
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use diff::{DiffError, TypeComparator, TypeDiff};
pub use pipeline::{analyze_snapshot, SourceText};
pub use registry::{SnapshotModel, TypeRegistry};
pub use structure::LayoutEngine;
