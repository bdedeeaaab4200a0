// Tue Jan 15 2026 - Alex

pub mod comparison;
pub mod error;
pub mod report;

pub use comparison::{DifferenceSeverity, TypeComparator, TypeDiff, TypeDifference};
pub use error::DiffError;
pub use report::{DiffReport, DiffSummary, ReportFormat};
