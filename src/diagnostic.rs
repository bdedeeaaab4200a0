// Mon Oct 12 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    LexError,
    SyntaxError,
    MissingSemicolon,
    UnresolvedSymbol,
    AmbiguousSymbol,
    CyclicReference,
    InvalidExpression,
    TemplateArity,
    DuplicateDefinition,
    OffsetMismatch,
    NonMonotonicOffset,
    IncompleteLayout,
}

impl DiagnosticKind {
    pub fn default_severity(self) -> Severity {
        match self {
            Self::LexError | Self::SyntaxError => Severity::Error,
            Self::IncompleteLayout => Severity::Note,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Position of a token inside one source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: &str, span: Span) -> Self {
        Self {
            file: file.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: kind.default_severity(),
            kind,
            message: message.into(),
            location,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]: {}", self.location, self.severity, self.kind, self.message)
    }
}

/// Orders diagnostics by file, position, then kind. Stable, so equal keys keep
/// their emission order.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic], file_order: &[String]) {
    let rank = |file: &str| file_order.iter().position(|f| f == file).unwrap_or(usize::MAX);
    diagnostics.sort_by(|a, b| {
        rank(&a.location.file)
            .cmp(&rank(&b.location.file))
            .then(a.location.line.cmp(&b.location.line))
            .then(a.location.column.cmp(&b.location.column))
            .then(a.kind.cmp(&b.kind))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity() {
        let diag = Diagnostic::new(DiagnosticKind::OffsetMismatch, "x", SourceLocation::default());
        assert_eq!(diag.severity, Severity::Warning);
        assert!(!diag.is_error());

        let diag = Diagnostic::new(DiagnosticKind::SyntaxError, "x", SourceLocation::default());
        assert!(diag.is_error());
    }

    #[test]
    fn test_sort_by_file_then_position() {
        let order = vec!["b.hpp".to_string(), "a.hpp".to_string()];
        let mut diags = vec![
            Diagnostic::new(DiagnosticKind::UnresolvedSymbol, "1", SourceLocation::new("a.hpp", Span::new(1, 1))),
            Diagnostic::new(DiagnosticKind::UnresolvedSymbol, "2", SourceLocation::new("b.hpp", Span::new(9, 1))),
            Diagnostic::new(DiagnosticKind::UnresolvedSymbol, "3", SourceLocation::new("b.hpp", Span::new(2, 4))),
        ];
        sort_diagnostics(&mut diags, &order);
        let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["3", "2", "1"]);
    }
}
