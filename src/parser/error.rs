// Mon Oct 12 2026 - Alex

use crate::diagnostic::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String, span: Span },
    #[error("unexpected {found}")]
    Unexpected { found: String, span: Span },
    #[error("{message}")]
    Unsupported { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Expected { span, .. }
            | ParseError::Unexpected { span, .. }
            | ParseError::Unsupported { span, .. } => *span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
