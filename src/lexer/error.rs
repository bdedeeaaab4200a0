// Mon Oct 12 2026 - Alex

use crate::diagnostic::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string literal starting at {}:{}", .0.line, .0.column)]
    UnterminatedString(Span),
    #[error("unterminated character literal starting at {}:{}", .0.line, .0.column)]
    UnterminatedChar(Span),
    #[error("unterminated block comment starting at {}:{}", .0.line, .0.column)]
    UnterminatedComment(Span),
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString(span)
            | LexError::UnterminatedChar(span)
            | LexError::UnterminatedComment(span) => *span,
        }
    }
}
