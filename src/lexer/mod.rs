// Mon Oct 12 2026 - Alex

pub mod error;
pub mod lexer;
pub mod token;

pub use error::LexError;
pub use lexer::{tokenize, Lexer};
pub use token::{Comment, IntLiteral, Punct, Token, TokenKind};
