// Mon Oct 12 2026 - Alex

pub mod annotation;
pub mod ast;
mod enums;
pub mod error;
mod expressions;
pub mod parser;
mod records;
mod types;

pub use annotation::parse_offset_annotation;
pub use ast::*;
pub use error::{ParseError, ParseResult};
pub use parser::{parse_source, ParsedFile, Parser};
