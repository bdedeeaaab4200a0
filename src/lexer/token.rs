// Mon Oct 12 2026 - Alex

use crate::diagnostic::Span;
use std::fmt;

/// A comment kept as trivia in front of the token that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment body without the `//` or `/* */` markers.
    pub text: String,
    pub block: bool,
    pub line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntLiteral {
    pub value: u64,
    pub unsigned: bool,
    pub long: bool,
    pub radix: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Comma,
    Semi,
    Colon,
    ColonColon,
    Eq,
    EqEq,
    NotEq,
    LtEq,
    Star,
    Amp,
    AmpAmp,
    Plus,
    Minus,
    Slash,
    Percent,
    Pipe,
    PipePipe,
    Caret,
    Tilde,
    Bang,
    Dot,
    Arrow,
    Question,
    Shl,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    Ellipsis,
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Lt => "<",
            Punct::Gt => ">",
            Punct::Comma => ",",
            Punct::Semi => ";",
            Punct::Colon => ":",
            Punct::ColonColon => "::",
            Punct::Eq => "=",
            Punct::EqEq => "==",
            Punct::NotEq => "!=",
            Punct::LtEq => "<=",
            Punct::Star => "*",
            Punct::Amp => "&",
            Punct::AmpAmp => "&&",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::Pipe => "|",
            Punct::PipePipe => "||",
            Punct::Caret => "^",
            Punct::Tilde => "~",
            Punct::Bang => "!",
            Punct::Dot => ".",
            Punct::Arrow => "->",
            Punct::Question => "?",
            Punct::Shl => "<<",
            Punct::PlusPlus => "++",
            Punct::MinusMinus => "--",
            Punct::PlusEq => "+=",
            Punct::MinusEq => "-=",
            Punct::StarEq => "*=",
            Punct::SlashEq => "/=",
            Punct::Ellipsis => "...",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(IntLiteral),
    Float(f64),
    Str(String),
    Punct(Punct),
    Unknown(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Byte range in the source, used to tell `> >` apart from `>>`.
    pub start: usize,
    pub end: usize,
    pub trivia: Vec<Comment>,
}

impl Token {
    pub fn is_punct(&self, punct: Punct) -> bool {
        matches!(self.kind, TokenKind::Punct(p) if p == punct)
    }

    pub fn is_ident(&self, text: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(name) if name == text)
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// True when `next` starts exactly where this token ends.
    pub fn touches(&self, next: &Token) -> bool {
        self.end == next.start
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "`{}`", name),
            TokenKind::Int(lit) => write!(f, "integer `{}`", lit.value),
            TokenKind::Float(value) => write!(f, "float `{}`", value),
            TokenKind::Str(text) => write!(f, "string {:?}", text),
            TokenKind::Punct(p) => write!(f, "`{}`", p.as_str()),
            TokenKind::Unknown(c) => write!(f, "unexpected character `{}`", c),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
