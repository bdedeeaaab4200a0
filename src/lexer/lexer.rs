// Mon Oct 12 2026 - Alex

//! Tokenizer for the declaration subset.
//!
//! Comments are not dropped: they are collected as trivia and attached to the
//! next token so the parser can read offset annotations such as `// 0C` that
//! trail a field. Preprocessor lines (`#pragma once`, `#include`) are skipped.

use crate::diagnostic::Span;
use crate::lexer::{Comment, IntLiteral, LexError, Punct, Token, TokenKind};

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    line_has_token: bool,
    trivia: Vec<Comment>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            line_has_token: false,
            trivia: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let eof = token.is_eof();
            tokens.push(token);
            if eof {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;

        let span = self.span();
        let start = self.pos;

        let Some(c) = self.peek() else {
            return Ok(self.make(TokenKind::Eof, span, start));
        };

        self.line_has_token = true;

        let kind = if c == b'"' {
            TokenKind::Str(self.lex_string(span)?)
        } else if c == b'\'' {
            let value = self.lex_char(span)?;
            TokenKind::Int(IntLiteral { value, unsigned: false, long: false, radix: 10 })
        } else if c.is_ascii_digit() || (c == b'.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) {
            self.lex_number()
        } else if c.is_ascii_alphabetic() || c == b'_' {
            let ident = self.lex_ident();
            if matches!(ident.as_str(), "L" | "u" | "U" | "u8") && self.peek() == Some(b'"') {
                TokenKind::Str(self.lex_string(span)?)
            } else {
                TokenKind::Ident(ident)
            }
        } else if let Some(punct) = self.lex_punct() {
            TokenKind::Punct(punct)
        } else {
            let ch = self.source[self.pos..].chars().next().unwrap_or('\u{FFFD}');
            for _ in 0..ch.len_utf8() {
                self.bump();
            }
            TokenKind::Unknown(ch)
        };

        Ok(self.make(kind, span, start))
    }

    fn make(&mut self, kind: TokenKind, span: Span, start: usize) -> Token {
        Token {
            kind,
            span,
            start,
            end: self.pos,
            trivia: std::mem::take(&mut self.trivia),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c => {
                    self.bump();
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    let line = self.line;
                    self.bump();
                    self.bump();
                    let start = self.pos;
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                    let text = self.source[start..self.pos].trim_end_matches('\r').to_string();
                    self.trivia.push(Comment { text, block: false, line, end_line: line });
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    let span = self.span();
                    self.bump();
                    self.bump();
                    let start = self.pos;
                    loop {
                        match self.peek() {
                            None => return Err(LexError::UnterminatedComment(span)),
                            Some(b'*') if self.peek_at(1) == Some(b'/') => break,
                            Some(_) => self.bump(),
                        }
                    }
                    let text = self.source[start..self.pos].to_string();
                    self.bump();
                    self.bump();
                    self.trivia.push(Comment { text, block: true, line: span.line, end_line: self.line });
                }
                b'#' if !self.line_has_token => self.skip_directive(),
                _ => break,
            }
        }
        Ok(())
    }

    /// Skips a preprocessor line, honoring backslash continuations.
    fn skip_directive(&mut self) {
        while let Some(c) = self.peek() {
            if c == b'\\' && self.peek_at(1) == Some(b'\n') {
                self.bump();
                self.bump();
                continue;
            }
            if c == b'\n' {
                break;
            }
            self.bump();
        }
    }

    fn lex_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.bump();
            } else {
                break;
            }
        }
        self.source[start..self.pos].to_string()
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X' | b'b' | b'B')) {
            let radix = if matches!(self.peek_at(1), Some(b'x' | b'X')) { 16 } else { 2 };
            self.bump();
            self.bump();
            let digits = self.take_digits(|c| (c as char).is_digit(radix));
            let (unsigned, long) = self.int_suffix();
            let value = u64::from_str_radix(&digits, radix).unwrap_or(u64::MAX);
            return TokenKind::Int(IntLiteral { value, unsigned, long, radix });
        }

        let mut is_float = false;
        self.take_digits(|c| c.is_ascii_digit());
        if self.peek() == Some(b'.') {
            is_float = true;
            self.bump();
            self.take_digits(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = matches!(self.peek_at(1), Some(b'+' | b'-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.bump();
                if sign {
                    self.bump();
                }
                self.take_digits(|c| c.is_ascii_digit());
            }
        }

        let text: String = self.source[start..self.pos].chars().filter(|c| *c != '\'').collect();

        if is_float {
            if matches!(self.peek(), Some(b'f' | b'F' | b'l' | b'L')) {
                self.bump();
            }
            return TokenKind::Float(text.parse().unwrap_or(0.0));
        }

        let (unsigned, long) = self.int_suffix();
        let (value, radix) = if text.len() > 1 && text.starts_with('0') {
            (u64::from_str_radix(&text[1..], 8).unwrap_or(u64::MAX), 8)
        } else {
            (text.parse().unwrap_or(u64::MAX), 10)
        };
        TokenKind::Int(IntLiteral { value, unsigned, long, radix })
    }

    fn take_digits(&mut self, accept: impl Fn(u8) -> bool) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if accept(c) {
                digits.push(c as char);
                self.bump();
            } else if c == b'\'' && self.peek_at(1).is_some_and(&accept) {
                self.bump();
            } else {
                break;
            }
        }
        digits
    }

    fn int_suffix(&mut self) -> (bool, bool) {
        let mut unsigned = false;
        let mut long = false;
        while let Some(c) = self.peek() {
            match c {
                b'u' | b'U' => unsigned = true,
                b'l' | b'L' => long = true,
                _ => break,
            }
            self.bump();
        }
        (unsigned, long)
    }

    fn lex_string(&mut self, span: Span) -> Result<String, LexError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(LexError::UnterminatedString(span)),
                Some(b'"') => {
                    self.bump();
                    return Ok(text);
                }
                Some(b'\\') => {
                    self.bump();
                    match self.lex_escape() {
                        Some(c) => text.push(c),
                        None => return Err(LexError::UnterminatedString(span)),
                    }
                }
                Some(_) => {
                    let ch = self.source[self.pos..].chars().next().unwrap_or('\u{FFFD}');
                    for _ in 0..ch.len_utf8() {
                        self.bump();
                    }
                    text.push(ch);
                }
            }
        }
    }

    fn lex_char(&mut self, span: Span) -> Result<u64, LexError> {
        self.bump();
        let value = match self.peek() {
            None | Some(b'\n') | Some(b'\'') => return Err(LexError::UnterminatedChar(span)),
            Some(b'\\') => {
                self.bump();
                self.lex_escape().ok_or(LexError::UnterminatedChar(span))?
            }
            Some(_) => {
                let ch = self.source[self.pos..].chars().next().unwrap_or('\u{FFFD}');
                for _ in 0..ch.len_utf8() {
                    self.bump();
                }
                ch
            }
        };
        if self.peek() != Some(b'\'') {
            return Err(LexError::UnterminatedChar(span));
        }
        self.bump();
        Ok(value as u64)
    }

    fn lex_escape(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.bump();
        let ch = match c {
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'0' => '\0',
            b'\\' => '\\',
            b'\'' => '\'',
            b'"' => '"',
            b'x' => {
                let digits = self.take_digits(|c| c.is_ascii_hexdigit());
                let code = u32::from_str_radix(&digits, 16).ok()?;
                char::from_u32(code)?
            }
            b'\n' => return None,
            other => other as char,
        };
        Some(ch)
    }

    fn lex_punct(&mut self) -> Option<Punct> {
        let c = self.peek()?;
        let next = self.peek_at(1);
        let (punct, len) = match (c, next) {
            (b':', Some(b':')) => (Punct::ColonColon, 2),
            (b'=', Some(b'=')) => (Punct::EqEq, 2),
            (b'!', Some(b'=')) => (Punct::NotEq, 2),
            (b'<', Some(b'<')) => (Punct::Shl, 2),
            (b'<', Some(b'=')) => (Punct::LtEq, 2),
            (b'&', Some(b'&')) => (Punct::AmpAmp, 2),
            (b'|', Some(b'|')) => (Punct::PipePipe, 2),
            (b'-', Some(b'>')) => (Punct::Arrow, 2),
            (b'+', Some(b'+')) => (Punct::PlusPlus, 2),
            (b'-', Some(b'-')) => (Punct::MinusMinus, 2),
            (b'+', Some(b'=')) => (Punct::PlusEq, 2),
            (b'-', Some(b'=')) => (Punct::MinusEq, 2),
            (b'*', Some(b'=')) => (Punct::StarEq, 2),
            (b'/', Some(b'=')) => (Punct::SlashEq, 2),
            (b'.', Some(b'.')) if self.peek_at(2) == Some(b'.') => (Punct::Ellipsis, 3),
            (b'{', _) => (Punct::LBrace, 1),
            (b'}', _) => (Punct::RBrace, 1),
            (b'(', _) => (Punct::LParen, 1),
            (b')', _) => (Punct::RParen, 1),
            (b'[', _) => (Punct::LBracket, 1),
            (b']', _) => (Punct::RBracket, 1),
            (b'<', _) => (Punct::Lt, 1),
            (b'>', _) => (Punct::Gt, 1),
            (b',', _) => (Punct::Comma, 1),
            (b';', _) => (Punct::Semi, 1),
            (b':', _) => (Punct::Colon, 1),
            (b'=', _) => (Punct::Eq, 1),
            (b'*', _) => (Punct::Star, 1),
            (b'&', _) => (Punct::Amp, 1),
            (b'+', _) => (Punct::Plus, 1),
            (b'-', _) => (Punct::Minus, 1),
            (b'/', _) => (Punct::Slash, 1),
            (b'%', _) => (Punct::Percent, 1),
            (b'|', _) => (Punct::Pipe, 1),
            (b'^', _) => (Punct::Caret, 1),
            (b'~', _) => (Punct::Tilde, 1),
            (b'!', _) => (Punct::Bang, 1),
            (b'.', _) => (Punct::Dot, 1),
            (b'?', _) => (Punct::Question, 1),
            _ => return None,
        };
        for _ in 0..len {
            self.bump();
        }
        Some(punct)
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += 1;
            if c == b'\n' {
                self.line += 1;
                self.column = 1;
                self.line_has_token = false;
            } else if c & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_pragma_is_discarded() {
        let tokens = kinds("#pragma once\nstruct A;");
        assert_eq!(tokens[0], TokenKind::Ident("struct".to_string()));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_integer_literals() {
        let tokens = kinds("10 0x4B 0b101 42u 7ULL 1'000");
        let values: Vec<u64> = tokens
            .iter()
            .filter_map(|k| match k {
                TokenKind::Int(lit) => Some(lit.value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![10, 0x4B, 5, 42, 7, 1000]);
        assert!(matches!(tokens[3], TokenKind::Int(IntLiteral { unsigned: true, .. })));
        assert!(matches!(tokens[4], TokenKind::Int(IntLiteral { unsigned: true, long: true, .. })));
    }

    #[test]
    fn test_float_literal() {
        let tokens = kinds("3.141592 1.5f 2e3");
        assert_eq!(tokens[0], TokenKind::Float(3.141592));
        assert_eq!(tokens[1], TokenKind::Float(1.5));
        assert_eq!(tokens[2], TokenKind::Float(2000.0));
    }

    #[test]
    fn test_trailing_comment_attaches_to_next_token() {
        let tokens = tokenize("bool a; // 00\nfloat b;").unwrap();
        let float = tokens.iter().find(|t| t.is_ident("float")).unwrap();
        assert_eq!(float.trivia.len(), 1);
        assert_eq!(float.trivia[0].text, " 00");
        assert_eq!(float.trivia[0].line, 1);
    }

    #[test]
    fn test_final_comment_attaches_to_eof() {
        let tokens = tokenize("int x; /* 0x10 */").unwrap();
        let eof = tokens.last().unwrap();
        assert!(eof.is_eof());
        assert_eq!(eof.trivia[0].text, " 0x10 ");
        assert!(eof.trivia[0].block);
    }

    #[test]
    fn test_nested_template_closers_stay_split() {
        let tokens = tokenize("A<B<C>>").unwrap();
        let gts: Vec<&Token> = tokens.iter().filter(|t| t.is_punct(Punct::Gt)).collect();
        assert_eq!(gts.len(), 2);
        assert!(gts[0].touches(gts[1]));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = kinds(r#"FNV1a64("a\"b\n")"#);
        assert_eq!(tokens[2], TokenKind::Str("a\"b\n".to_string()));
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = tokenize("auto k = \"open;\n").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString(span) if span.line == 1 && span.column == 10));
    }

    #[test]
    fn test_unterminated_block_comment_fails() {
        let err = tokenize("struct A {}; /* never closed").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment(_)));
    }

    #[test]
    fn test_unknown_characters_are_tokens() {
        let tokens = kinds("int @ x;");
        assert_eq!(tokens[1], TokenKind::Unknown('@'));
    }

    #[test]
    fn test_hash_mid_line_is_not_a_directive() {
        let tokens = kinds("int x # y");
        assert_eq!(tokens[2], TokenKind::Unknown('#'));
        assert_eq!(tokens[3], TokenKind::Ident("y".to_string()));
    }
}
