// Mon Oct 12 2026 - Alex

use super::ast::*;
use super::error::{ParseError, ParseResult};
use crate::diagnostic::{Diagnostic, DiagnosticKind, SourceLocation, Span};
use crate::lexer::{tokenize, Comment, Punct, Token, TokenKind};
use log::{debug, trace};

/// One parsed file plus everything the lexer and parser had to say about it.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub file: SourceFile,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lexes and parses one source text. A lex failure yields an empty file and a
/// single LexError; syntax errors only drop the declaration they occur in.
pub fn parse_source(name: &str, source: &str) -> ParsedFile {
    match tokenize(source) {
        Ok(tokens) => {
            let mut parser = Parser::new(name, tokens);
            let declarations = parser.parse_file();
            debug!(
                "parsed {}: {} declarations, {} diagnostics",
                name,
                declarations.len(),
                parser.diagnostics.len()
            );
            ParsedFile {
                file: SourceFile {
                    name: name.to_string(),
                    declarations,
                },
                diagnostics: parser.diagnostics,
            }
        }
        Err(err) => {
            debug!("lexing {} failed: {}", name, err);
            ParsedFile {
                file: SourceFile {
                    name: name.to_string(),
                    declarations: Vec::new(),
                },
                diagnostics: vec![Diagnostic::new(
                    DiagnosticKind::LexError,
                    err.to_string(),
                    SourceLocation::new(name, err.span()),
                )],
            }
        }
    }
}

pub struct Parser {
    pub(crate) file: String,
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(file: &str, tokens: Vec<Token>) -> Self {
        Self {
            file: file.to_string(),
            tokens,
            position: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse_file(&mut self) -> Vec<Declaration> {
        let declarations = self.parse_scope();
        if !self.at_end() {
            // A stray `}` at file scope.
            let token = self.peek().clone();
            self.error(ParseError::Unexpected {
                found: token.kind.to_string(),
                span: token.span,
            });
            self.advance();
            let mut rest = self.parse_file();
            let mut all = declarations;
            all.append(&mut rest);
            return all;
        }
        declarations
    }

    /// Parses declarations up to end of input or a closing `}`, which is left
    /// for the caller.
    pub(crate) fn parse_scope(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            if self.at_end() || self.check(Punct::RBrace) {
                break;
            }
            if self.eat(Punct::Semi) {
                continue;
            }
            let start = self.position;
            match self.parse_declaration() {
                Ok(Some(decl)) => declarations.push(decl),
                Ok(None) => {}
                Err(err) => {
                    trace!("syntax error in {}: {}", self.file, err);
                    self.error(err);
                    if self.position == start {
                        // Nothing was consumed, so no declaration began here.
                        self.advance();
                    } else {
                        self.recover(start);
                    }
                }
            }
        }
        declarations
    }

    fn parse_declaration(&mut self) -> ParseResult<Option<Declaration>> {
        let token = self.peek().clone();
        let keyword = match token.ident() {
            Some(word) => word.to_string(),
            None => {
                return Err(ParseError::Expected {
                    expected: "a declaration".to_string(),
                    found: token.kind.to_string(),
                    span: token.span,
                })
            }
        };

        match keyword.as_str() {
            "namespace" => self.parse_namespace(),
            "inline" if self.peek_at(1).is_ident("namespace") => {
                self.advance();
                self.parse_namespace()
            }
            "enum" => match self.parse_enum()? {
                Some((decl, closing)) => {
                    self.close_top_level(closing);
                    Ok(Some(Declaration::Enum(decl)))
                }
                None => Ok(None),
            },
            "struct" | "class" | "union" => self.parse_top_level_record(Vec::new()),
            "template" => {
                let params = self.parse_template_header()?;
                if self.check_record_keyword() {
                    self.parse_top_level_record(params)
                } else {
                    // Function and alias templates carry no layout.
                    self.skip_statement();
                    Ok(None)
                }
            }
            "extern" if matches!(self.peek_at(1).kind, TokenKind::Str(_)) => {
                self.advance();
                self.advance();
                if self.eat(Punct::LBrace) {
                    let inner = self.parse_scope();
                    self.expect(Punct::RBrace)?;
                    return Ok(Some(Declaration::Namespace(NamespaceDecl {
                        path: Vec::new(),
                        declarations: inner,
                        span: token.span,
                    })));
                }
                self.skip_statement();
                Ok(None)
            }
            // Globals, free functions, aliases and assertions have no place in the model.
            _ => {
                self.skip_statement();
                Ok(None)
            }
        }
    }

    fn parse_namespace(&mut self) -> ParseResult<Option<Declaration>> {
        let keyword = self.advance();
        let mut path = Vec::new();
        if let Some(name) = self.peek().ident().map(str::to_string) {
            self.advance();
            path.push(name);
            while self.eat(Punct::ColonColon) {
                self.eat_ident("inline");
                path.push(self.expect_ident()?);
            }
        }
        if self.eat(Punct::Eq) {
            // Namespace alias.
            self.skip_statement();
            return Ok(None);
        }
        self.expect(Punct::LBrace)?;
        let declarations = self.parse_scope();
        self.expect(Punct::RBrace)?;
        self.eat(Punct::Semi);
        Ok(Some(Declaration::Namespace(NamespaceDecl {
            path,
            declarations,
            span: keyword.span,
        })))
    }

    fn parse_top_level_record(&mut self, params: Vec<TemplateParam>) -> ParseResult<Option<Declaration>> {
        match self.parse_record(params)? {
            Some((record, closing)) => {
                self.close_top_level(closing);
                Ok(Some(Declaration::Record(record)))
            }
            None => Ok(None),
        }
    }

    /// Variables declared together with a type at namespace scope are dropped.
    fn close_top_level(&mut self, closing: Span) {
        if self.finish_type_definition(closing) {
            self.skip_statement();
        }
    }

    /// Handles what may follow the `}` of a type definition. Returns true when
    /// a declarator list follows (`} instance;`), which is left unconsumed.
    /// The `;` may be omitted without diagnostic when the definition closes
    /// its scope.
    pub(crate) fn finish_type_definition(&mut self, closing: Span) -> bool {
        if self.eat(Punct::Semi) {
            return false;
        }
        if self.at_end() || self.check(Punct::RBrace) {
            return false;
        }
        let declarator = match self.peek().ident() {
            Some(word) => {
                let next = self.peek_at(1);
                !is_declaration_keyword(word)
                    && [Punct::Semi, Punct::Comma, Punct::LBracket, Punct::Eq, Punct::Colon, Punct::LBrace]
                        .iter()
                        .any(|p| next.is_punct(*p))
            }
            None => self.check(Punct::Star) || self.check(Punct::Amp),
        };
        if declarator {
            return true;
        }
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::MissingSemicolon,
            "expected `;` after type definition",
            SourceLocation::new(&self.file, closing),
        ));
        false
    }

    /// Drops everything from `start` to the next declaration boundary.
    pub(crate) fn recover(&mut self, start: usize) {
        self.position = start;
        let mut depth = 0usize;
        while !self.at_end() {
            match self.peek().kind {
                TokenKind::Punct(Punct::LBrace) => depth += 1,
                TokenKind::Punct(Punct::RBrace) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        self.eat(Punct::Semi);
                        break;
                    }
                }
                TokenKind::Punct(Punct::Semi) if depth == 0 => {
                    self.advance();
                    break;
                }
                _ => {}
            }
            self.advance();
        }
        if self.position == start && !self.at_end() && !self.check(Punct::RBrace) {
            self.advance();
        }
    }

    /// Skips to the end of the current statement, stepping over balanced
    /// bodies. A body that is not followed by `;` ends the statement.
    pub(crate) fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            match self.peek().kind {
                TokenKind::Punct(Punct::LBrace) | TokenKind::Punct(Punct::LParen) | TokenKind::Punct(Punct::LBracket) => {
                    depth += 1
                }
                TokenKind::Punct(Punct::RBrace) => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        self.eat(Punct::Semi);
                        return;
                    }
                }
                TokenKind::Punct(Punct::RParen) | TokenKind::Punct(Punct::RBracket) => {
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Punct(Punct::Semi) if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skips a balanced group starting at the current opening token.
    pub(crate) fn skip_balanced(&mut self, open: Punct, close: Punct) {
        let mut depth = 0usize;
        while !self.at_end() {
            if self.check(open) {
                depth += 1;
            } else if self.check(close) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    self.advance();
                    return;
                }
            }
            self.advance();
        }
    }

    /// `alignas(8)`, `__declspec(...)`, `[[nodiscard]]`.
    pub(crate) fn skip_attributes(&mut self) {
        loop {
            if self.check(Punct::LBracket) && self.peek_at(1).is_punct(Punct::LBracket) {
                self.skip_balanced(Punct::LBracket, Punct::RBracket);
                continue;
            }
            let attribute = matches!(
                self.peek().ident(),
                Some("alignas" | "__declspec" | "__attribute__")
            );
            if attribute && self.peek_at(1).is_punct(Punct::LParen) {
                self.advance();
                self.skip_balanced(Punct::LParen, Punct::RParen);
                continue;
            }
            break;
        }
    }

    pub(crate) fn check_record_keyword(&self) -> bool {
        matches!(self.peek().ident(), Some("struct" | "class" | "union"))
    }

    /// The first comment in front of the current token that starts on `line`.
    pub(crate) fn trailing_comment(&self, line: u32) -> Option<&Comment> {
        self.peek().trivia.iter().find(|c| c.line == line)
    }

    pub(crate) fn error(&mut self, err: ParseError) {
        let span = err.span();
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::SyntaxError,
            err.to_string(),
            SourceLocation::new(&self.file, span),
        ));
    }

    pub(crate) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.position + offset).min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn at_end(&self) -> bool {
        self.peek().is_eof()
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.position += 1;
        }
        token
    }

    pub(crate) fn check(&self, punct: Punct) -> bool {
        self.peek().is_punct(punct)
    }

    pub(crate) fn eat(&mut self, punct: Punct) -> bool {
        if self.check(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_ident(&mut self, word: &str) -> bool {
        if self.peek().is_ident(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, punct: Punct) -> ParseResult<Token> {
        if self.check(punct) {
            Ok(self.advance())
        } else {
            Err(self.expected(&format!("`{}`", punct.as_str())))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().ident() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => Err(self.expected("an identifier")),
        }
    }

    pub(crate) fn expected(&self, what: &str) -> ParseError {
        let token = self.peek();
        ParseError::Expected {
            expected: what.to_string(),
            found: token.kind.to_string(),
            span: token.span,
        }
    }
}

fn is_declaration_keyword(word: &str) -> bool {
    matches!(
        word,
        "struct"
            | "class"
            | "union"
            | "enum"
            | "namespace"
            | "template"
            | "using"
            | "typedef"
            | "static_assert"
            | "extern"
            | "inline"
            | "public"
            | "private"
            | "protected"
            | "static"
            | "virtual"
            | "constexpr"
            | "const"
            | "friend"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedFile {
        parse_source("test.hpp", source)
    }

    #[test]
    fn test_namespace_nesting() {
        let parsed = parse("namespace game::world { struct Node { int id; }; }\nnamespace { enum E { A }; }");
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert_eq!(parsed.file.declarations.len(), 2);
        match &parsed.file.declarations[0] {
            Declaration::Namespace(ns) => {
                assert_eq!(ns.path, vec!["game", "world"]);
                assert_eq!(ns.declarations.len(), 1);
            }
            other => panic!("expected namespace, got {:?}", other),
        }
        match &parsed.file.declarations[1] {
            Declaration::Namespace(ns) => assert!(ns.path.is_empty()),
            other => panic!("expected namespace, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_final_semicolon_is_silent() {
        let parsed = parse("struct A { int x; }");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.file.declarations.len(), 1);

        let parsed = parse("namespace n { struct A { int x; } }");
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_semicolon_between_declarations() {
        let parsed = parse("struct A { int x; }\nstruct B { int y; };");
        assert_eq!(parsed.file.declarations.len(), 2);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::MissingSemicolon);
        assert_eq!(parsed.diagnostics[0].location.line, 1);
    }

    #[test]
    fn test_syntax_error_recovery() {
        let parsed = parse("struct Broken { int x[; };\nstruct Fine { int y; };");
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::SyntaxError);
        assert_eq!(parsed.file.declarations.len(), 1);
        assert_eq!(parsed.file.declarations[0].name(), "Fine");
    }

    #[test]
    fn test_lex_error_aborts_file() {
        let parsed = parse("struct A { int x; };\nconst char* s = \"open");
        assert!(parsed.file.declarations.is_empty());
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::LexError);
    }

    #[test]
    fn test_free_functions_and_globals_skipped() {
        let parsed = parse(
            "#pragma once\nusing u32 = unsigned int;\nvoid Init(int a) { if (a) { return; } }\nstatic int g = 4;\nstruct S { int v; };",
        );
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert_eq!(parsed.file.declarations.len(), 1);
        assert_eq!(parsed.file.declarations[0].name(), "S");
    }

    #[test]
    fn test_stray_closing_brace() {
        let parsed = parse("}\nstruct S { int v; };");
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.file.declarations.len(), 1);
    }

    #[test]
    fn test_unknown_character_is_syntax_error() {
        let parsed = parse("@ struct S { int v; };");
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::SyntaxError);
        assert_eq!(parsed.file.declarations.len(), 1);
    }
}
