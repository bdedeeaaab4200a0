// Mon Oct 12 2026 - Alex

use super::ast::*;
use super::error::ParseResult;
use super::expressions::ExprContext;
use super::parser::Parser;
use crate::diagnostic::Span;
use crate::lexer::Punct;

impl Parser {
    /// Parses an enum definition. Forward declarations and elaborated uses
    /// (`enum E value;`) yield `None`. On success the span of the closing
    /// brace comes back with the declaration.
    pub(crate) fn parse_enum(&mut self) -> ParseResult<Option<(EnumDecl, Span)>> {
        let keyword = self.advance();
        let scoped = self.eat_ident("class") || self.eat_ident("struct");
        self.skip_attributes();

        let (name, span) = match self.peek().ident() {
            Some(name) => {
                let name = name.to_string();
                let span = self.advance().span;
                (name, span)
            }
            None => (
                format!("__anonymous_enum_{}_{}", keyword.span.line, keyword.span.column),
                keyword.span,
            ),
        };

        let underlying = if self.eat(Punct::Colon) {
            let mut ty = self.parse_type_spec()?;
            self.parse_declarator_modifiers(&mut ty);
            Some(ty)
        } else {
            None
        };

        if self.eat(Punct::Semi) {
            return Ok(None);
        }
        if !self.check(Punct::LBrace) {
            self.skip_statement();
            return Ok(None);
        }
        self.advance();

        let mut enumerators = Vec::new();
        while !self.check(Punct::RBrace) {
            let span = self.peek().span;
            let name = self.expect_ident()?;
            self.skip_attributes();
            let value = if self.eat(Punct::Eq) {
                Some(self.parse_expr(ExprContext::default())?)
            } else {
                None
            };
            enumerators.push(EnumeratorDecl { name, value, span });
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        let closing = self.expect(Punct::RBrace)?;

        Ok(Some((
            EnumDecl {
                name,
                scoped,
                underlying,
                enumerators,
                span,
            },
            closing.span,
        )))
    }
}
