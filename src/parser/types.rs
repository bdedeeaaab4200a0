// Mon Oct 12 2026 - Alex

use super::ast::*;
use super::error::ParseResult;
use super::expressions::ExprContext;
use super::parser::Parser;
use crate::eval::scalar::{is_builtin_word, normalize_builtin};
use crate::lexer::{Punct, TokenKind};

impl Parser {
    /// Parses a type specifier without declarator suffixes: cv-qualifiers,
    /// elaborated keywords, builtin word runs, qualified and templated names.
    pub(crate) fn parse_type_spec(&mut self) -> ParseResult<TypeRef> {
        let mut is_const = false;
        let mut is_volatile = false;
        loop {
            match self.peek().ident() {
                Some("const") => is_const = true,
                Some("volatile") => is_volatile = true,
                Some("typename" | "struct" | "class" | "enum" | "union") => {}
                _ => break,
            }
            self.advance();
        }

        let name = match self.peek().ident() {
            Some(word) if is_builtin_word(word) => {
                let mut words = Vec::new();
                while let Some(word) = self.peek().ident().filter(|w| is_builtin_word(w)) {
                    words.push(word.to_string());
                    self.advance();
                }
                TypeName::Plain(QualifiedName::single(&normalize_builtin(&words)))
            }
            _ => self.parse_type_name()?,
        };

        loop {
            match self.peek().ident() {
                Some("const") => is_const = true,
                Some("volatile") => is_volatile = true,
                _ => break,
            }
            self.advance();
        }

        Ok(TypeRef {
            name,
            pointer_depth: 0,
            reference: RefKind::None,
            is_const,
            is_volatile,
        })
    }

    fn parse_type_name(&mut self) -> ParseResult<TypeName> {
        let global = self.eat(Punct::ColonColon);
        let mut segments = vec![self.expect_ident()?];
        let mut args = None;
        loop {
            if self.check(Punct::Lt) {
                self.advance();
                args = Some(self.parse_template_args()?);
                continue;
            }
            if self.check(Punct::ColonColon) && matches!(self.peek_at(1).kind, TokenKind::Ident(_)) {
                self.advance();
                segments.push(self.expect_ident()?);
                // Arguments on an outer segment do not survive `Outer<T>::Inner`.
                args = None;
                continue;
            }
            break;
        }
        let name = QualifiedName { global, segments };
        Ok(match args {
            Some(args) => TypeName::Instantiation { template: name, args },
            None => TypeName::Plain(name),
        })
    }

    /// Parses the arguments after an opening `<`, through the matching `>`.
    pub(crate) fn parse_template_args(&mut self) -> ParseResult<Vec<TemplateArg>> {
        let mut args = Vec::new();
        if self.eat(Punct::Gt) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_template_arg()?);
            if self.eat(Punct::Comma) {
                continue;
            }
            self.expect(Punct::Gt)?;
            return Ok(args);
        }
    }

    fn parse_template_arg(&mut self) -> ParseResult<TemplateArg> {
        let start = self.position;
        let looks_like_type = self.check(Punct::ColonColon)
            || matches!(
                self.peek().ident(),
                Some(word) if !matches!(word, "true" | "false" | "nullptr" | "sizeof" | "static_cast")
            );
        if looks_like_type {
            if let Ok(mut ty) = self.parse_type_spec() {
                self.parse_declarator_modifiers(&mut ty);
                if self.check(Punct::Comma) || self.check(Punct::Gt) {
                    return Ok(TemplateArg::Type(ty));
                }
            }
            // `kSlots * 2` and friends are expressions after all.
            self.position = start;
        }
        Ok(TemplateArg::Value(self.parse_expr(ExprContext::template_arg())?))
    }

    /// `*`, `&`, `&&` and the cv-qualifiers that may sit between them.
    pub(crate) fn parse_declarator_modifiers(&mut self, ty: &mut TypeRef) {
        loop {
            if self.eat(Punct::Star) {
                ty.pointer_depth = ty.pointer_depth.saturating_add(1);
            } else if self.eat(Punct::Amp) {
                ty.reference = RefKind::LValue;
            } else if self.eat(Punct::AmpAmp) {
                ty.reference = RefKind::RValue;
            } else if matches!(
                self.peek().ident(),
                Some("const" | "volatile" | "__restrict" | "__ptr64" | "__unaligned")
            ) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// `template <typename T, uint32_t N = 4>`
    pub(crate) fn parse_template_header(&mut self) -> ParseResult<Vec<TemplateParam>> {
        self.advance();
        self.expect(Punct::Lt)?;
        let mut params = Vec::new();
        if self.eat(Punct::Gt) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_template_param()?);
            if self.eat(Punct::Comma) {
                continue;
            }
            self.expect(Punct::Gt)?;
            return Ok(params);
        }
    }

    fn parse_template_param(&mut self) -> ParseResult<TemplateParam> {
        let is_type_param = matches!(self.peek().ident(), Some("typename" | "class"))
            && !matches!(self.peek_at(1).ident(), Some(w) if is_builtin_word(w));
        if is_type_param {
            self.advance();
            self.eat(Punct::Ellipsis);
            let name = self.expect_ident()?;
            let default = if self.eat(Punct::Eq) {
                let mut ty = self.parse_type_spec()?;
                self.parse_declarator_modifiers(&mut ty);
                Some(TemplateArg::Type(ty))
            } else {
                None
            };
            return Ok(TemplateParam {
                name,
                kind: TemplateParamKind::Type,
                default,
            });
        }
        if self.peek().is_ident("template") {
            return Err(super::error::ParseError::Unsupported {
                message: "template template parameters are not supported".to_string(),
                span: self.peek().span,
            });
        }

        let mut ty = self.parse_type_spec()?;
        self.parse_declarator_modifiers(&mut ty);
        let name = self.expect_ident()?;
        let default = if self.eat(Punct::Eq) {
            Some(TemplateArg::Value(self.parse_expr(ExprContext::template_arg())?))
        } else {
            None
        };
        Ok(TemplateParam {
            name,
            kind: TemplateParamKind::Value(ty),
            default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_type(source: &str) -> TypeRef {
        let mut parser = Parser::new("t.hpp", tokenize(source).unwrap());
        let mut ty = parser.parse_type_spec().unwrap();
        parser.parse_declarator_modifiers(&mut ty);
        assert!(parser.at_end(), "trailing tokens in {:?}", source);
        ty
    }

    #[test]
    fn test_builtin_word_runs() {
        let ty = parse_type("const unsigned long long*");
        assert_eq!(ty.base_name().last(), "unsigned long long");
        assert!(ty.is_const);
        assert_eq!(ty.pointer_depth, 1);
    }

    #[test]
    fn test_nested_generics_split_closers() {
        let ty = parse_type("DynArray<Handle<game::Object>>&");
        assert_eq!(ty.to_string(), "DynArray<Handle<game::Object>>&");
        match &ty.args()[0] {
            TemplateArg::Type(inner) => match &inner.args()[0] {
                TemplateArg::Type(leaf) => assert_eq!(leaf.base_name().segments, vec!["game", "Object"]),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_value_arguments() {
        let ty = parse_type("Array<uint8_t, kSlots * 2>");
        assert!(matches!(ty.args()[0], TemplateArg::Type(_)));
        assert!(matches!(ty.args()[1], TemplateArg::Value(_)));

        let ty = parse_type("Array<int, (kBits >> 3)>");
        match &ty.args()[1] {
            TemplateArg::Value(expr) => assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::Shr, .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bare_identifier_argument_is_type() {
        let ty = parse_type("Array<int, N>");
        assert!(matches!(&ty.args()[1], TemplateArg::Type(t) if t.base_name().last() == "N"));
    }

    #[test]
    fn test_template_header() {
        let tokens = tokenize("template <typename K, class V, uint32_t N = 4>").unwrap();
        let mut parser = Parser::new("t.hpp", tokens);
        let params = parser.parse_template_header().unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].kind, TemplateParamKind::Type);
        assert_eq!(params[1].name, "V");
        assert!(matches!(&params[2].kind, TemplateParamKind::Value(ty) if ty.base_name().last() == "uint32_t"));
        assert!(params[2].default.is_some());
    }
}
