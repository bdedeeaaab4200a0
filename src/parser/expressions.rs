// Mon Oct 12 2026 - Alex

use super::ast::*;
use super::error::{ParseError, ParseResult};
use super::parser::Parser;
use crate::eval::scalar::{is_builtin_word, ScalarType};
use crate::lexer::{Punct, TokenKind};

/// Parsing context for constant expressions.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExprContext {
    /// Inside a template argument list a bare `>` closes the list, so `>>`
    /// is only a shift within parentheses.
    pub in_template: bool,
}

impl ExprContext {
    pub fn template_arg() -> Self {
        Self { in_template: true }
    }
}

impl Parser {
    pub(crate) fn parse_expr(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        self.parse_bit_or(ctx)
    }

    fn parse_bit_or(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        let mut lhs = self.parse_bit_xor(ctx)?;
        while self.check(Punct::Pipe) {
            self.advance();
            let rhs = self.parse_bit_xor(ctx)?;
            lhs = binary(BinaryOp::BitOr, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_bit_xor(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        let mut lhs = self.parse_bit_and(ctx)?;
        while self.check(Punct::Caret) {
            self.advance();
            let rhs = self.parse_bit_and(ctx)?;
            lhs = binary(BinaryOp::BitXor, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_bit_and(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        let mut lhs = self.parse_shift(ctx)?;
        while self.check(Punct::Amp) {
            self.advance();
            let rhs = self.parse_shift(ctx)?;
            lhs = binary(BinaryOp::BitAnd, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_shift(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        let mut lhs = self.parse_additive(ctx)?;
        loop {
            let op = if self.check(Punct::Shl) {
                self.advance();
                BinaryOp::Shl
            } else if !ctx.in_template && self.at_shift_right() {
                self.advance();
                self.advance();
                BinaryOp::Shr
            } else {
                break;
            };
            let rhs = self.parse_additive(ctx)?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    /// Two adjacent `>` tokens.
    fn at_shift_right(&self) -> bool {
        self.check(Punct::Gt) && self.peek_at(1).is_punct(Punct::Gt) && self.peek().touches(self.peek_at(1))
    }

    fn parse_additive(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        let mut lhs = self.parse_multiplicative(ctx)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct(Punct::Plus) => BinaryOp::Add,
                TokenKind::Punct(Punct::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative(ctx)?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary(ctx)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct(Punct::Star) => BinaryOp::Mul,
                TokenKind::Punct(Punct::Slash) => BinaryOp::Div,
                TokenKind::Punct(Punct::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary(ctx)?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Punct(Punct::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Punct(Punct::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        match op {
            Some(op) => {
                let token = self.advance();
                let operand = self.parse_unary(ctx)?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    token.span,
                ))
            }
            None => self.parse_primary(ctx),
        }
    }

    fn parse_primary(&mut self, ctx: ExprContext) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let span = token.span;
        match &token.kind {
            TokenKind::Int(lit) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Int {
                        value: lit.value,
                        unsigned: lit.unsigned,
                        long: lit.long,
                        decimal: lit.radix == 10,
                    },
                    span,
                ))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Float(*value), span))
            }
            TokenKind::Str(text) => {
                self.advance();
                let mut text = text.clone();
                while let TokenKind::Str(next) = &self.peek().kind {
                    text.push_str(next);
                    self.advance();
                }
                Ok(Expr::new(ExprKind::Str(text), span))
            }
            TokenKind::Punct(Punct::LParen) => {
                if let Some(cast) = self.try_parse_c_cast(ctx)? {
                    return Ok(cast);
                }
                self.advance();
                let inner = self.parse_expr(ExprContext::default())?;
                self.expect(Punct::RParen)?;
                Ok(inner)
            }
            TokenKind::Punct(Punct::ColonColon) => self.parse_name_or_call(),
            TokenKind::Ident(word) => match word.as_str() {
                "true" | "false" => {
                    self.advance();
                    Ok(Expr::new(ExprKind::Bool(word == "true"), span))
                }
                "nullptr" => {
                    self.advance();
                    Ok(Expr::new(
                        ExprKind::Int {
                            value: 0,
                            unsigned: false,
                            long: false,
                            decimal: true,
                        },
                        span,
                    ))
                }
                "static_cast" => {
                    self.advance();
                    self.expect(Punct::Lt)?;
                    let mut target = self.parse_type_spec()?;
                    self.parse_declarator_modifiers(&mut target);
                    self.expect(Punct::Gt)?;
                    self.expect(Punct::LParen)?;
                    let operand = self.parse_expr(ExprContext::default())?;
                    self.expect(Punct::RParen)?;
                    Ok(Expr::new(
                        ExprKind::Cast {
                            target,
                            operand: Box::new(operand),
                        },
                        span,
                    ))
                }
                _ => self.parse_name_or_call(),
            },
            _ => Err(ParseError::Expected {
                expected: "an expression".to_string(),
                found: token.kind.to_string(),
                span,
            }),
        }
    }

    fn parse_name_or_call(&mut self) -> ParseResult<Expr> {
        let span = self.peek().span;
        let global = self.eat(Punct::ColonColon);
        let mut segments = vec![self.expect_ident()?];
        while self.check(Punct::ColonColon) {
            self.advance();
            segments.push(self.expect_ident()?);
        }
        let name = QualifiedName { global, segments };

        if !self.eat(Punct::LParen) {
            return Ok(Expr::new(ExprKind::Name(name), span));
        }
        let mut args = Vec::new();
        if !self.eat(Punct::RParen) {
            loop {
                args.push(self.parse_expr(ExprContext::default())?);
                if self.eat(Punct::Comma) {
                    continue;
                }
                self.expect(Punct::RParen)?;
                break;
            }
        }
        Ok(Expr::new(ExprKind::Call { callee: name, args }, span))
    }

    /// `(uint32_t)value`. Only builtin scalar targets are recognized, which
    /// keeps `(kCount)` a parenthesized name.
    fn try_parse_c_cast(&mut self, ctx: ExprContext) -> ParseResult<Option<Expr>> {
        let is_scalar = match self.peek_at(1).ident() {
            Some(word) => is_builtin_word(word) || ScalarType::from_name(word).is_some() || word == "const",
            None => false,
        };
        if !is_scalar {
            return Ok(None);
        }
        let start = self.position;
        let open = self.advance();
        let target = match self.parse_type_spec() {
            Ok(mut ty) => {
                self.parse_declarator_modifiers(&mut ty);
                ty
            }
            Err(_) => {
                self.position = start;
                return Ok(None);
            }
        };
        if !self.eat(Punct::RParen) {
            self.position = start;
            return Ok(None);
        }
        let operand = self.parse_unary(ctx)?;
        Ok(Some(Expr::new(
            ExprKind::Cast {
                target,
                operand: Box::new(operand),
            },
            open.span,
        )))
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span;
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}
