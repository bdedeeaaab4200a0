// Mon Oct 12 2026 - Alex

use super::annotation::parse_offset_annotation;
use super::ast::*;
use super::error::{ParseError, ParseResult};
use super::expressions::ExprContext;
use super::parser::Parser;
use crate::diagnostic::Span;
use crate::lexer::{Punct, TokenKind};

#[derive(Debug, Clone, Copy, Default)]
struct MemberSpecifiers {
    flags: FunctionFlags,
    is_static: bool,
    is_constexpr: bool,
    is_mutable: bool,
    is_const: bool,
    is_volatile: bool,
}

impl Parser {
    /// Parses `struct`/`class`/`union` definitions. Forward declarations and
    /// elaborated uses yield `None`.
    pub(crate) fn parse_record(&mut self, template_params: Vec<TemplateParam>) -> ParseResult<Option<(RecordDecl, Span)>> {
        let keyword = self.advance();
        let kind = match keyword.ident() {
            Some("class") => RecordKind::Class,
            Some("union") => RecordKind::Union,
            _ => RecordKind::Struct,
        };
        self.skip_attributes();

        let (name, span) = match self.peek().ident() {
            Some(_) => {
                let span = self.peek().span;
                let mut name = self.expect_ident()?;
                while self.check(Punct::ColonColon) {
                    self.advance();
                    name = self.expect_ident()?;
                }
                (name, span)
            }
            None if self.check(Punct::LBrace) => (
                format!("__anonymous_{}_{}_{}", kind, keyword.span.line, keyword.span.column),
                keyword.span,
            ),
            None => return Err(self.expected("a type name")),
        };

        if self.check(Punct::Lt) {
            return Err(ParseError::Unsupported {
                message: format!("specialization of `{}` is not supported", name),
                span: self.peek().span,
            });
        }
        let is_final = self.eat_ident("final");

        if self.eat(Punct::Semi) {
            return Ok(None);
        }
        if !self.check(Punct::LBrace) && !self.check(Punct::Colon) {
            self.skip_statement();
            return Ok(None);
        }

        let mut record = RecordDecl::new(kind, name, span);
        record.template_params = template_params;
        record.is_final = is_final;

        if self.eat(Punct::Colon) {
            loop {
                record.bases.push(self.parse_base_specifier()?);
                if !self.eat(Punct::Comma) {
                    break;
                }
            }
        }

        self.expect(Punct::LBrace)?;
        self.parse_record_body(&mut record)?;
        let closing = self.expect(Punct::RBrace)?;
        Ok(Some((record, closing.span)))
    }

    fn parse_base_specifier(&mut self) -> ParseResult<BaseSpecifier> {
        let mut access = None;
        let mut is_virtual = false;
        loop {
            match self.peek().ident() {
                Some("virtual") => is_virtual = true,
                Some("public") => access = Some(Access::Public),
                Some("protected") => access = Some(Access::Protected),
                Some("private") => access = Some(Access::Private),
                _ => break,
            }
            self.advance();
        }
        let ty = self.parse_type_spec()?;
        Ok(BaseSpecifier { ty, access, is_virtual })
    }

    fn parse_record_body(&mut self, record: &mut RecordDecl) -> ParseResult<()> {
        let mut access = record.kind.default_access();
        while !self.check(Punct::RBrace) && !self.at_end() {
            if self.eat(Punct::Semi) {
                continue;
            }
            let label = match self.peek().ident() {
                Some("public") => Some(Access::Public),
                Some("protected") => Some(Access::Protected),
                Some("private") => Some(Access::Private),
                _ => None,
            };
            if let Some(label) = label {
                if self.peek_at(1).is_punct(Punct::Colon) {
                    self.advance();
                    self.advance();
                    access = label;
                    continue;
                }
            }
            self.skip_attributes();

            match self.peek().ident() {
                Some("using" | "typedef" | "friend" | "static_assert") => self.skip_statement(),
                Some("template") => {
                    let params = self.parse_template_header()?;
                    if self.check_record_keyword() && self.at_type_definition() {
                        self.parse_nested_record(record, params, access)?;
                    } else {
                        // Member function templates.
                        self.skip_statement();
                    }
                }
                Some("enum") if self.at_type_definition() => {
                    if let Some((decl, closing)) = self.parse_enum()? {
                        let ty = TypeRef::named(&decl.name);
                        record.nested.push(Declaration::Enum(decl));
                        self.finish_nested_definition(record, ty, closing, access)?;
                    }
                }
                Some("struct" | "class" | "union") if self.at_type_definition() => {
                    self.parse_nested_record(record, Vec::new(), access)?;
                }
                _ => self.parse_member(record, access)?,
            }
        }
        Ok(())
    }

    fn parse_nested_record(&mut self, record: &mut RecordDecl, params: Vec<TemplateParam>, access: Access) -> ParseResult<()> {
        if let Some((nested, closing)) = self.parse_record(params)? {
            let anonymous = nested.name.starts_with("__anonymous_");
            let ty = TypeRef::named(&nested.name);
            let name = nested.name.clone();
            let span = nested.span;
            record.nested.push(Declaration::Record(nested));
            if anonymous && self.check(Punct::Semi) {
                // An anonymous member occupies storage under its synthesized name.
                self.advance();
                record.fields.push(FieldDecl {
                    name,
                    ty,
                    array: Vec::new(),
                    bit_width: None,
                    default: None,
                    access,
                    is_static: false,
                    is_mutable: false,
                    annotation: None,
                    comment: None,
                    span,
                });
                let index = record.fields.len() - 1;
                self.attach_trailing_comment(record, index);
                return Ok(());
            }
            self.finish_nested_definition(record, ty, closing, access)?;
        }
        Ok(())
    }

    /// `struct Inner { ... } inner;` declares a field of the nested type.
    fn finish_nested_definition(&mut self, record: &mut RecordDecl, ty: TypeRef, closing: Span, access: Access) -> ParseResult<()> {
        if self.finish_type_definition(closing) {
            self.parse_declarators(record, ty, MemberSpecifiers::default(), access)?;
        }
        Ok(())
    }

    /// True when the `struct`/`class`/`union`/`enum` keyword under the cursor
    /// opens a definition or forward declaration rather than an elaborated
    /// type specifier.
    pub(crate) fn at_type_definition(&self) -> bool {
        let mut i = 1;
        if self.peek().is_ident("enum") && matches!(self.peek_at(1).ident(), Some("class" | "struct")) {
            i = 2;
        }
        while matches!(self.peek_at(i).ident(), Some("alignas" | "__declspec")) {
            // Attribute with a parenthesized argument.
            i += 1;
            let mut depth = 0usize;
            loop {
                let token = self.peek_at(i);
                if token.is_eof() {
                    return false;
                }
                i += 1;
                if token.is_punct(Punct::LParen) {
                    depth += 1;
                } else if token.is_punct(Punct::RParen) {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
            }
        }
        if self.peek_at(i).is_punct(Punct::LBrace) {
            return true;
        }
        if !matches!(self.peek_at(i).kind, TokenKind::Ident(_)) {
            return false;
        }
        i += 1;
        while self.peek_at(i).is_punct(Punct::ColonColon) && matches!(self.peek_at(i + 1).kind, TokenKind::Ident(_)) {
            i += 2;
        }
        if self.peek_at(i).is_ident("final") {
            i += 1;
        }
        let next = self.peek_at(i);
        next.is_punct(Punct::LBrace) || next.is_punct(Punct::Colon) || next.is_punct(Punct::Semi)
    }

    fn parse_member(&mut self, record: &mut RecordDecl, access: Access) -> ParseResult<()> {
        let mut specs = MemberSpecifiers::default();
        loop {
            self.skip_attributes();
            match self.peek().ident() {
                Some("static") => specs.is_static = true,
                Some("virtual") => specs.flags |= FunctionFlags::VIRTUAL,
                Some("constexpr" | "consteval" | "constinit") => specs.is_constexpr = true,
                Some("mutable") => specs.is_mutable = true,
                Some("const") => specs.is_const = true,
                Some("volatile") => specs.is_volatile = true,
                Some("inline" | "explicit" | "thread_local" | "__forceinline" | "__fastcall" | "__thiscall") => {}
                _ => break,
            }
            self.advance();
        }
        if specs.is_static {
            specs.flags |= FunctionFlags::STATIC;
        }

        let span = self.peek().span;
        if self.check(Punct::Tilde) {
            self.advance();
            let name = format!("~{}", self.expect_ident()?);
            return self.parse_function_rest(record, name, None, specs.flags | FunctionFlags::DESTRUCTOR, access, span);
        }
        if self.peek().is_ident(&record.name) && self.peek_at(1).is_punct(Punct::LParen) {
            let name = self.expect_ident()?;
            return self.parse_function_rest(record, name, None, specs.flags | FunctionFlags::CONSTRUCTOR, access, span);
        }
        if self.peek().is_ident("operator") {
            self.advance();
            let mut target = self.parse_type_spec()?;
            self.parse_declarator_modifiers(&mut target);
            let name = format!("operator {}", target);
            return self.parse_function_rest(record, name, Some(target), specs.flags | FunctionFlags::OPERATOR, access, span);
        }

        let mut base = self.parse_type_spec()?;
        base.is_const |= specs.is_const;
        base.is_volatile |= specs.is_volatile;
        self.parse_declarators(record, base, specs, access)
    }

    /// Parses a comma-separated declarator list sharing one base type, up to
    /// and including the `;`.
    fn parse_declarators(&mut self, record: &mut RecordDecl, base: TypeRef, specs: MemberSpecifiers, access: Access) -> ParseResult<()> {
        let mut first_field = None;
        loop {
            let mut ty = base.clone();
            self.parse_declarator_modifiers(&mut ty);
            let span = self.peek().span;

            if self.peek().is_ident("operator") {
                self.advance();
                let name = self.parse_operator_name()?;
                return self.parse_function_rest(record, name, Some(ty), specs.flags | FunctionFlags::OPERATOR, access, span);
            }

            let name = if self.check(Punct::LParen) && self.peek_at(1).is_punct(Punct::Star) {
                // Function pointers are stored as plain pointers to their return type.
                self.advance();
                self.advance();
                let name = self.expect_ident()?;
                self.expect(Punct::RParen)?;
                if !self.check(Punct::LParen) {
                    return Err(self.expected("a parameter list"));
                }
                self.skip_balanced(Punct::LParen, Punct::RParen);
                ty.pointer_depth = ty.pointer_depth.saturating_add(1);
                name
            } else {
                let mut name = self.expect_ident()?;
                while self.check(Punct::ColonColon) {
                    self.advance();
                    name = self.expect_ident()?;
                }
                if self.check(Punct::LParen) {
                    return self.parse_function_rest(record, name, Some(ty), specs.flags, access, span);
                }
                name
            };

            let mut array = Vec::new();
            while self.eat(Punct::LBracket) {
                if self.check(Punct::RBracket) {
                    array.push(Expr::new(
                        ExprKind::Int {
                            value: 0,
                            unsigned: false,
                            long: false,
                            decimal: true,
                        },
                        self.peek().span,
                    ));
                } else {
                    array.push(self.parse_expr(ExprContext::default())?);
                }
                self.expect(Punct::RBracket)?;
            }
            let bit_width = if self.eat(Punct::Colon) {
                Some(self.parse_expr(ExprContext::default())?)
            } else {
                None
            };
            let default = self.parse_initializer()?;

            let constant = specs.is_static && array.is_empty() && (specs.is_constexpr || ty.is_const);
            match (constant, default) {
                (true, Some(value)) => record.constants.push(ConstantDecl {
                    name,
                    ty,
                    value,
                    is_constexpr: specs.is_constexpr,
                    access,
                    span,
                }),
                (_, default) => {
                    record.fields.push(FieldDecl {
                        name,
                        ty,
                        array,
                        bit_width,
                        default,
                        access,
                        is_static: specs.is_static,
                        is_mutable: specs.is_mutable,
                        annotation: None,
                        comment: None,
                        span,
                    });
                    first_field.get_or_insert(record.fields.len() - 1);
                }
            }

            if self.eat(Punct::Comma) {
                continue;
            }
            self.expect(Punct::Semi)?;
            break;
        }
        if let Some(index) = first_field {
            self.attach_trailing_comment(record, index);
        }
        Ok(())
    }

    /// `= expr`, `{ expr }` or `{}`; braced lists of several values are kept
    /// as their first element.
    fn parse_initializer(&mut self) -> ParseResult<Option<Expr>> {
        if self.eat(Punct::Eq) {
            if self.check(Punct::LBrace) {
                return self.parse_braced_initializer();
            }
            return Ok(Some(self.parse_expr(ExprContext::default())?));
        }
        if self.check(Punct::LBrace) {
            return self.parse_braced_initializer();
        }
        Ok(None)
    }

    fn parse_braced_initializer(&mut self) -> ParseResult<Option<Expr>> {
        self.expect(Punct::LBrace)?;
        if self.eat(Punct::RBrace) {
            return Ok(None);
        }
        let first = self.parse_expr(ExprContext::default())?;
        if !self.eat(Punct::RBrace) {
            while !self.check(Punct::RBrace) && !self.at_end() {
                if self.check(Punct::LBrace) {
                    self.skip_balanced(Punct::LBrace, Punct::RBrace);
                } else {
                    self.advance();
                }
            }
            self.expect(Punct::RBrace)?;
        }
        Ok(Some(first))
    }

    fn attach_trailing_comment(&mut self, record: &mut RecordDecl, index: usize) {
        let line = self.previous().span.line;
        let text = match self.trailing_comment(line) {
            Some(comment) => comment.text.clone(),
            None => return,
        };
        let field = &mut record.fields[index];
        match parse_offset_annotation(&text) {
            Some(annotation) => field.annotation = Some(annotation),
            None => field.comment = Some(text.trim().to_string()),
        }
    }

    fn parse_operator_name(&mut self) -> ParseResult<String> {
        if self.eat(Punct::LParen) {
            self.expect(Punct::RParen)?;
            return Ok("operator()".to_string());
        }
        if self.eat(Punct::LBracket) {
            self.expect(Punct::RBracket)?;
            return Ok("operator[]".to_string());
        }
        if let Some(word) = self.peek().ident().map(str::to_string) {
            self.advance();
            return Ok(format!("operator {}", word));
        }
        let mut symbol = String::new();
        while let TokenKind::Punct(punct) = self.peek().kind {
            if punct == Punct::LParen {
                break;
            }
            let token = self.advance();
            symbol.push_str(punct.as_str());
            if !token.touches(self.peek()) {
                break;
            }
        }
        if symbol.is_empty() {
            return Err(self.expected("an operator"));
        }
        Ok(format!("operator{}", symbol))
    }

    fn parse_function_rest(
        &mut self,
        record: &mut RecordDecl,
        name: String,
        return_type: Option<TypeRef>,
        mut flags: FunctionFlags,
        access: Access,
        span: Span,
    ) -> ParseResult<()> {
        let params = self.parse_parameters()?;

        loop {
            match self.peek().kind {
                TokenKind::Punct(Punct::Amp) | TokenKind::Punct(Punct::AmpAmp) => {
                    self.advance();
                    continue;
                }
                TokenKind::Punct(Punct::Arrow) => {
                    // Trailing return types replace `auto`.
                    self.advance();
                    let mut ty = self.parse_type_spec()?;
                    self.parse_declarator_modifiers(&mut ty);
                    return self.finish_function(record, name, params, Some(ty), flags, access, span);
                }
                _ => {}
            }
            match self.peek().ident() {
                Some("const") => flags |= FunctionFlags::CONST,
                Some("override") => flags |= FunctionFlags::OVERRIDE,
                Some("final") => flags |= FunctionFlags::FINAL,
                Some("volatile") => {}
                Some("noexcept" | "throw") => {
                    self.advance();
                    if self.check(Punct::LParen) {
                        self.skip_balanced(Punct::LParen, Punct::RParen);
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }
        self.finish_function(record, name, params, return_type, flags, access, span)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_function(
        &mut self,
        record: &mut RecordDecl,
        name: String,
        params: Vec<Parameter>,
        return_type: Option<TypeRef>,
        mut flags: FunctionFlags,
        access: Access,
        span: Span,
    ) -> ParseResult<()> {
        while matches!(self.peek().ident(), Some("override" | "final")) {
            if self.peek().is_ident("override") {
                flags |= FunctionFlags::OVERRIDE;
            } else {
                flags |= FunctionFlags::FINAL;
            }
            self.advance();
        }

        if self.eat(Punct::Eq) {
            let token = self.advance();
            match &token.kind {
                TokenKind::Int(lit) if lit.value == 0 => flags |= FunctionFlags::PURE_VIRTUAL,
                TokenKind::Ident(word) if word == "default" => flags |= FunctionFlags::DEFAULTED,
                TokenKind::Ident(word) if word == "delete" => flags |= FunctionFlags::DELETED,
                _ => {
                    return Err(ParseError::Expected {
                        expected: "`0`, `default` or `delete`".to_string(),
                        found: token.kind.to_string(),
                        span: token.span,
                    })
                }
            }
        }

        if self.eat(Punct::Colon) {
            self.skip_member_initializers();
        }
        if self.check(Punct::LBrace) {
            self.skip_balanced(Punct::LBrace, Punct::RBrace);
            self.eat(Punct::Semi);
        } else {
            self.expect(Punct::Semi)?;
        }

        let line = self.previous().span.line;
        let annotation = self
            .trailing_comment(line)
            .and_then(|comment| parse_offset_annotation(&comment.text))
            .map(|annotation| annotation.offset);

        record.functions.push(FunctionSignature {
            name,
            params,
            return_type,
            flags,
            access,
            annotation,
            span,
        });
        Ok(())
    }

    fn parse_parameters(&mut self) -> ParseResult<Vec<Parameter>> {
        self.expect(Punct::LParen)?;
        let mut params = Vec::new();
        if self.eat(Punct::RParen) {
            return Ok(params);
        }
        if self.peek().is_ident("void") && self.peek_at(1).is_punct(Punct::RParen) {
            self.advance();
            self.advance();
            return Ok(params);
        }
        loop {
            if self.eat(Punct::Ellipsis) {
                self.expect(Punct::RParen)?;
                return Ok(params);
            }
            self.skip_attributes();
            let mut ty = self.parse_type_spec()?;
            self.parse_declarator_modifiers(&mut ty);
            let name = match self.peek().ident() {
                Some(name) => {
                    let name = name.to_string();
                    self.advance();
                    Some(name)
                }
                None => None,
            };
            while self.check(Punct::LBracket) {
                self.skip_balanced(Punct::LBracket, Punct::RBracket);
                ty.pointer_depth = ty.pointer_depth.saturating_add(1);
            }
            let has_default = self.eat(Punct::Eq);
            if has_default {
                self.skip_default_argument();
            }
            params.push(Parameter { ty, name, has_default });
            if self.eat(Punct::Comma) {
                continue;
            }
            self.expect(Punct::RParen)?;
            return Ok(params);
        }
    }

    /// Default arguments are not part of the model.
    fn skip_default_argument(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            match self.peek().kind {
                TokenKind::Punct(Punct::LParen | Punct::LBrace | Punct::LBracket | Punct::Lt) => depth += 1,
                TokenKind::Punct(Punct::RParen | Punct::RBrace | Punct::RBracket | Punct::Gt) => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Punct(Punct::Comma) if depth == 0 => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skips `: a(1), b{2}` up to the constructor body.
    fn skip_member_initializers(&mut self) {
        while !self.at_end() {
            if self.check(Punct::LParen) {
                self.skip_balanced(Punct::LParen, Punct::RParen);
                continue;
            }
            if self.check(Punct::LBrace) {
                if matches!(self.previous().kind, TokenKind::Ident(_)) || self.previous().is_punct(Punct::Gt) {
                    self.skip_balanced(Punct::LBrace, Punct::RBrace);
                    continue;
                }
                return;
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostic::DiagnosticKind;
    use crate::parser::{parse_source, Declaration, FunctionFlags, RecordDecl, RecordKind, TemplateParamKind};

    fn record(source: &str) -> RecordDecl {
        let parsed = parse_source("r.hpp", source);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        match parsed.file.declarations.into_iter().next() {
            Some(Declaration::Record(record)) => record,
            other => panic!("expected a record, got {:?}", other),
        }
    }

    #[test]
    fn test_fields_with_annotations() {
        let record = record(
            "struct GameApp {\n\
             \tbool isRunning; // 00\n\
             \tfloat delta; // 04\n\
             \tvoid* context; // 0x8\n\
             \tuint8_t unk30[0x1B]; // 0x30 - 0x4B\n\
             \tint note; // ESystemPoolSize::Audio\n\
             };",
        );
        assert_eq!(record.kind, RecordKind::Struct);
        let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["isRunning", "delta", "context", "unk30", "note"]);
        assert_eq!(record.fields[1].annotation.unwrap().offset, 4);
        assert_eq!(record.fields[2].ty.pointer_depth, 1);
        assert_eq!(record.fields[3].annotation.unwrap().end, Some(0x4B));
        assert_eq!(record.fields[3].array.len(), 1);
        assert!(record.fields[4].annotation.is_none());
        assert_eq!(record.fields[4].comment.as_deref(), Some("ESystemPoolSize::Audio"));
    }

    #[test]
    fn test_leading_comment_is_not_trailing() {
        let record = record("struct S {\n\tint a;\n\t// 10\n\tint b; // 14\n};");
        assert!(record.fields[0].annotation.is_none());
        assert_eq!(record.fields[1].annotation.unwrap().offset, 0x14);
    }

    #[test]
    fn test_last_field_annotation_before_brace() {
        let record = record("struct S { int a; uint32_t capacity; // 0C\n};");
        assert_eq!(record.fields[1].annotation.unwrap().offset, 0x0C);
    }

    #[test]
    fn test_modifiers_and_defaults() {
        let record = record(
            "class Player {\n\
             public:\n\
             \tstatic constexpr uint32_t kMaxSlots = 8;\n\
             \tstatic int s_count;\n\
             \tconst char* name = nullptr;\n\
             \tmutable int cache{3};\n\
             \tuint32_t flags : 4, mode : 2;\n\
             \tint& ref;\n\
             protected:\n\
             \tint hidden;\n\
             };",
        );
        assert_eq!(record.constants.len(), 1);
        assert_eq!(record.constants[0].name, "kMaxSlots");
        let s_count = &record.fields[0];
        assert!(s_count.is_static);
        let name = &record.fields[1];
        assert!(name.ty.is_const && name.default.is_some());
        assert!(record.fields[2].is_mutable);
        assert_eq!(record.fields[2].default.as_ref().unwrap().to_string(), "3");
        assert!(record.fields[3].bit_width.is_some());
        assert_eq!(record.fields[4].name, "mode");
        assert_eq!(record.fields[5].ty.reference, crate::parser::RefKind::LValue);
        assert_eq!(record.fields[6].access, crate::parser::Access::Protected);
        assert_eq!(record.fields[0].access, crate::parser::Access::Public);
    }

    #[test]
    fn test_class_default_access_is_private() {
        let record = record("class C { int x; };");
        assert_eq!(record.fields[0].access, crate::parser::Access::Private);
    }

    #[test]
    fn test_function_signatures() {
        let record = record(
            "class IScriptable : public ISerializable {\n\
             public:\n\
             \tIScriptable();\n\
             \tvirtual ~IScriptable() = default;\n\
             \tvirtual void Serialize(Stream& out) const = 0; // 08\n\
             \tbool IsValid() const override { return true; }\n\
             \tstatic IScriptable* Create(int kind = 0, ...);\n\
             \tbool operator==(const IScriptable& other) const;\n\
             \toperator bool() const;\n\
             \tauto Size() -> size_t;\n\
             };",
        );
        assert_eq!(record.bases.len(), 1);
        assert_eq!(record.bases[0].access, Some(crate::parser::Access::Public));
        let f = &record.functions;
        assert_eq!(f.len(), 8);
        assert!(f[0].flags.contains(FunctionFlags::CONSTRUCTOR));
        assert!(f[1].flags.contains(FunctionFlags::DESTRUCTOR | FunctionFlags::VIRTUAL | FunctionFlags::DEFAULTED));
        assert_eq!(f[1].name, "~IScriptable");
        assert!(f[2].flags.contains(FunctionFlags::PURE_VIRTUAL | FunctionFlags::CONST));
        assert_eq!(f[2].annotation, Some(8));
        assert_eq!(f[2].params[0].name.as_deref(), Some("out"));
        assert!(f[3].flags.contains(FunctionFlags::OVERRIDE));
        assert!(f[4].flags.contains(FunctionFlags::STATIC));
        assert!(f[4].params[0].has_default);
        assert_eq!(f[5].name, "operator==");
        assert!(f[5].flags.contains(FunctionFlags::OPERATOR));
        assert_eq!(f[6].name, "operator bool");
        assert_eq!(f[7].return_type.as_ref().unwrap().to_string(), "size_t");
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_nested_types() {
        let record = record(
            "struct Player {\n\
             \tenum class Owner : uint8_t { None, Local, Remote };\n\
             \tstruct Binding { int key; } binding;\n\
             \tOwner owner;\n\
             \tstruct Binding* next;\n\
             \tunion { int asInt; float asFloat; };\n\
             };",
        );
        assert_eq!(record.nested.len(), 3);
        let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names[0], "binding");
        assert_eq!(names[1], "owner");
        assert_eq!(names[2], "next");
        assert_eq!(record.fields[2].ty.base_name().last(), "Binding");
        assert!(record.fields[3].name.starts_with("__anonymous_union"));
    }

    #[test]
    fn test_template_record() {
        let parsed = parse_source(
            "t.hpp",
            "template <typename T, uint32_t N>\nstruct Array {\n\tT data[N];\n}",
        );
        assert!(parsed.diagnostics.is_empty());
        match &parsed.file.declarations[0] {
            Declaration::Record(record) => {
                assert!(record.is_template());
                assert!(matches!(record.template_params[1].kind, TemplateParamKind::Value(_)));
                assert_eq!(record.fields[0].array[0].to_string(), "N");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_forward_declarations_produce_nothing() {
        let parsed = parse_source("f.hpp", "struct A;\nclass B;\nstruct C { struct A* a; };");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.file.declarations.len(), 1);
    }

    #[test]
    fn test_specialization_rejected() {
        let parsed = parse_source("s.hpp", "template <> struct Vec<int> { int x; };\nstruct Ok { int y; };");
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::SyntaxError);
        assert_eq!(parsed.file.declarations.len(), 1);
    }

    #[test]
    fn test_function_pointer_member() {
        let record = record("struct S { void (*callback)(int, float); int after; };");
        assert_eq!(record.fields[0].name, "callback");
        assert_eq!(record.fields[0].ty.pointer_depth, 1);
        assert_eq!(record.fields[1].name, "after");
    }
}
