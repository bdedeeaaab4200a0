// Mon Oct 12 2026 - Alex

use crate::diagnostic::Span;
use bitflags::bitflags;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Written with a leading `::`.
    pub global: bool,
    pub segments: Vec<String>,
}

impl QualifiedName {
    pub fn new(segments: Vec<String>) -> Self {
        Self { global: false, segments }
    }

    pub fn single(name: &str) -> Self {
        Self::new(vec![name.to_string()])
    }

    pub fn parse(text: &str) -> Self {
        let global = text.starts_with("::");
        let segments = text
            .trim_start_matches("::")
            .split("::")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { global, segments }
    }

    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_simple(&self) -> bool {
        !self.global && self.segments.len() == 1
    }

    pub fn joined(&self) -> String {
        self.segments.join("::")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            write!(f, "::")?;
        }
        write!(f, "{}", self.segments.join("::"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    #[default]
    None,
    LValue,
    RValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateArg {
    Type(TypeRef),
    Value(Expr),
}

impl fmt::Display for TemplateArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateArg::Type(ty) => write!(f, "{}", ty),
            TemplateArg::Value(expr) => write!(f, "{}", expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeName {
    Plain(QualifiedName),
    Instantiation {
        template: QualifiedName,
        args: Vec<TemplateArg>,
    },
}

/// A type as written at a use site: `const game::Object*`, `DynArray<Handle<T>>&`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: TypeName,
    pub pointer_depth: u8,
    pub reference: RefKind,
    pub is_const: bool,
    pub is_volatile: bool,
}

impl TypeRef {
    pub fn plain(name: QualifiedName) -> Self {
        Self {
            name: TypeName::Plain(name),
            pointer_depth: 0,
            reference: RefKind::None,
            is_const: false,
            is_volatile: false,
        }
    }

    pub fn named(name: &str) -> Self {
        Self::plain(QualifiedName::single(name))
    }

    pub fn base_name(&self) -> &QualifiedName {
        match &self.name {
            TypeName::Plain(name) => name,
            TypeName::Instantiation { template, .. } => template,
        }
    }

    pub fn args(&self) -> &[TemplateArg] {
        match &self.name {
            TypeName::Plain(_) => &[],
            TypeName::Instantiation { args, .. } => args,
        }
    }

    pub fn is_indirect(&self) -> bool {
        self.pointer_depth > 0 || self.reference != RefKind::None
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        match &self.name {
            TypeName::Plain(name) => write!(f, "{}", name)?,
            TypeName::Instantiation { template, args } => {
                write!(f, "{}<{}>", template, args.iter().join(", "))?;
            }
        }
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        match self.reference {
            RefKind::None => Ok(()),
            RefKind::LValue => write!(f, "&"),
            RefKind::RValue => write!(f, "&&"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Plus,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Int {
        value: u64,
        unsigned: bool,
        long: bool,
        decimal: bool,
    },
    Float(f64),
    Bool(bool),
    Str(String),
    Name(QualifiedName),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Cast {
        target: TypeRef,
        operand: Box<Expr>,
    },
    Call {
        callee: QualifiedName,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn as_name(&self) -> Option<&QualifiedName> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Visits every qualified name referenced by the expression.
    pub fn for_each_name(&self, visit: &mut dyn FnMut(&QualifiedName)) {
        match &self.kind {
            ExprKind::Name(name) => visit(name),
            ExprKind::Unary { operand, .. } | ExprKind::Cast { operand, .. } => operand.for_each_name(visit),
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.for_each_name(visit);
                rhs.for_each_name(visit);
            }
            ExprKind::Call { args, .. } => args.iter().for_each(|arg| arg.for_each_name(visit)),
            _ => {}
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Int { value, decimal, .. } => {
                if *decimal {
                    write!(f, "{}", value)
                } else {
                    write!(f, "0x{:X}", value)
                }
            }
            ExprKind::Float(value) => write!(f, "{}", value),
            ExprKind::Bool(value) => write!(f, "{}", value),
            ExprKind::Str(text) => write!(f, "{:?}", text),
            ExprKind::Name(name) => write!(f, "{}", name),
            ExprKind::Unary { op, operand } => {
                let symbol = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::BitNot => "~",
                    UnaryOp::Not => "!",
                };
                write!(f, "{}{}", symbol, operand)
            }
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            ExprKind::Cast { target, operand } => write!(f, "static_cast<{}>({})", target, operand),
            ExprKind::Call { callee, args } => write!(f, "{}({})", callee, args.iter().join(", ")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Struct,
    Class,
    Union,
}

impl RecordKind {
    pub fn default_access(self) -> Access {
        match self {
            RecordKind::Class => Access::Private,
            RecordKind::Struct | RecordKind::Union => Access::Public,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Struct => write!(f, "struct"),
            RecordKind::Class => write!(f, "class"),
            RecordKind::Union => write!(f, "union"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseSpecifier {
    pub ty: TypeRef,
    pub access: Option<Access>,
    pub is_virtual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateParamKind {
    Type,
    Value(TypeRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParam {
    pub name: String,
    pub kind: TemplateParamKind,
    pub default: Option<TemplateArg>,
}

/// Offset recovered from a trailing `// 4B` or `// 0x4B - 0x30` comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetAnnotation {
    pub offset: u64,
    pub end: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub array: Vec<Expr>,
    pub bit_width: Option<Expr>,
    pub default: Option<Expr>,
    pub access: Access,
    pub is_static: bool,
    pub is_mutable: bool,
    pub annotation: Option<OffsetAnnotation>,
    pub comment: Option<String>,
    pub span: Span,
}

/// `static constexpr` (or `static const`) member with an initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantDecl {
    pub name: String,
    pub ty: TypeRef,
    pub value: Expr,
    pub is_constexpr: bool,
    pub access: Access,
    pub span: Span,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FunctionFlags: u16 {
        const STATIC = 1 << 0;
        const VIRTUAL = 1 << 1;
        const PURE_VIRTUAL = 1 << 2;
        const OVERRIDE = 1 << 3;
        const OPERATOR = 1 << 4;
        const CONSTRUCTOR = 1 << 5;
        const DESTRUCTOR = 1 << 6;
        const CONST = 1 << 7;
        const FINAL = 1 << 8;
        const DEFAULTED = 1 << 9;
        const DELETED = 1 << 10;
    }
}

impl FunctionFlags {
    /// `override` and `final` imply the function lives in a vtable.
    pub fn is_dispatched(self) -> bool {
        self.intersects(Self::VIRTUAL | Self::PURE_VIRTUAL | Self::OVERRIDE | Self::FINAL)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub ty: TypeRef,
    pub name: Option<String>,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeRef>,
    pub flags: FunctionFlags,
    pub access: Access,
    /// Trailing annotation, usually the vtable slot offset.
    pub annotation: Option<u64>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumeratorDecl {
    pub name: String,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub scoped: bool,
    pub underlying: Option<TypeRef>,
    pub enumerators: Vec<EnumeratorDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDecl {
    pub kind: RecordKind,
    pub name: String,
    pub template_params: Vec<TemplateParam>,
    pub bases: Vec<BaseSpecifier>,
    pub fields: Vec<FieldDecl>,
    pub constants: Vec<ConstantDecl>,
    pub functions: Vec<FunctionSignature>,
    pub nested: Vec<Declaration>,
    pub is_final: bool,
    pub span: Span,
}

impl RecordDecl {
    pub fn new(kind: RecordKind, name: String, span: Span) -> Self {
        Self {
            kind,
            name,
            template_params: Vec::new(),
            bases: Vec::new(),
            fields: Vec::new(),
            constants: Vec::new(),
            functions: Vec::new(),
            nested: Vec::new(),
            is_final: false,
            span,
        }
    }

    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }

    pub fn declares_virtual(&self) -> bool {
        self.functions.iter().any(|f| f.flags.is_dispatched())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    /// Empty for an anonymous namespace.
    pub path: Vec<String>,
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Declaration {
    Namespace(NamespaceDecl),
    Enum(EnumDecl),
    Record(RecordDecl),
}

impl Declaration {
    pub fn name(&self) -> String {
        match self {
            Declaration::Namespace(ns) => ns.path.join("::"),
            Declaration::Enum(decl) => decl.name.clone(),
            Declaration::Record(decl) => decl.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_parse_and_display() {
        let name = QualifiedName::parse("::game::world::worldNode");
        assert!(name.global);
        assert_eq!(name.segments, vec!["game", "world", "worldNode"]);
        assert_eq!(name.to_string(), "::game::world::worldNode");
        assert_eq!(name.last(), "worldNode");
        assert!(!name.is_simple());
    }

    #[test]
    fn test_type_ref_display() {
        let inner = TypeRef {
            pointer_depth: 1,
            ..TypeRef::plain(QualifiedName::parse("game::Object"))
        };
        let ty = TypeRef {
            name: TypeName::Instantiation {
                template: QualifiedName::single("Handle"),
                args: vec![TemplateArg::Type(inner)],
            },
            pointer_depth: 0,
            reference: RefKind::LValue,
            is_const: true,
            is_volatile: false,
        };
        assert_eq!(ty.to_string(), "const Handle<game::Object*>&");
    }

    #[test]
    fn test_function_flags_dispatch() {
        assert!(FunctionFlags::OVERRIDE.is_dispatched());
        assert!((FunctionFlags::VIRTUAL | FunctionFlags::PURE_VIRTUAL).is_dispatched());
        assert!(!(FunctionFlags::STATIC | FunctionFlags::CONSTRUCTOR).is_dispatched());
    }
}
