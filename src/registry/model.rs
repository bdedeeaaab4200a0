// Wed Oct 14 2026 - Alex

use super::symbol::TypeId;
use crate::diagnostic::{Diagnostic, DiagnosticKind, SourceLocation};
use crate::eval::{ResolvedValue, ScalarType};
use crate::parser::{Access, Expr, FunctionSignature, RecordKind, RefKind, TemplateParam};
use crate::structure::RecordLayout;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Enum,
    Struct,
    Class,
    Union,
}

impl From<RecordKind> for TypeKind {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Struct => TypeKind::Struct,
            RecordKind::Class => TypeKind::Class,
            RecordKind::Union => TypeKind::Union,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Enum => write!(f, "enum"),
            TypeKind::Struct => write!(f, "struct"),
            TypeKind::Class => write!(f, "class"),
            TypeKind::Union => write!(f, "union"),
        }
    }
}

/// What a type reference ended up naming.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeTarget {
    Scalar {
        scalar: ScalarType,
    },
    Declared {
        #[serde(skip)]
        id: TypeId,
        qualified: String,
    },
    /// A container from the ABI table (`DynArray`, `HashMap`, ...).
    Container {
        name: String,
    },
    TemplateParam {
        name: String,
    },
    /// Named but defined nowhere in the batch.
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedArg {
    Type(ResolvedTypeRef),
    Value(ResolvedValue),
    /// Depends on an enclosing template parameter; kept as written.
    Dependent(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTypeRef {
    /// The reference as written, normalized.
    pub spelling: String,
    pub target: TypeTarget,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ResolvedArg>,
    pub pointer_depth: u8,
    pub reference: RefKind,
    pub is_const: bool,
}

impl ResolvedTypeRef {
    pub fn is_indirect(&self) -> bool {
        self.pointer_depth > 0 || self.reference != RefKind::None
    }

    pub fn declared(&self) -> Option<TypeId> {
        match self.target {
            TypeTarget::Declared { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelling)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayDim {
    Fixed(u64),
    /// Length depends on a template parameter; evaluated per instantiation.
    Dependent(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    pub name: String,
    pub ty: ResolvedTypeRef,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub array: Vec<ArrayDim>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_width: Option<u32>,
    /// Offset from the trailing annotation comment.
    pub explicit_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_end: Option<u64>,
    /// Offset the model records: the annotation when authoritative,
    /// otherwise the inferred one. Filled in by layout.
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub access: Access,
    pub is_static: bool,
    pub is_mutable: bool,
    /// Default member initializer, as written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub location: SourceLocation,
}

impl ResolvedField {
    /// Number of elements across all array dimensions, when known.
    pub fn element_count(&self) -> Option<u64> {
        self.array.iter().try_fold(1u64, |count, dim| match dim {
            ArrayDim::Fixed(n) => count.checked_mul(*n),
            ArrayDim::Dependent(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEnumerator {
    pub name: String,
    pub value: ResolvedValue,
    /// Initialized from another enumerator rather than a literal.
    pub alias: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConstant {
    pub name: String,
    pub ty: ResolvedTypeRef,
    /// `None` when the value depends on a template parameter.
    pub value: Option<ResolvedValue>,
    pub expression: String,
    pub is_constexpr: bool,
    pub access: Access,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBase {
    pub ty: ResolvedTypeRef,
    pub access: Access,
    pub is_virtual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedType {
    #[serde(skip)]
    pub id: TypeId,
    pub name: String,
    pub qualified: String,
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub namespace: Vec<String>,
    /// Qualified name of the enclosing record, for nested types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub template_params: Vec<TemplateParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying: Option<ResolvedTypeRef>,
    /// Storage of an enum's values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<ScalarType>,
    pub scoped: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enumerators: Vec<ResolvedEnumerator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<ResolvedBase>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ResolvedField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<ResolvedConstant>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionSignature>,
    pub is_final: bool,
    /// Declares at least one dispatched function itself.
    pub declares_virtual: bool,
    pub location: SourceLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<RecordLayout>,
}

impl ResolvedType {
    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn enumerator(&self, name: &str) -> Option<&ResolvedEnumerator> {
        self.enumerators.iter().find(|e| e.name == name)
    }

    pub fn constant(&self, name: &str) -> Option<&ResolvedConstant> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn size(&self) -> Option<u64> {
        self.layout.as_ref().and_then(|layout| layout.size)
    }
}

/// Everything one analysis run produced for a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotModel {
    pub id: String,
    pub files: Vec<String>,
    pub types: IndexMap<String, ResolvedType>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SnapshotModel {
    pub fn get(&self, qualified: &str) -> Option<&ResolvedType> {
        self.types.get(qualified)
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
