// Wed Oct 14 2026 - Alex

use super::builder::{TypeBody, TypeEntry};
use super::model::{
    ArrayDim, ResolvedArg, ResolvedBase, ResolvedConstant, ResolvedEnumerator, ResolvedField, ResolvedType,
    ResolvedTypeRef, TypeKind, TypeTarget,
};
use super::snapshot::Snapshot;
use super::symbol::{ScopeHit, SymbolRef, TypeId};
use crate::config::AbiConfig;
use crate::diagnostic::{Diagnostic, DiagnosticKind, SourceLocation, Span};
use crate::eval::{coerce, CastTarget, EvalIssue, Evaluator, IntType, IntValue, Lookup, ResolvedValue, ScalarType, ValueScope};
use crate::parser::{EnumDecl, Expr, ExprKind, RecordDecl, TemplateArg, TemplateParam, TemplateParamKind, TypeRef};
use ahash::AHashMap;
use log::trace;
use parking_lot::Mutex;
use std::cell::RefCell;

const DEPENDENT: &str = "depends on a template parameter";
const NOT_ARITHMETIC: &str = "is not an arithmetic constant";

/// Phase two of the registry. Shared by all resolver threads; each call to
/// `resolve` is the owner pass of one type and the only place that type's
/// own diagnostics come from.
pub struct Resolver<'s> {
    snapshot: &'s Snapshot,
    abi: &'s AbiConfig,
    enum_memo: Mutex<AHashMap<TypeId, Vec<ResolvedValue>>>,
    constant_memo: Mutex<AHashMap<(TypeId, usize), Result<ResolvedValue, &'static str>>>,
}

impl<'s> Resolver<'s> {
    pub fn new(snapshot: &'s Snapshot, abi: &'s AbiConfig) -> Self {
        Self {
            snapshot,
            abi,
            enum_memo: Mutex::new(AHashMap::new()),
            constant_memo: Mutex::new(AHashMap::new()),
        }
    }

    pub fn snapshot(&self) -> &'s Snapshot {
        self.snapshot
    }

    /// Resolves one type: its references, values and members.
    pub fn resolve(&self, id: TypeId) -> (ResolvedType, Vec<Diagnostic>) {
        let task = Task {
            resolver: self,
            frames: RefCell::new(Vec::new()),
        };
        let result = task.resolve_type(id);
        trace!("resolved {} with {} diagnostics", result.0.qualified, result.1.len());
        result
    }

    /// Storage type of an enum, `int` unless a known integral type is given.
    pub fn enum_storage(&self, id: TypeId) -> ScalarType {
        self.snapshot
            .get(id)
            .as_enum()
            .and_then(|decl| decl.underlying.as_ref())
            .and_then(|ty| ScalarType::from_name(&ty.base_name().joined()))
            .filter(|scalar| scalar.is_integer() || *scalar == ScalarType::Bool)
            .unwrap_or(ScalarType::I32)
    }

    fn enum_target(&self, id: TypeId) -> CastTarget {
        CastTarget::from_scalar(self.enum_storage(id)).unwrap_or(CastTarget::Int(IntType::INT))
    }

    /// Template parameters visible inside `id`, outermost record first.
    fn visible_params(&self, id: TypeId) -> Vec<TemplateParam> {
        let mut chain = vec![id];
        while let Some(parent) = self.snapshot.parent_of(chain[chain.len() - 1]) {
            chain.push(parent);
        }
        chain
            .iter()
            .rev()
            .filter_map(|id| self.snapshot.get(*id).as_record())
            .flat_map(|record| record.template_params.iter().cloned())
            .collect()
    }

    fn encloses(&self, outer: TypeId, mut inner: TypeId) -> bool {
        loop {
            if inner == outer {
                return true;
            }
            match self.snapshot.parent_of(inner) {
                Some(parent) => inner = parent,
                None => return false,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKey {
    Enum(TypeId),
    Constant(TypeId, usize),
}

/// A value computation in progress on this task.
struct Frame {
    key: FrameKey,
    /// Enumerator values computed so far.
    values: Vec<ResolvedValue>,
    /// Lowest frame a cycle found below this one runs back to.
    cycle_head: Option<usize>,
    /// Depends on a cycle; never memoized.
    tainted: bool,
}

impl Frame {
    fn new(key: FrameKey) -> Self {
        Self {
            key,
            values: Vec::new(),
            cycle_head: None,
            tainted: false,
        }
    }
}

struct Outcome<T> {
    value: T,
    head: Option<usize>,
    tainted: bool,
}

struct Task<'r, 's> {
    resolver: &'r Resolver<'s>,
    frames: RefCell<Vec<Frame>>,
}

struct TypeContext<'c> {
    scope: Vec<String>,
    params: &'c [TemplateParam],
    owner: TypeId,
    file: &'c str,
    span: Span,
}

impl<'c> TypeContext<'c> {
    fn at(&self, span: Span) -> TypeContext<'c> {
        TypeContext {
            scope: self.scope.clone(),
            params: self.params,
            owner: self.owner,
            file: self.file,
            span,
        }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file, self.span)
    }
}

impl<'r, 's> Task<'r, 's> {
    fn snapshot(&self) -> &'s Snapshot {
        self.resolver.snapshot
    }

    fn resolve_type(&self, id: TypeId) -> (ResolvedType, Vec<Diagnostic>) {
        let snapshot = self.snapshot();
        let entry = snapshot.get(id);
        let mut diagnostics = Vec::new();
        let mut resolved = ResolvedType {
            id,
            name: entry.name.clone(),
            qualified: entry.qualified.clone(),
            kind: TypeKind::Enum,
            namespace: entry.namespace.clone(),
            parent: snapshot.parent_of(id).map(|parent| snapshot.get(parent).qualified.clone()),
            template_params: Vec::new(),
            underlying: None,
            storage: None,
            scoped: false,
            enumerators: Vec::new(),
            bases: Vec::new(),
            fields: Vec::new(),
            constants: Vec::new(),
            functions: Vec::new(),
            is_final: false,
            declares_virtual: false,
            location: entry.location(),
            layout: None,
        };
        match &entry.body {
            TypeBody::Enum(decl) => self.fill_enum(id, entry, decl, &mut resolved, &mut diagnostics),
            TypeBody::Record(record) => self.fill_record(id, entry, record, &mut resolved, &mut diagnostics),
        }
        (resolved, diagnostics)
    }

    fn fill_enum(&self, id: TypeId, entry: &TypeEntry, decl: &EnumDecl, out: &mut ResolvedType, diagnostics: &mut Vec<Diagnostic>) {
        let snapshot = self.snapshot();
        out.kind = TypeKind::Enum;
        out.scoped = decl.scoped;
        out.storage = Some(self.resolver.enum_storage(id));

        if let Some(underlying) = &decl.underlying {
            let cx = TypeContext {
                scope: entry.enclosing_scope(),
                params: &[],
                owner: id,
                file: &entry.file,
                span: decl.span,
            };
            let resolved = self.resolve_ref(underlying, &cx, diagnostics);
            let integral = matches!(resolved.target, TypeTarget::Scalar { scalar } if scalar.is_integer() || scalar == ScalarType::Bool);
            if !integral && !resolved.is_indirect() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvedSymbol,
                    format!("underlying type `{}` of `{}` is not a known integral type; using int", underlying, entry.qualified),
                    cx.location(),
                ));
            }
            out.underlying = Some(resolved);
        }

        let mut issues = Vec::new();
        let outcome = self.compute_enum(id, decl.enumerators.len().saturating_sub(1), Some(&mut issues));
        diagnostics.extend(issues.into_iter().map(|issue| issue_diagnostic(&entry.file, issue)));

        let scope = entry.scope();
        out.enumerators = decl
            .enumerators
            .iter()
            .zip(outcome.value)
            .map(|(enumerator, value)| ResolvedEnumerator {
                name: enumerator.name.clone(),
                value,
                alias: enumerator
                    .value
                    .as_ref()
                    .and_then(Expr::as_name)
                    .map_or(false, |name| {
                        matches!(snapshot.lookup(name, &scope).symbol(), Some(SymbolRef::Enumerator { .. }))
                    }),
                expression: enumerator.value.as_ref().map(|expr| expr.to_string()),
                location: SourceLocation::new(&entry.file, enumerator.span),
            })
            .collect();
    }

    fn fill_record(&self, id: TypeId, entry: &TypeEntry, record: &RecordDecl, out: &mut ResolvedType, diagnostics: &mut Vec<Diagnostic>) {
        out.kind = record.kind.into();
        out.is_final = record.is_final;
        out.declares_virtual = record.declares_virtual();
        out.template_params = record.template_params.clone();
        out.functions = record.functions.clone();

        let params = self.resolver.visible_params(id);
        let cx = TypeContext {
            scope: entry.scope(),
            params: &params,
            owner: id,
            file: &entry.file,
            span: record.span,
        };

        out.bases = record
            .bases
            .iter()
            .map(|base| ResolvedBase {
                ty: self.resolve_ref(&base.ty, &cx, diagnostics),
                access: base.access.unwrap_or_else(|| record.kind.default_access()),
                is_virtual: base.is_virtual,
            })
            .collect();

        for field in &record.fields {
            let cx = cx.at(field.span);
            let ty = self.resolve_ref(&field.ty, &cx, diagnostics);
            let array = field
                .array
                .iter()
                .map(|dim| {
                    if references_params(dim, &params) {
                        ArrayDim::Dependent(dim.clone())
                    } else {
                        ArrayDim::Fixed(self.evaluate_count(dim, &cx, "array length", diagnostics))
                    }
                })
                .collect();
            let bit_width = field
                .bit_width
                .as_ref()
                .filter(|width| !references_params(width, &params))
                .map(|width| self.evaluate_count(width, &cx, "bit-field width", diagnostics) as u32);
            out.fields.push(ResolvedField {
                name: field.name.clone(),
                ty,
                array,
                bit_width,
                explicit_offset: field.annotation.map(|a| a.offset),
                annotation_end: field.annotation.and_then(|a| a.end),
                offset: None,
                comment: field.comment.clone(),
                access: field.access,
                is_static: field.is_static,
                is_mutable: field.is_mutable,
                default: field.default.as_ref().map(|expr| expr.to_string()),
                location: SourceLocation::new(&entry.file, field.span),
            });
        }

        for (index, constant) in record.constants.iter().enumerate() {
            let cx = cx.at(constant.span);
            let ty = self.resolve_ref(&constant.ty, &cx, diagnostics);
            let mut issues = Vec::new();
            let outcome = self.compute_constant(id, index, Some(&mut issues));
            diagnostics.extend(issues.into_iter().map(|issue| issue_diagnostic(&entry.file, issue)));
            out.constants.push(ResolvedConstant {
                name: constant.name.clone(),
                ty,
                value: outcome.value.ok(),
                expression: constant.value.to_string(),
                is_constexpr: constant.is_constexpr,
                access: constant.access,
                location: SourceLocation::new(&entry.file, constant.span),
            });
        }
    }

    /// Evaluates an array length or bit width, which must be a
    /// non-negative integer.
    fn evaluate_count(&self, expr: &Expr, cx: &TypeContext, what: &str, diagnostics: &mut Vec<Diagnostic>) -> u64 {
        let scope = ExprScope {
            task: self,
            scope: cx.scope.clone(),
        };
        let mut evaluator = Evaluator::new(&scope);
        let value = evaluator.evaluate(expr);
        diagnostics.extend(evaluator.into_issues().into_iter().map(|issue| issue_diagnostic(cx.file, issue)));
        match value.as_i128() {
            Some(n) if n >= 0 && n <= u64::MAX as i128 => n as u64,
            _ => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidExpression,
                    format!("{} `{}` is not a non-negative integer", what, expr),
                    SourceLocation::new(cx.file, expr.span),
                ));
                0
            }
        }
    }

    fn resolve_ref(&self, ty: &TypeRef, cx: &TypeContext, diagnostics: &mut Vec<Diagnostic>) -> ResolvedTypeRef {
        let snapshot = self.snapshot();
        let name = ty.base_name();
        let joined = name.joined();
        let target = if name.is_simple() && cx.params.iter().any(|p| p.name == joined) {
            TypeTarget::TemplateParam { name: joined }
        } else if let Some(scalar) = ScalarType::from_name(&joined) {
            TypeTarget::Scalar { scalar }
        } else if let Some(id) = snapshot.lookup_type(name, &cx.scope) {
            TypeTarget::Declared {
                id,
                qualified: snapshot.get(id).qualified.clone(),
            }
        } else if self.resolver.abi.container(name.last()).is_some() {
            TypeTarget::Container {
                name: name.last().to_string(),
            }
        } else {
            TypeTarget::Opaque
        };

        self.check_arity(ty, &target, cx, diagnostics);
        let args = self.resolve_args(ty.args(), &target, cx, diagnostics);
        ResolvedTypeRef {
            spelling: ty.to_string(),
            target,
            args,
            pointer_depth: ty.pointer_depth,
            reference: ty.reference,
            is_const: ty.is_const,
        }
    }

    fn check_arity(&self, ty: &TypeRef, target: &TypeTarget, cx: &TypeContext, diagnostics: &mut Vec<Diagnostic>) {
        let given = ty.args().len();
        let (min, max) = match target {
            TypeTarget::Declared { id, .. } => match self.snapshot().get(*id).as_record() {
                Some(record) if record.is_template() => {
                    // Inside its own body a template may name itself bare.
                    if given == 0 && self.resolver.encloses(*id, cx.owner) {
                        return;
                    }
                    let required = record.template_params.iter().filter(|p| p.default.is_none()).count();
                    (required, record.template_params.len())
                }
                _ => (0, 0),
            },
            TypeTarget::Container { name } => match self.resolver.abi.container(name).and_then(|c| c.arity) {
                Some(arity) => (arity, arity),
                None => return,
            },
            _ => return,
        };
        if given >= min && given <= max {
            return;
        }
        let message = if max == 0 {
            format!("`{}` is not a template but is given {} argument(s)", ty.base_name(), given)
        } else if min == max {
            format!("`{}` expects {} template argument(s), got {}", ty.base_name(), max, given)
        } else {
            format!("`{}` expects {} to {} template arguments, got {}", ty.base_name(), min, max, given)
        };
        diagnostics.push(Diagnostic::new(DiagnosticKind::TemplateArity, message, cx.location()));
    }

    fn resolve_args(&self, args: &[TemplateArg], target: &TypeTarget, cx: &TypeContext, diagnostics: &mut Vec<Diagnostic>) -> Vec<ResolvedArg> {
        let params: &[TemplateParam] = match target {
            TypeTarget::Declared { id, .. } => self
                .snapshot()
                .get(*id)
                .as_record()
                .map_or(&[], |record| record.template_params.as_slice()),
            _ => &[],
        };
        args.iter()
            .enumerate()
            .map(|(index, arg)| {
                let wants_value = params
                    .get(index)
                    .map_or(false, |p| matches!(p.kind, TemplateParamKind::Value(_)));
                match arg {
                    TemplateArg::Value(expr) => self.value_arg(expr, cx, diagnostics),
                    TemplateArg::Type(ty) if wants_value || self.names_a_value(ty, cx) => {
                        let expr = Expr::new(ExprKind::Name(ty.base_name().clone()), cx.span);
                        self.value_arg(&expr, cx, diagnostics)
                    }
                    TemplateArg::Type(ty) => ResolvedArg::Type(self.resolve_ref(ty, cx, diagnostics)),
                }
            })
            .collect()
    }

    /// A bare name in argument position that refers to a constant or an
    /// enumerator rather than a type.
    fn names_a_value(&self, ty: &TypeRef, cx: &TypeContext) -> bool {
        if ty.is_indirect() || !ty.args().is_empty() || ty.is_const {
            return false;
        }
        matches!(
            self.snapshot().lookup(ty.base_name(), &cx.scope).symbol(),
            Some(SymbolRef::Enumerator { .. }) | Some(SymbolRef::Constant { .. })
        )
    }

    fn value_arg(&self, expr: &Expr, cx: &TypeContext, diagnostics: &mut Vec<Diagnostic>) -> ResolvedArg {
        if references_params(expr, cx.params) {
            return ResolvedArg::Dependent(expr.to_string());
        }
        let scope = ExprScope {
            task: self,
            scope: cx.scope.clone(),
        };
        let mut evaluator = Evaluator::new(&scope);
        let value = evaluator.evaluate(expr);
        diagnostics.extend(evaluator.into_issues().into_iter().map(|issue| issue_diagnostic(cx.file, issue)));
        ResolvedArg::Value(value)
    }

    fn symbol_value(&self, symbol: SymbolRef) -> Lookup {
        match symbol {
            SymbolRef::Enumerator { owner, index } => self.enumerator_value(owner, index),
            SymbolRef::Constant { owner, index } => self.constant_value(owner, index),
            SymbolRef::Type(_) => Lookup::NotConstant("is a type, not a constant".to_string()),
            SymbolRef::Field { .. } => Lookup::NotConstant("is a data member, not a constant".to_string()),
        }
    }

    fn enumerator_value(&self, owner: TypeId, index: usize) -> Lookup {
        let memoized = self
            .resolver
            .enum_memo
            .lock()
            .get(&owner)
            .and_then(|values| values.get(index).copied());
        if let Some(value) = memoized {
            return Lookup::Value(value);
        }
        if let Some(lookup) = self.on_stack(FrameKey::Enum(owner), Some(index)) {
            return lookup;
        }
        let outcome = self.compute_enum(owner, index, None);
        let value = outcome.value.get(index).copied().unwrap_or_else(ResolvedValue::zero);
        self.settle(value, outcome.head, outcome.tainted)
    }

    fn constant_value(&self, owner: TypeId, index: usize) -> Lookup {
        let memoized = self.resolver.constant_memo.lock().get(&(owner, index)).copied();
        match memoized {
            Some(Ok(value)) => return Lookup::Value(value),
            Some(Err(reason)) => return Lookup::NotConstant(reason.to_string()),
            None => {}
        }
        if let Some(lookup) = self.on_stack(FrameKey::Constant(owner, index), None) {
            return lookup;
        }
        let outcome = self.compute_constant(owner, index, None);
        match outcome.value {
            Ok(value) => self.settle(value, outcome.head, outcome.tainted),
            Err(reason) => Lookup::NotConstant(reason.to_string()),
        }
    }

    /// Handles a lookup of something this task is already computing: either
    /// an enumerator before the cursor, a later sibling, or a cycle.
    fn on_stack(&self, key: FrameKey, index: Option<usize>) -> Option<Lookup> {
        let mut frames = self.frames.borrow_mut();
        let head = frames.iter().position(|frame| frame.key == key)?;
        let top = frames.len() - 1;
        if let Some(index) = index {
            let cursor = frames[head].values.len();
            if index < cursor {
                return Some(Lookup::Value(frames[head].values[index]));
            }
            if head == top && index > cursor {
                return Some(Lookup::NotConstant("is declared after its use".to_string()));
            }
        }
        for frame in frames[head..].iter_mut() {
            frame.tainted = true;
        }
        if head == top {
            return Some(Lookup::Cyclic {
                value: ResolvedValue::zero(),
                closes_here: true,
            });
        }
        let current = &mut frames[top].cycle_head;
        *current = Some(current.map_or(head, |h| h.min(head)));
        Some(Lookup::Cyclic {
            value: ResolvedValue::zero(),
            closes_here: false,
        })
    }

    /// Folds the outcome of a nested computation into the current frame.
    fn settle(&self, value: ResolvedValue, head: Option<usize>, tainted: bool) -> Lookup {
        let mut frames = self.frames.borrow_mut();
        let current = match frames.len().checked_sub(1) {
            Some(current) => current,
            None => return Lookup::Value(value),
        };
        let frame = &mut frames[current];
        if tainted {
            frame.tainted = true;
        }
        match head {
            Some(h) if h == current => Lookup::Cyclic {
                value,
                closes_here: true,
            },
            Some(h) => {
                frame.cycle_head = Some(frame.cycle_head.map_or(h, |c| c.min(h)));
                Lookup::Cyclic {
                    value,
                    closes_here: false,
                }
            }
            None => Lookup::Value(value),
        }
    }

    fn push_frame(&self, key: FrameKey) -> usize {
        let mut frames = self.frames.borrow_mut();
        frames.push(Frame::new(key));
        frames.len() - 1
    }

    fn pop_frame(&self, key: FrameKey, depth: usize) -> Frame {
        let mut frames = self.frames.borrow_mut();
        frames.truncate(depth + 1);
        let mut frame = frames.pop().unwrap_or_else(|| Frame::new(key));
        frame.cycle_head = frame.cycle_head.filter(|head| *head < depth);
        frame
    }

    /// Computes enumerator values `0..=upto` of `owner`. Issues are only
    /// collected on the owner pass.
    fn compute_enum(&self, owner: TypeId, upto: usize, mut report: Option<&mut Vec<EvalIssue>>) -> Outcome<Vec<ResolvedValue>> {
        let entry = self.snapshot().get(owner);
        let decl = match entry.as_enum() {
            Some(decl) => decl,
            None => {
                return Outcome {
                    value: Vec::new(),
                    head: None,
                    tainted: false,
                }
            }
        };
        let target = self.resolver.enum_target(owner);
        let scope = ExprScope {
            task: self,
            scope: entry.scope(),
        };

        let key = FrameKey::Enum(owner);
        let depth = self.push_frame(key);
        let mut previous: Option<ResolvedValue> = None;
        for enumerator in decl.enumerators.iter().take(upto + 1) {
            let value = match &enumerator.value {
                Some(expr) => {
                    let mut evaluator = Evaluator::new(&scope);
                    let value = evaluator.evaluate(expr);
                    if let Some(issues) = report.as_deref_mut() {
                        issues.extend(evaluator.into_issues());
                    }
                    coerce(value, target)
                }
                None => {
                    let next = previous.and_then(|p| p.as_i128()).map_or(0, |p| p + 1);
                    coerce(ResolvedValue::Int(IntValue::new(next, IntType::LONG_LONG)), target)
                }
            };
            if let Some(frame) = self.frames.borrow_mut().get_mut(depth) {
                frame.values.push(value);
            }
            previous = Some(value);
        }
        let frame = self.pop_frame(key, depth);

        if !frame.tainted {
            let mut memo = self.resolver.enum_memo.lock();
            let slot = memo.entry(owner).or_default();
            if frame.values.len() > slot.len() {
                *slot = frame.values.clone();
            }
        }
        Outcome {
            value: frame.values,
            head: frame.cycle_head,
            tainted: frame.tainted,
        }
    }

    fn compute_constant(&self, owner: TypeId, index: usize, report: Option<&mut Vec<EvalIssue>>) -> Outcome<Result<ResolvedValue, &'static str>> {
        let entry = self.snapshot().get(owner);
        let constant = match entry.as_record().and_then(|record| record.constants.get(index)) {
            Some(constant) => constant,
            None => {
                return Outcome {
                    value: Err(NOT_ARITHMETIC),
                    head: None,
                    tainted: false,
                }
            }
        };

        let skipped = if matches!(constant.value.kind, ExprKind::Str(_)) {
            Some(NOT_ARITHMETIC)
        } else if references_params(&constant.value, &self.resolver.visible_params(owner)) {
            Some(DEPENDENT)
        } else {
            None
        };
        if let Some(reason) = skipped {
            self.resolver.constant_memo.lock().insert((owner, index), Err(reason));
            return Outcome {
                value: Err(reason),
                head: None,
                tainted: false,
            };
        }

        let scope = ExprScope {
            task: self,
            scope: entry.scope(),
        };
        let key = FrameKey::Constant(owner, index);
        let depth = self.push_frame(key);
        let mut evaluator = Evaluator::new(&scope);
        let raw = evaluator.evaluate(&constant.value);
        if let Some(issues) = report {
            issues.extend(evaluator.into_issues());
        }
        let value = match scope.cast_target(&constant.ty) {
            Ok(target) => coerce(raw, target),
            Err(_) => raw,
        };
        let frame = self.pop_frame(key, depth);

        if !frame.tainted {
            self.resolver.constant_memo.lock().insert((owner, index), Ok(value));
        }
        Outcome {
            value: Ok(value),
            head: frame.cycle_head,
            tainted: frame.tainted,
        }
    }
}

/// Name environment of an expression written inside `scope`.
struct ExprScope<'t, 'r, 's> {
    task: &'t Task<'r, 's>,
    scope: Vec<String>,
}

impl ValueScope for ExprScope<'_, '_, '_> {
    fn lookup(&self, name: &crate::parser::QualifiedName) -> Lookup {
        let snapshot = self.task.snapshot();
        match snapshot.lookup(name, &self.scope) {
            ScopeHit::Found(symbol) => self.task.symbol_value(symbol),
            ScopeHit::Ambiguous { first, candidates } => match self.task.symbol_value(first) {
                Lookup::Value(value) => Lookup::Ambiguous {
                    value,
                    chosen: snapshot.describe(first),
                    candidates,
                },
                other => other,
            },
            ScopeHit::Missing => Lookup::Unresolved,
        }
    }

    fn cast_target(&self, ty: &TypeRef) -> Result<CastTarget, bool> {
        if ty.is_indirect() {
            return Ok(CastTarget::Int(IntType::ULONG_LONG));
        }
        if let Some(scalar) = ScalarType::from_name(&ty.base_name().joined()) {
            return CastTarget::from_scalar(scalar).ok_or(false);
        }
        let snapshot = self.task.snapshot();
        match snapshot.lookup_type(ty.base_name(), &self.scope) {
            Some(id) if snapshot.get(id).as_enum().is_some() => Ok(self.task.resolver.enum_target(id)),
            Some(_) => Err(false),
            None => Err(true),
        }
    }
}

fn references_params(expr: &Expr, params: &[TemplateParam]) -> bool {
    if params.is_empty() {
        return false;
    }
    let mut found = false;
    expr.for_each_name(&mut |name| {
        if name.is_simple() && params.iter().any(|p| p.name == name.last()) {
            found = true;
        }
    });
    found
}

fn issue_diagnostic(file: &str, issue: EvalIssue) -> Diagnostic {
    Diagnostic::new(issue.kind, issue.message, SourceLocation::new(file, issue.span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::registry::SnapshotBuilder;
    use rayon::prelude::*;

    fn snapshot(source: &str) -> Snapshot {
        let builder = SnapshotBuilder::new("test");
        builder.register_file(0, parse_source("t.hpp", source));
        builder.freeze()
    }

    fn resolve_all(snapshot: &Snapshot) -> (Vec<ResolvedType>, Vec<Diagnostic>) {
        let abi = AbiConfig::default();
        let resolver = Resolver::new(snapshot, &abi);
        let mut types = Vec::new();
        let mut diagnostics = snapshot.diagnostics().to_vec();
        for id in snapshot.ids() {
            let (ty, diags) = resolver.resolve(id);
            types.push(ty);
            diagnostics.extend(diags);
        }
        (types, diagnostics)
    }

    fn find<'a>(types: &'a [ResolvedType], qualified: &str) -> &'a ResolvedType {
        types.iter().find(|t| t.qualified == qualified).unwrap()
    }

    fn values(ty: &ResolvedType) -> Vec<i128> {
        ty.enumerators.iter().map(|e| e.value.as_i128().unwrap()).collect()
    }

    fn count(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> usize {
        diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    #[test]
    fn test_implicit_enum_values() {
        let snapshot = snapshot("enum class EGameMode { Menu, Playing, Paused, GameOver, Count };");
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty());
        assert_eq!(values(&types[0]), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sentinels_continue_from_explicit() {
        let snapshot = snapshot("enum class EShape { Rectangle = 0, Circle = 1, Triangle = 2, Count, Invalid };");
        let (types, _) = resolve_all(&snapshot);
        let shape = &types[0];
        assert_eq!(shape.enumerator("Count").unwrap().value.as_i128(), Some(3));
        assert_eq!(shape.enumerator("Invalid").unwrap().value.as_i128(), Some(4));
        assert!(!shape.enumerator("Count").unwrap().alias);
    }

    #[test]
    fn test_alias_enumerators() {
        let snapshot = snapshot(
            "enum class ETextureFormat { RGB = 0, RGBA = 1, DXT = 2, RGB_Unsigned = RGB, DXT_Unsigned = DXT, Next };",
        );
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty());
        let format = &types[0];
        let rgb = format.enumerator("RGB_Unsigned").unwrap();
        let dxt = format.enumerator("DXT_Unsigned").unwrap();
        assert_eq!((rgb.value.as_i128(), rgb.alias), (Some(0), true));
        assert_eq!((dxt.value.as_i128(), dxt.alias), (Some(2), true));
        assert_eq!(format.enumerator("Next").unwrap().value.as_i128(), Some(3));
        assert!(!format.enumerator("RGBA").unwrap().alias);
    }

    #[test]
    fn test_forward_reference_across_declarations() {
        let snapshot = snapshot(
            "struct Inventory { int slots[ESlot::Count]; };\nenum class ESlot { Head, Chest, Legs, Count };",
        );
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty());
        assert_eq!(find(&types, "Inventory").fields[0].array, vec![ArrayDim::Fixed(3)]);
    }

    #[test]
    fn test_unresolved_reported_once() {
        let snapshot = snapshot(
            "enum class EPool { Base = 4, Audio = ESystemPoolSize::Audio + 1, After };\n\
             struct Pools { int audio[EPool::Audio]; int other[EPool::After]; };",
        );
        let (types, diagnostics) = resolve_all(&snapshot);
        assert_eq!(count(&diagnostics, DiagnosticKind::UnresolvedSymbol), 1);
        let pool = find(&types, "EPool");
        assert_eq!(values(pool), vec![4, 1, 2]);
        assert_eq!(find(&types, "Pools").fields[1].array, vec![ArrayDim::Fixed(2)]);
        let unresolved = diagnostics.iter().find(|d| d.kind == DiagnosticKind::UnresolvedSymbol).unwrap();
        assert!(unresolved.message.contains("ESystemPoolSize::Audio"));
    }

    #[test]
    fn test_cycle_reported_by_each_member() {
        let snapshot = snapshot("enum A { X = B::Y };\nenum B { Y = A::X };\nenum C { Z = Z + 1, W };");
        let (types, diagnostics) = resolve_all(&snapshot);
        assert_eq!(count(&diagnostics, DiagnosticKind::CyclicReference), 3);
        assert_eq!(values(find(&types, "A")), vec![0]);
        assert_eq!(values(find(&types, "C")), vec![1, 2]);
    }

    #[test]
    fn test_cycle_detection_independent_of_order() {
        let source = "enum A { X = B::Y };\nenum B { Y = A::X };";
        let snapshot = snapshot(source);
        let abi = AbiConfig::default();
        let resolver = Resolver::new(&snapshot, &abi);
        let ids: Vec<TypeId> = snapshot.ids().collect();
        let reversed: usize = ids.iter().rev().map(|id| count(&resolver.resolve(*id).1, DiagnosticKind::CyclicReference)).sum();
        assert_eq!(reversed, 2);
        let parallel: usize = ids
            .par_iter()
            .map(|id| count(&resolver.resolve(*id).1, DiagnosticKind::CyclicReference))
            .sum();
        assert_eq!(parallel, 2);
    }

    #[test]
    fn test_later_sibling_is_invalid() {
        let snapshot = snapshot("enum E { A = B, B = 1 };");
        let (types, diagnostics) = resolve_all(&snapshot);
        assert_eq!(count(&diagnostics, DiagnosticKind::InvalidExpression), 1);
        assert_eq!(values(&types[0]), vec![0, 1]);
    }

    #[test]
    fn test_underlying_type_coercion() {
        let snapshot = snapshot("enum class Small : uint8_t { A = 255, B };\nenum class Wide : uint64_t { H = FNV1a64(\"Bool\") };");
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty());
        assert_eq!(values(&types[0]), vec![255, 0]);
        assert_eq!(types[0].storage, Some(ScalarType::U8));
        let hash = crate::eval::fnv1a_64(b"Bool");
        assert_eq!(types[1].enumerators[0].value.as_i128(), Some(hash as i128));
    }

    #[test]
    fn test_constants_and_casts() {
        let snapshot = snapshot(
            "enum class EKind : uint8_t { A, B };\n\
             struct Limits {\n\
                 static constexpr int Max = Base * 2;\n\
                 static constexpr int Base = 8;\n\
                 static constexpr auto Tag = static_cast<EKind>(300);\n\
                 static constexpr const char* Name = \"limits\";\n\
                 char buffer[Max];\n\
             };",
        );
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let limits = find(&types, "Limits");
        assert_eq!(limits.constant("Max").unwrap().value.and_then(|v| v.as_i128()), Some(16));
        assert_eq!(limits.constant("Tag").unwrap().value.and_then(|v| v.as_i128()), Some(44));
        assert_eq!(limits.constant("Name").unwrap().value, None);
        assert_eq!(limits.fields[0].array, vec![ArrayDim::Fixed(16)]);
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let snapshot = snapshot(
            "enum class Mode { A, B, C };\n\
             struct Outer { enum class Mode { X }; int values[static_cast<int>(Mode::X) + 1]; Mode mode; ::Mode global; };",
        );
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty());
        let outer = find(&types, "Outer");
        assert_eq!(outer.fields[0].array, vec![ArrayDim::Fixed(1)]);
        assert_eq!(outer.fields[1].ty.declared().map(|id| snapshot.get(id).qualified.clone()), Some("Outer::Mode".to_string()));
        assert_eq!(outer.fields[2].ty.declared().map(|id| snapshot.get(id).qualified.clone()), Some("Mode".to_string()));
    }

    #[test]
    fn test_ambiguous_unscoped_enumerator() {
        let snapshot = snapshot("enum EGameMode { Menu, Count };\nenum EShape { Circle, Square, Count };\nstruct S { int a[Count]; };");
        let (types, diagnostics) = resolve_all(&snapshot);
        assert_eq!(count(&diagnostics, DiagnosticKind::AmbiguousSymbol), 1);
        assert_eq!(find(&types, "S").fields[0].array, vec![ArrayDim::Fixed(1)]);
    }

    #[test]
    fn test_type_targets() {
        let snapshot = snapshot(
            "namespace game { struct Object { int id; }; }\n\
             struct Holder { game::Object obj; DynArray<Handle<game::Object>> list; CName name; CClass* cls; uint32_t n; };",
        );
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty());
        let holder = find(&types, "Holder");
        assert!(matches!(holder.fields[0].ty.target, TypeTarget::Declared { ref qualified, .. } if qualified == "game::Object"));
        assert!(matches!(holder.fields[1].ty.target, TypeTarget::Container { ref name } if name == "DynArray"));
        match &holder.fields[1].ty.args[0] {
            ResolvedArg::Type(inner) => {
                assert!(matches!(inner.target, TypeTarget::Container { .. }));
                assert!(matches!(inner.args[0], ResolvedArg::Type(ref t) if t.declared().is_some()));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(holder.fields[2].ty.target, TypeTarget::Container { .. }));
        assert_eq!(holder.fields[3].ty.target, TypeTarget::Opaque);
        assert_eq!(holder.fields[4].ty.target, TypeTarget::Scalar { scalar: ScalarType::U32 });
    }

    #[test]
    fn test_template_arity() {
        let snapshot = snapshot(
            "template<typename K, typename V = int> struct Pair { K key; V value; Pair* next; };\n\
             struct Plain { int x; };\n\
             struct User { Pair<int> ok; Pair<int, int, int> many; Pair<> none; HashMap<int> map; Plain<int> plain; };",
        );
        let (_, diagnostics) = resolve_all(&snapshot);
        assert_eq!(count(&diagnostics, DiagnosticKind::TemplateArity), 4);
    }

    #[test]
    fn test_template_dependent_members() {
        let snapshot = snapshot(
            "template<typename T, int N> struct Buffer { static constexpr int Capacity = N * 2; T items[N]; uint8_t raw[4]; };\n\
             struct Use { Buffer<float, 3> small; };",
        );
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty());
        let buffer = find(&types, "Buffer");
        assert!(matches!(buffer.fields[0].array[0], ArrayDim::Dependent(_)));
        assert!(matches!(buffer.fields[0].ty.target, TypeTarget::TemplateParam { .. }));
        assert_eq!(buffer.fields[1].array, vec![ArrayDim::Fixed(4)]);
        assert_eq!(buffer.constant("Capacity").unwrap().value, None);
        let used = &find(&types, "Use").fields[0].ty;
        assert!(matches!(used.args[1], ResolvedArg::Value(v) if v.as_i128() == Some(3)));
    }

    #[test]
    fn test_field_order_and_annotations() {
        let snapshot = snapshot("struct GameApp {\n  void* vtable; // 0\n  uint8_t unk8[0x30 - 0x8]; // 8\n  float dt; // scale\n  bool ready;\n}");
        let (types, diagnostics) = resolve_all(&snapshot);
        assert!(diagnostics.is_empty());
        let app = &types[0];
        let names: Vec<&str> = app.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["vtable", "unk8", "dt", "ready"]);
        assert_eq!(app.fields[1].explicit_offset, Some(8));
        assert_eq!(app.fields[1].array, vec![ArrayDim::Fixed(0x28)]);
        assert_eq!(app.fields[2].comment.as_deref(), Some("scale"));
    }
}
