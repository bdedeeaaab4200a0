// Tue Oct 13 2026 - Alex

use super::hash::Intrinsic;
use super::scalar::ScalarType;
use super::value::{IntType, IntValue, ResolvedValue};
use crate::diagnostic::{DiagnosticKind, Span};
use crate::parser::{BinaryOp, Expr, ExprKind, QualifiedName, TypeRef, UnaryOp};

/// What a name in an expression refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Value(ResolvedValue),
    Unresolved,
    /// Resolves, but not to a usable value. Carries the reason, e.g.
    /// "is a type, not a constant".
    NotConstant(String),
    /// Several injected enumerators share the name; `value` is the first.
    Ambiguous { value: ResolvedValue, chosen: String, candidates: usize },
    /// The lookup ran into a dependency cycle. `closes_here` is set when the
    /// cycle runs through the expression being evaluated.
    Cyclic { value: ResolvedValue, closes_here: bool },
}

/// Target of a cast after name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastTarget {
    Int(IntType),
    Bool,
    Float,
}

impl CastTarget {
    pub fn from_scalar(scalar: ScalarType) -> Option<Self> {
        match scalar {
            ScalarType::Bool => Some(CastTarget::Bool),
            ScalarType::F32 | ScalarType::F64 => Some(CastTarget::Float),
            ScalarType::Void => None,
            other => IntType::from_scalar(other).map(CastTarget::Int),
        }
    }
}

/// Name environment an expression is evaluated in.
pub trait ValueScope {
    fn lookup(&self, name: &QualifiedName) -> Lookup;

    /// Resolves a cast target type. `Err(true)` means the name is unknown,
    /// `Err(false)` that it is known but not arithmetic.
    fn cast_target(&self, ty: &TypeRef) -> Result<CastTarget, bool> {
        if ty.is_indirect() {
            return Ok(CastTarget::Int(IntType::ULONG_LONG));
        }
        match ScalarType::from_name(&ty.base_name().joined()) {
            Some(scalar) => CastTarget::from_scalar(scalar).ok_or(false),
            None => Err(true),
        }
    }
}

/// Scope with no names in it.
pub struct EmptyScope;

impl ValueScope for EmptyScope {
    fn lookup(&self, _name: &QualifiedName) -> Lookup {
        Lookup::Unresolved
    }
}

/// A problem found while evaluating; turned into a diagnostic by whoever
/// owns the expression.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalIssue {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
}

pub struct Evaluator<'a> {
    scope: &'a dyn ValueScope,
    issues: Vec<EvalIssue>,
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: &'a dyn ValueScope) -> Self {
        Self {
            scope,
            issues: Vec::new(),
        }
    }

    pub fn issues(&self) -> &[EvalIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<EvalIssue> {
        self.issues
    }

    /// Evaluates `expr`. Failures are recorded as issues and evaluate to 0.
    pub fn evaluate(&mut self, expr: &Expr) -> ResolvedValue {
        match &expr.kind {
            ExprKind::Int {
                value,
                unsigned,
                long,
                decimal,
            } => ResolvedValue::Int(literal(*value, *unsigned, *long, *decimal)),
            ExprKind::Float(value) => ResolvedValue::Float(*value),
            ExprKind::Bool(value) => ResolvedValue::Bool(*value),
            ExprKind::Str(_) => self.invalid(expr.span, "string literal outside of an intrinsic call"),
            ExprKind::Name(name) => self.lookup(name, expr.span),
            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand);
                self.unary(*op, value, expr.span)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.evaluate(lhs);
                let rhs = self.evaluate(rhs);
                self.binary(*op, lhs, rhs, expr.span)
            }
            ExprKind::Cast { target, operand } => {
                let value = self.evaluate(operand);
                match self.scope.cast_target(target) {
                    Ok(target) => coerce(value, target),
                    Err(true) => {
                        self.issue(
                            DiagnosticKind::UnresolvedSymbol,
                            format!("unknown cast target `{}`", target),
                            expr.span,
                        );
                        ResolvedValue::zero()
                    }
                    Err(false) => self.invalid(expr.span, &format!("cannot cast to `{}`", target)),
                }
            }
            ExprKind::Call { callee, args } => self.call(callee, args, expr.span),
        }
    }

    fn lookup(&mut self, name: &QualifiedName, span: Span) -> ResolvedValue {
        match self.scope.lookup(name) {
            Lookup::Value(value) => value,
            Lookup::Unresolved => {
                self.issue(DiagnosticKind::UnresolvedSymbol, format!("unresolved symbol `{}`", name), span);
                ResolvedValue::zero()
            }
            Lookup::NotConstant(reason) => self.invalid(span, &format!("`{}` {}", name, reason)),
            Lookup::Ambiguous {
                value,
                chosen,
                candidates,
            } => {
                self.issue(
                    DiagnosticKind::AmbiguousSymbol,
                    format!("`{}` matches {} enumerators; using `{}`", name, candidates, chosen),
                    span,
                );
                value
            }
            Lookup::Cyclic { value, closes_here } => {
                if closes_here {
                    self.issue(
                        DiagnosticKind::CyclicReference,
                        format!("`{}` depends on itself", name),
                        span,
                    );
                    ResolvedValue::zero()
                } else {
                    value
                }
            }
        }
    }

    fn call(&mut self, callee: &QualifiedName, args: &[Expr], span: Span) -> ResolvedValue {
        let intrinsic = match Intrinsic::from_name(callee.last()) {
            Some(intrinsic) => intrinsic,
            None => return self.invalid(span, &format!("unknown intrinsic `{}`", callee)),
        };
        match args {
            [Expr {
                kind: ExprKind::Str(text),
                ..
            }] => intrinsic.apply(text),
            _ => self.invalid(span, &format!("`{}` takes one string literal", callee)),
        }
    }

    fn unary(&mut self, op: UnaryOp, value: ResolvedValue, span: Span) -> ResolvedValue {
        if op == UnaryOp::Not {
            return ResolvedValue::Bool(!value.is_truthy());
        }
        if let ResolvedValue::Float(x) = value {
            return match op {
                UnaryOp::Neg => ResolvedValue::Float(-x),
                UnaryOp::Plus => value,
                _ => self.invalid(span, "bitwise operation on a floating-point value"),
            };
        }
        let int = match value.as_int() {
            Some(int) => int,
            None => return ResolvedValue::zero(),
        };
        let ty = int.ty.promoted();
        let result = match op {
            UnaryOp::Neg => -int.value,
            UnaryOp::BitNot => !int.value,
            _ => int.value,
        };
        ResolvedValue::Int(IntValue::new(result, ty))
    }

    fn binary(&mut self, op: BinaryOp, lhs: ResolvedValue, rhs: ResolvedValue, span: Span) -> ResolvedValue {
        let float = matches!(lhs, ResolvedValue::Float(_)) || matches!(rhs, ResolvedValue::Float(_));
        if float {
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            return match op {
                BinaryOp::Add => ResolvedValue::Float(a + b),
                BinaryOp::Sub => ResolvedValue::Float(a - b),
                BinaryOp::Mul => ResolvedValue::Float(a * b),
                BinaryOp::Div if b == 0.0 => self.invalid(span, "division by zero"),
                BinaryOp::Div => ResolvedValue::Float(a / b),
                _ => self.invalid(
                    span,
                    &format!("operator `{}` on a floating-point value", op.symbol()),
                ),
            };
        }

        let (a, b) = match (lhs.as_int(), rhs.as_int()) {
            (Some(a), Some(b)) => (a, b),
            _ => return ResolvedValue::zero(),
        };

        if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
            let ty = a.ty.promoted();
            if b.value < 0 || b.value >= ty.bits as i128 {
                return self.invalid(span, &format!("shift by {} out of range for {}", b.value, ty));
            }
            let value = a.cast(ty).value;
            let result = match op {
                BinaryOp::Shl => value << b.value,
                _ => value >> b.value,
            };
            return ResolvedValue::Int(IntValue::new(result, ty));
        }

        let ty = a.ty.common(b.ty);
        let (x, y) = (a.cast(ty).value, b.cast(ty).value);
        let result = match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x.wrapping_mul(y),
            BinaryOp::Div | BinaryOp::Rem if y == 0 => return self.invalid(span, "division by zero"),
            BinaryOp::Div => x / y,
            BinaryOp::Rem => x % y,
            BinaryOp::BitAnd => x & y,
            BinaryOp::BitOr => x | y,
            BinaryOp::BitXor => x ^ y,
            BinaryOp::Shl | BinaryOp::Shr => unreachable!("shifts handled above"),
        };
        ResolvedValue::Int(IntValue::new(result, ty))
    }

    fn invalid(&mut self, span: Span, message: &str) -> ResolvedValue {
        self.issue(DiagnosticKind::InvalidExpression, message.to_string(), span);
        ResolvedValue::zero()
    }

    fn issue(&mut self, kind: DiagnosticKind, message: String, span: Span) {
        self.issues.push(EvalIssue { kind, message, span });
    }
}

/// Types an integer literal the way C++ does: the first of the candidate
/// types its value fits in.
pub fn literal(value: u64, unsigned: bool, long: bool, decimal: bool) -> IntValue {
    let value = value as i128;
    let candidates: &[IntType] = match (unsigned, long, decimal) {
        (true, false, _) => &[IntType::UINT, IntType::ULONG_LONG],
        (true, true, _) => &[IntType::ULONG_LONG],
        (false, false, true) => &[IntType::INT, IntType::LONG_LONG],
        (false, true, true) => &[IntType::LONG_LONG],
        (false, false, false) => &[IntType::INT, IntType::UINT, IntType::LONG_LONG, IntType::ULONG_LONG],
        (false, true, false) => &[IntType::LONG_LONG, IntType::ULONG_LONG],
    };
    let ty = candidates
        .iter()
        .copied()
        .find(|ty| ty.fits(value))
        .unwrap_or(IntType::ULONG_LONG);
    IntValue::new(value, ty)
}

/// Converts a value to a cast target, truncating or widening integers.
pub fn coerce(value: ResolvedValue, target: CastTarget) -> ResolvedValue {
    match target {
        CastTarget::Bool => ResolvedValue::Bool(value.is_truthy()),
        CastTarget::Float => ResolvedValue::Float(value.as_f64()),
        CastTarget::Int(ty) => {
            let raw = match value {
                ResolvedValue::Float(x) => x.trunc() as i128,
                other => other.as_i128().unwrap_or(0),
            };
            ResolvedValue::Int(IntValue::new(raw, ty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    struct MapScope(Vec<(&'static str, Lookup)>);

    impl ValueScope for MapScope {
        fn lookup(&self, name: &QualifiedName) -> Lookup {
            let key = name.to_string();
            self.0
                .iter()
                .find(|(n, _)| *n == key)
                .map(|(_, l)| l.clone())
                .unwrap_or(Lookup::Unresolved)
        }
    }

    fn expr(source: &str) -> Expr {
        let tokens = tokenize(&format!("struct S {{ int x[{}]; }};", source)).unwrap();
        let mut parser = Parser::new("e.hpp", tokens);
        let decls = parser.parse_file();
        match decls.into_iter().next() {
            Some(crate::parser::Declaration::Record(mut record)) => record.fields.remove(0).array.remove(0),
            other => panic!("bad fixture {:?}", other),
        }
    }

    fn eval(source: &str) -> (ResolvedValue, Vec<EvalIssue>) {
        eval_in(&EmptyScope, source)
    }

    fn eval_in(scope: &dyn ValueScope, source: &str) -> (ResolvedValue, Vec<EvalIssue>) {
        let mut evaluator = Evaluator::new(scope);
        let value = evaluator.evaluate(&expr(source));
        (value, evaluator.into_issues())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("(0x138 - 0x78) >> 3").0.as_i128(), Some(24));
        assert_eq!(eval("1 << 4 | 3").0.as_i128(), Some(19));
        assert_eq!(eval("-7 / 2").0.as_i128(), Some(-3));
        assert_eq!(eval("-7 % 2").0.as_i128(), Some(-1));
        assert_eq!(eval("~0u").0.as_i128(), Some(u32::MAX as i128));
        assert_eq!(eval("!0").0, ResolvedValue::Bool(true));
    }

    #[test]
    fn test_literal_typing() {
        assert_eq!(literal(5, false, false, true).ty, IntType::INT);
        assert_eq!(literal(0xFFFF_FFFF, false, false, false).ty, IntType::UINT);
        assert_eq!(literal(0xFFFF_FFFF, false, false, true).ty, IntType::LONG_LONG);
        assert_eq!(literal(1, true, true, true).ty, IntType::ULONG_LONG);
        assert_eq!(literal(u64::MAX, false, false, false).ty, IntType::ULONG_LONG);
    }

    #[test]
    fn test_int_overflow_wraps_in_common_type() {
        let (value, issues) = eval("0xFFFFFFFFu + 1");
        assert!(issues.is_empty());
        assert_eq!(value.as_i128(), Some(0));
        let (value, _) = eval("0xFFFFFFFF + 1ll");
        assert_eq!(value.as_i128(), Some(0x1_0000_0000));
    }

    #[test]
    fn test_casts() {
        assert_eq!(eval("static_cast<uint8_t>(-1)").0.as_i128(), Some(255));
        assert_eq!(eval("(int8_t)200").0.as_i128(), Some(-56));
        assert_eq!(eval("static_cast<int>(3.9)").0.as_i128(), Some(3));
        let (value, issues) = eval("static_cast<Unknown>(1)");
        assert_eq!(value, ResolvedValue::zero());
        assert_eq!(issues[0].kind, DiagnosticKind::UnresolvedSymbol);
    }

    #[test]
    fn test_division_by_zero() {
        let (value, issues) = eval("4 / (2 - 2)");
        assert_eq!(value, ResolvedValue::zero());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidExpression);
    }

    #[test]
    fn test_float_bitwise_is_invalid() {
        let (_, issues) = eval("1.5 | 2");
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidExpression);
        let (value, issues) = eval("1.5 * 2");
        assert!(issues.is_empty());
        assert_eq!(value, ResolvedValue::Float(3.0));
    }

    #[test]
    fn test_intrinsics() {
        let (value, issues) = eval("FNV1a64(\"Bool\")");
        assert!(issues.is_empty());
        assert_eq!(value, ResolvedValue::Hash(super::super::hash::fnv1a_64(b"Bool")));
        let (_, issues) = eval("CRC32(\"Bool\")");
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidExpression);
    }

    #[test]
    fn test_lookups() {
        let scope = MapScope(vec![
            ("EShape::Circle", Lookup::Value(ResolvedValue::int(1))),
            ("Player", Lookup::NotConstant("is a type, not a constant".to_string())),
            (
                "Count",
                Lookup::Ambiguous {
                    value: ResolvedValue::int(3),
                    chosen: "EShape::Count".to_string(),
                    candidates: 2,
                },
            ),
            (
                "Loop",
                Lookup::Cyclic {
                    value: ResolvedValue::zero(),
                    closes_here: true,
                },
            ),
        ]);
        assert_eq!(eval_in(&scope, "EShape::Circle * 4").0.as_i128(), Some(4));

        let (value, issues) = eval_in(&scope, "ESystemPoolSize::Audio + 1");
        assert_eq!(value.as_i128(), Some(1));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, DiagnosticKind::UnresolvedSymbol);

        let (_, issues) = eval_in(&scope, "Player");
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidExpression);

        let (value, issues) = eval_in(&scope, "Count");
        assert_eq!(value.as_i128(), Some(3));
        assert_eq!(issues[0].kind, DiagnosticKind::AmbiguousSymbol);

        let (_, issues) = eval_in(&scope, "Loop + 1");
        assert_eq!(issues[0].kind, DiagnosticKind::CyclicReference);
    }

    #[test]
    fn test_shift_out_of_range() {
        let (_, issues) = eval("1 << 40");
        assert_eq!(issues[0].kind, DiagnosticKind::InvalidExpression);
        assert!(eval("1ll << 40").1.is_empty());
    }
}
