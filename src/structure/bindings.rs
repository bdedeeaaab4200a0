// Thu Oct 15 2026 - Alex

use crate::eval::{Lookup, ResolvedValue, ValueScope};
use crate::parser::{QualifiedName, RefKind};
use crate::registry::{ResolvedArg, ResolvedType, ResolvedTypeRef, Snapshot, SymbolRef, TypeTarget};
use serde::Serialize;

/// What a template parameter stands for in one instantiation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Type(ResolvedTypeRef),
    Value(ResolvedValue),
}

/// Parameter bindings of a template instantiation, enclosing templates'
/// parameters first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(String, Bound)>,
}

impl Bindings {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Bound> {
        self.entries.iter().rev().find(|(n, _)| n == name).map(|(_, bound)| bound)
    }

    pub fn bind(&mut self, name: &str, bound: Bound) {
        self.entries.push((name.to_string(), bound));
    }

    /// Cache key of the instantiation these bindings describe.
    pub fn key(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        serde_json::to_string(&self.entries).unwrap_or_default()
    }

    /// Replaces bound parameters inside a type reference, arguments included.
    pub fn substitute(&self, ty: &ResolvedTypeRef) -> ResolvedTypeRef {
        if let TypeTarget::TemplateParam { name } = &ty.target {
            if let Some(Bound::Type(bound)) = self.get(name) {
                let mut result = bound.clone();
                result.pointer_depth += ty.pointer_depth;
                if ty.reference != RefKind::None {
                    result.reference = ty.reference;
                }
                result.is_const |= ty.is_const;
                result.spelling = format!("{}{}", bound.spelling, "*".repeat(ty.pointer_depth as usize));
                return result;
            }
            return ty.clone();
        }
        if ty.args.is_empty() || self.is_empty() {
            return ty.clone();
        }
        let mut result = ty.clone();
        result.args = ty.args.iter().map(|arg| self.substitute_arg(arg)).collect();
        result
    }

    pub fn substitute_arg(&self, arg: &ResolvedArg) -> ResolvedArg {
        match arg {
            ResolvedArg::Type(ty) => ResolvedArg::Type(self.substitute(ty)),
            ResolvedArg::Value(value) => ResolvedArg::Value(*value),
            ResolvedArg::Dependent(text) => match self.get(text.trim()) {
                Some(Bound::Value(value)) => ResolvedArg::Value(*value),
                _ => ResolvedArg::Dependent(text.clone()),
            },
        }
    }
}

/// Names visible to a dependent expression: bound value parameters, then
/// constants and enumerators already resolved in the model.
pub struct BindingScope<'a> {
    pub bindings: &'a Bindings,
    pub types: &'a [ResolvedType],
    pub snapshot: &'a Snapshot,
    pub scope: Vec<String>,
}

impl ValueScope for BindingScope<'_> {
    fn lookup(&self, name: &QualifiedName) -> Lookup {
        if name.is_simple() {
            match self.bindings.get(name.last()) {
                Some(Bound::Value(value)) => return Lookup::Value(*value),
                Some(Bound::Type(_)) => return Lookup::NotConstant("is a type parameter".to_string()),
                None => {}
            }
        }
        let value = match self.snapshot.lookup(name, &self.scope).symbol() {
            Some(SymbolRef::Enumerator { owner, index }) => self.types[owner.index()]
                .enumerators
                .get(index)
                .map(|enumerator| enumerator.value),
            Some(SymbolRef::Constant { owner, index }) => self.types[owner.index()]
                .constants
                .get(index)
                .and_then(|constant| constant.value),
            _ => None,
        };
        value.map_or(Lookup::Unresolved, Lookup::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::ScalarType;

    fn scalar(spelling: &str, scalar: ScalarType) -> ResolvedTypeRef {
        ResolvedTypeRef {
            spelling: spelling.to_string(),
            target: TypeTarget::Scalar { scalar },
            args: Vec::new(),
            pointer_depth: 0,
            reference: RefKind::None,
            is_const: false,
        }
    }

    #[test]
    fn test_substitute_keeps_indirection() {
        let mut bindings = Bindings::default();
        bindings.bind("T", Bound::Type(scalar("float", ScalarType::F32)));
        bindings.bind("N", Bound::Value(ResolvedValue::int(4)));

        let param = ResolvedTypeRef {
            spelling: "T*".to_string(),
            target: TypeTarget::TemplateParam { name: "T".to_string() },
            args: Vec::new(),
            pointer_depth: 1,
            reference: RefKind::None,
            is_const: true,
        };
        let result = bindings.substitute(&param);
        assert_eq!(result.target, TypeTarget::Scalar { scalar: ScalarType::F32 });
        assert_eq!(result.pointer_depth, 1);
        assert!(result.is_const);
        assert_eq!(result.spelling, "float*");

        let arg = bindings.substitute_arg(&ResolvedArg::Dependent("N".to_string()));
        assert_eq!(arg, ResolvedArg::Value(ResolvedValue::int(4)));
        assert!(!bindings.key().is_empty());
        assert_eq!(Bindings::default().key(), "");
    }
}
