// Tue Jan 15 2026 - Alex

use super::error::DiffError;
use crate::registry::{ArrayDim, ResolvedEnumerator, ResolvedField, ResolvedType};
use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// One change between two versions of a type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum TypeDifference {
    FieldAdded {
        name: String,
        ty: String,
        offset: Option<u64>,
    },
    FieldRemoved {
        name: String,
        ty: String,
        offset: Option<u64>,
    },
    /// Same name, different type reference.
    FieldTypeChanged {
        name: String,
        old_type: String,
        new_type: String,
    },
    /// Same name, different recorded offset.
    FieldMoved {
        name: String,
        old_offset: Option<u64>,
        new_offset: Option<u64>,
        /// Both offsets come from annotations rather than inference.
        explicit: bool,
    },
    EnumeratorAdded {
        name: String,
        value: String,
    },
    EnumeratorRemoved {
        name: String,
        value: String,
    },
    EnumeratorValueChanged {
        name: String,
        old_value: String,
        new_value: String,
    },
    BasesChanged {
        old_bases: Vec<String>,
        new_bases: Vec<String>,
    },
    SizeChanged {
        old_size: Option<u64>,
        new_size: Option<u64>,
    },
}

impl TypeDifference {
    pub fn severity(&self) -> DifferenceSeverity {
        match self {
            TypeDifference::FieldRemoved { .. } => DifferenceSeverity::Breaking,
            TypeDifference::FieldTypeChanged { .. } => DifferenceSeverity::Breaking,
            TypeDifference::FieldMoved { explicit: true, .. } => DifferenceSeverity::Breaking,
            TypeDifference::FieldMoved { explicit: false, .. } => DifferenceSeverity::Moderate,
            TypeDifference::EnumeratorRemoved { .. } => DifferenceSeverity::Breaking,
            TypeDifference::EnumeratorValueChanged { .. } => DifferenceSeverity::Breaking,
            TypeDifference::FieldAdded { .. } => DifferenceSeverity::Minor,
            TypeDifference::EnumeratorAdded { .. } => DifferenceSeverity::Minor,
            TypeDifference::BasesChanged { .. } => DifferenceSeverity::Informational,
            TypeDifference::SizeChanged { .. } => DifferenceSeverity::Informational,
        }
    }

    /// Name of the field or enumerator the change is about.
    pub fn member(&self) -> Option<&str> {
        match self {
            TypeDifference::FieldAdded { name, .. }
            | TypeDifference::FieldRemoved { name, .. }
            | TypeDifference::FieldTypeChanged { name, .. }
            | TypeDifference::FieldMoved { name, .. }
            | TypeDifference::EnumeratorAdded { name, .. }
            | TypeDifference::EnumeratorRemoved { name, .. }
            | TypeDifference::EnumeratorValueChanged { name, .. } => Some(name),
            TypeDifference::BasesChanged { .. } | TypeDifference::SizeChanged { .. } => None,
        }
    }
}

fn offset_text(offset: Option<u64>) -> String {
    offset.map_or_else(|| "?".to_string(), |o| format!("0x{:X}", o))
}

impl fmt::Display for TypeDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDifference::FieldAdded { name, ty, offset } => {
                write!(f, "Added: {} {} @ {}", ty, name, offset_text(*offset))
            }
            TypeDifference::FieldRemoved { name, ty, offset } => {
                write!(f, "Removed: {} {} @ {}", ty, name, offset_text(*offset))
            }
            TypeDifference::FieldTypeChanged { name, old_type, new_type } => {
                write!(f, "Type changed: {}: {} -> {}", name, old_type, new_type)
            }
            TypeDifference::FieldMoved { name, old_offset, new_offset, .. } => {
                write!(f, "Moved: {} from {} to {}", name, offset_text(*old_offset), offset_text(*new_offset))
            }
            TypeDifference::EnumeratorAdded { name, value } => write!(f, "Added: {} = {}", name, value),
            TypeDifference::EnumeratorRemoved { name, value } => write!(f, "Removed: {} = {}", name, value),
            TypeDifference::EnumeratorValueChanged { name, old_value, new_value } => {
                write!(f, "Value changed: {}: {} -> {}", name, old_value, new_value)
            }
            TypeDifference::BasesChanged { old_bases, new_bases } => {
                write!(f, "Bases changed: [{}] -> [{}]", old_bases.join(", "), new_bases.join(", "))
            }
            TypeDifference::SizeChanged { old_size, new_size } => {
                write!(f, "Size changed: {} -> {} bytes", offset_text(*old_size), offset_text(*new_size))
            }
        }
    }
}

/// Severity level of a difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceSeverity {
    Informational,
    Minor,
    Moderate,
    Breaking,
}

impl fmt::Display for DifferenceSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifferenceSeverity::Informational => write!(f, "INFO"),
            DifferenceSeverity::Minor => write!(f, "MINOR"),
            DifferenceSeverity::Moderate => write!(f, "MODERATE"),
            DifferenceSeverity::Breaking => write!(f, "BREAKING"),
        }
    }
}

/// Result of comparing one qualified type across two snapshots
#[derive(Debug, Clone, Serialize)]
pub struct TypeDiff {
    pub qualified: String,
    pub old_snapshot: String,
    pub new_snapshot: String,
    pub differences: Vec<TypeDifference>,
    /// Members present and identical in both versions
    pub unchanged: Vec<String>,
    pub is_abi_compatible: bool,
}

impl TypeDiff {
    pub fn new(qualified: &str) -> Self {
        Self {
            qualified: qualified.to_string(),
            old_snapshot: String::new(),
            new_snapshot: String::new(),
            differences: Vec::new(),
            unchanged: Vec::new(),
            is_abi_compatible: true,
        }
    }

    pub fn add_difference(&mut self, diff: TypeDifference) {
        if diff.severity() >= DifferenceSeverity::Moderate {
            self.is_abi_compatible = false;
        }
        self.differences.push(diff);
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn added_fields(&self) -> Vec<&str> {
        self.members_where(|d| matches!(d, TypeDifference::FieldAdded { .. }))
    }

    pub fn removed_fields(&self) -> Vec<&str> {
        self.members_where(|d| matches!(d, TypeDifference::FieldRemoved { .. }))
    }

    /// Fields present in both versions whose type or offset changed.
    pub fn modified_fields(&self) -> Vec<&str> {
        let mut names = self.members_where(|d| {
            matches!(d, TypeDifference::FieldTypeChanged { .. } | TypeDifference::FieldMoved { .. })
        });
        names.dedup();
        names
    }

    fn members_where(&self, keep: impl Fn(&TypeDifference) -> bool) -> Vec<&str> {
        self.differences.iter().filter(|d| keep(d)).filter_map(TypeDifference::member).collect()
    }

    pub fn has_breaking_changes(&self) -> bool {
        self.differences.iter().any(|d| d.severity() == DifferenceSeverity::Breaking)
    }

    pub fn breaking_changes(&self) -> Vec<&TypeDifference> {
        self.differences
            .iter()
            .filter(|d| d.severity() == DifferenceSeverity::Breaking)
            .collect()
    }

    pub fn group_by_severity(&self) -> HashMap<DifferenceSeverity, Vec<&TypeDifference>> {
        let mut groups: HashMap<DifferenceSeverity, Vec<&TypeDifference>> = HashMap::new();
        for diff in &self.differences {
            groups.entry(diff.severity()).or_default().push(diff);
        }
        groups
    }
}

impl fmt::Display for TypeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Comparison: {} ({} -> {})", self.qualified, self.old_snapshot, self.new_snapshot)?;
        writeln!(f, "ABI Compatible: {}", if self.is_abi_compatible { "Yes" } else { "No" })?;
        writeln!(f, "Unchanged members: {}", self.unchanged.len())?;
        writeln!(f, "Differences: {}", self.differences.len())?;

        if !self.differences.is_empty() {
            writeln!(f, "\nDifferences:")?;
            for diff in &self.differences {
                writeln!(f, "  [{}] {}", diff.severity(), diff)?;
            }
        }

        Ok(())
    }
}

/// Compares two versions of a type, matching members by name
pub struct TypeComparator {
    /// Report recorded offset changes of shared fields
    compare_offsets: bool,
    /// Report type reference changes of shared fields
    compare_types: bool,
    /// Report base list and total size changes
    report_informational: bool,
}

impl TypeComparator {
    pub fn new() -> Self {
        Self {
            compare_offsets: true,
            compare_types: true,
            report_informational: true,
        }
    }

    pub fn with_offset_comparison(mut self, enabled: bool) -> Self {
        self.compare_offsets = enabled;
        self
    }

    pub fn with_type_comparison(mut self, enabled: bool) -> Self {
        self.compare_types = enabled;
        self
    }

    pub fn with_informational(mut self, enabled: bool) -> Self {
        self.report_informational = enabled;
        self
    }

    pub fn compare(&self, old: &ResolvedType, new: &ResolvedType) -> Result<TypeDiff, DiffError> {
        if old.is_enum() != new.is_enum() {
            return Err(DiffError::KindMismatch {
                qualified: new.qualified.clone(),
                old: old.kind,
                new: new.kind,
            });
        }
        let mut diff = TypeDiff::new(&new.qualified);
        if old.is_enum() {
            self.compare_enumerators(old, new, &mut diff);
        } else {
            self.compare_records(old, new, &mut diff);
        }
        Ok(diff)
    }

    fn compare_records(&self, old: &ResolvedType, new: &ResolvedType, diff: &mut TypeDiff) {
        if self.report_informational {
            let old_bases: Vec<String> = old.bases.iter().map(|b| b.ty.spelling.clone()).collect();
            let new_bases: Vec<String> = new.bases.iter().map(|b| b.ty.spelling.clone()).collect();
            if old_bases != new_bases {
                diff.add_difference(TypeDifference::BasesChanged { old_bases, new_bases });
            }
            if old.size() != new.size() {
                diff.add_difference(TypeDifference::SizeChanged {
                    old_size: old.size(),
                    new_size: new.size(),
                });
            }
        }

        let new_by_name: AHashMap<&str, &ResolvedField> = new.fields.iter().map(|f| (f.name.as_str(), f)).collect();
        let old_by_name: AHashMap<&str, &ResolvedField> = old.fields.iter().map(|f| (f.name.as_str(), f)).collect();

        // Duplicate names keep the later declaration, as lookups do.
        for field in old.fields.iter().filter(|f| is_last(&old_by_name, *f)) {
            let other = match new_by_name.get(field.name.as_str()) {
                Some(other) => other,
                None => {
                    diff.add_difference(TypeDifference::FieldRemoved {
                        name: field.name.clone(),
                        ty: field_type(field),
                        offset: field.offset,
                    });
                    continue;
                }
            };
            let mut changed = false;
            let (old_type, new_type) = (field_type(field), field_type(other));
            if self.compare_types && old_type != new_type {
                diff.add_difference(TypeDifference::FieldTypeChanged {
                    name: field.name.clone(),
                    old_type,
                    new_type,
                });
                changed = true;
            }
            if self.compare_offsets && field.offset != other.offset {
                diff.add_difference(TypeDifference::FieldMoved {
                    name: field.name.clone(),
                    old_offset: field.offset,
                    new_offset: other.offset,
                    explicit: field.explicit_offset.is_some() && other.explicit_offset.is_some(),
                });
                changed = true;
            }
            if !changed {
                diff.unchanged.push(field.name.clone());
            }
        }

        for field in new.fields.iter().filter(|f| is_last(&new_by_name, *f)) {
            if !old_by_name.contains_key(field.name.as_str()) {
                diff.add_difference(TypeDifference::FieldAdded {
                    name: field.name.clone(),
                    ty: field_type(field),
                    offset: field.offset,
                });
            }
        }
    }

    fn compare_enumerators(&self, old: &ResolvedType, new: &ResolvedType, diff: &mut TypeDiff) {
        let old_by_name: AHashMap<&str, &ResolvedEnumerator> =
            old.enumerators.iter().map(|e| (e.name.as_str(), e)).collect();
        let new_by_name: AHashMap<&str, &ResolvedEnumerator> =
            new.enumerators.iter().map(|e| (e.name.as_str(), e)).collect();

        for enumerator in old.enumerators.iter().filter(|e| is_last(&old_by_name, *e)) {
            let value = enumerator.value.to_string();
            match new_by_name.get(enumerator.name.as_str()).map(|e| e.value.to_string()) {
                None => diff.add_difference(TypeDifference::EnumeratorRemoved {
                    name: enumerator.name.clone(),
                    value,
                }),
                Some(new_value) if new_value != value => diff.add_difference(TypeDifference::EnumeratorValueChanged {
                    name: enumerator.name.clone(),
                    old_value: value,
                    new_value,
                }),
                Some(_) => diff.unchanged.push(enumerator.name.clone()),
            }
        }

        for enumerator in new.enumerators.iter().filter(|e| is_last(&new_by_name, *e)) {
            if !old_by_name.contains_key(enumerator.name.as_str()) {
                diff.add_difference(TypeDifference::EnumeratorAdded {
                    name: enumerator.name.clone(),
                    value: enumerator.value.to_string(),
                });
            }
        }
    }
}

impl Default for TypeComparator {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `member` is the declaration its name resolves to.
fn is_last<T: Named>(by_name: &AHashMap<&str, &T>, member: &T) -> bool {
    by_name
        .get(member.name())
        .map_or(true, |last| std::ptr::eq(*last, member))
}

trait Named {
    fn name(&self) -> &str;
}

impl Named for ResolvedField {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ResolvedEnumerator {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Field type with its array and bit-field suffixes, as compared.
fn field_type(field: &ResolvedField) -> String {
    let dims = field
        .array
        .iter()
        .map(|dim| match dim {
            ArrayDim::Fixed(n) => format!("[{}]", n),
            ArrayDim::Dependent(expr) => format!("[{}]", expr),
        })
        .join("");
    match field.bit_width {
        Some(width) => format!("{}{} : {}", field.ty, dims, width),
        None => format!("{}{}", field.ty, dims),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::{analyze_snapshot, SourceText};

    fn resolve(source: &str, qualified: &str) -> ResolvedType {
        let model = analyze_snapshot("s", &[SourceText::new("a.hpp", source)], &Config::default().with_parallel(false));
        model.get(qualified).cloned().unwrap()
    }

    fn compare(old: &str, new: &str, qualified: &str) -> TypeDiff {
        TypeComparator::new()
            .compare(&resolve(old, qualified), &resolve(new, qualified))
            .unwrap()
    }

    #[test]
    fn test_trailing_additions_only() {
        let diff = compare(
            "struct Player { int hp; float speed; void* owner; };",
            "struct Player { int hp; float speed; void* owner; uint32_t flags; bool alive; };",
            "Player",
        );
        assert_eq!(diff.added_fields(), vec!["flags", "alive"]);
        assert!(diff.removed_fields().is_empty());
        assert!(diff.modified_fields().is_empty());
        assert_eq!(diff.unchanged, vec!["hp", "speed", "owner"]);
        assert!(!diff.has_breaking_changes());
        assert!(diff.differences.iter().all(|d| d.severity() <= DifferenceSeverity::Minor));
    }

    #[test]
    fn test_inserted_field_moves_the_rest() {
        let diff = compare(
            "struct Player { int hp; int armor; };",
            "struct Player { int hp; double shield; int armor; };",
            "Player",
        );
        assert_eq!(diff.added_fields(), vec!["shield"]);
        assert_eq!(diff.modified_fields(), vec!["armor"]);
        assert!(diff.differences.iter().any(|d| matches!(
            d,
            TypeDifference::FieldMoved { old_offset: Some(4), new_offset: Some(16), explicit: false, .. }
        )));
        assert!(!diff.is_abi_compatible);
    }

    #[test]
    fn test_type_change_and_removal() {
        let diff = compare(
            "struct Slot { DynArray<int> items; uint8_t pad[4]; int legacy; };",
            "struct Slot { DynArray<float> items; uint8_t pad[8]; };",
            "Slot",
        );
        assert_eq!(diff.removed_fields(), vec!["legacy"]);
        assert_eq!(diff.modified_fields(), vec!["items", "pad"]);
        assert!(diff.has_breaking_changes());
    }

    #[test]
    fn test_enum_changes() {
        let diff = compare(
            "enum class EShape { Rectangle, Circle, Triangle, Count };",
            "enum class EShape { Rectangle, Circle, Hexagon, Triangle, Count };",
            "EShape",
        );
        assert_eq!(diff.breaking_changes().len(), 2);
        assert!(diff.differences.contains(&TypeDifference::EnumeratorAdded {
            name: "Hexagon".to_string(),
            value: "2".to_string(),
        }));
        assert!(diff.differences.contains(&TypeDifference::EnumeratorValueChanged {
            name: "Count".to_string(),
            old_value: "3".to_string(),
            new_value: "4".to_string(),
        }));
        assert_eq!(diff.unchanged, vec!["Rectangle", "Circle"]);
    }

    #[test]
    fn test_kind_mismatch() {
        let result = TypeComparator::new().compare(
            &resolve("struct Mode { int x; };", "Mode"),
            &resolve("enum class Mode { A };", "Mode"),
        );
        assert!(matches!(result, Err(DiffError::KindMismatch { .. })));
    }

    #[test]
    fn test_informational_toggle() {
        let old = resolve("struct Base {}; struct Item { int id; };", "Item");
        let new = resolve("struct Base { int x; }; struct Item : Base { int id; };", "Item");
        let full = TypeComparator::new().compare(&old, &new).unwrap();
        assert!(full.differences.iter().any(|d| matches!(d, TypeDifference::BasesChanged { .. })));
        assert!(full.differences.iter().any(|d| matches!(d, TypeDifference::SizeChanged { .. })));
        let quiet = TypeComparator::new().with_informational(false).compare(&old, &new).unwrap();
        assert_eq!(quiet.modified_fields(), vec!["id"]);
        assert_eq!(quiet.differences.len(), 1);
    }

    #[test]
    fn test_duplicate_names_compare_later_declaration() {
        let diff = compare(
            "struct Pool { int pool; int count; int pool; };",
            "struct Pool { int pool; int count; float pool; };",
            "Pool",
        );
        assert_eq!(diff.modified_fields(), vec!["pool"]);
        assert_eq!(diff.differences.len(), 1);
        assert_eq!(diff.unchanged, vec!["count"]);

        let same = compare(
            "enum class EMode { A, B, A };",
            "enum class EMode { A, B, A };",
            "EMode",
        );
        assert!(same.is_empty());
        assert_eq!(same.unchanged, vec!["B", "A"]);
    }

    #[test]
    fn test_comparison_toggles_and_grouping() {
        let old = resolve("struct S { int a; int b; };", "S");
        let new = resolve("struct S { float a; int pad; int b; };", "S");

        let full = TypeComparator::new().compare(&old, &new).unwrap();
        let groups = full.group_by_severity();
        assert_eq!(groups[&DifferenceSeverity::Breaking].len(), 1);
        assert_eq!(groups[&DifferenceSeverity::Moderate].len(), 1);
        assert_eq!(groups[&DifferenceSeverity::Minor].len(), 1);
        assert_eq!(groups[&DifferenceSeverity::Informational].len(), 1);

        let layout_only = TypeComparator::new()
            .with_type_comparison(false)
            .with_informational(false)
            .compare(&old, &new)
            .unwrap();
        assert_eq!(layout_only.modified_fields(), vec!["b"]);
        assert!(!layout_only.has_breaking_changes());

        let names_only = TypeComparator::new()
            .with_type_comparison(false)
            .with_offset_comparison(false)
            .with_informational(false)
            .compare(&old, &new)
            .unwrap();
        assert_eq!(names_only.added_fields(), vec!["pad"]);
        assert_eq!(names_only.differences.len(), 1);
        assert_eq!(names_only.unchanged, vec!["a", "b"]);
    }
}
