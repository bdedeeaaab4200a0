// Thu Oct 15 2026 - Alex

use super::alignment::Alignment;
use super::bindings::{BindingScope, Bound, Bindings};
use super::cache::{InstanceKey, LayoutCache};
use super::layout::{MemberLayout, RecordLayout};
use crate::config::{AbiConfig, Config};
use crate::diagnostic::{Diagnostic, DiagnosticKind, SourceLocation};
use crate::eval::{Evaluator, ResolvedValue, ScalarType};
use crate::parser::{Expr, ExprKind, TemplateArg, TemplateParamKind};
use crate::registry::{
    ArrayDim, ResolvedArg, ResolvedField, ResolvedType, ResolvedTypeRef, Snapshot, TypeId, TypeKind, TypeTarget,
};
use log::trace;

/// Deepest chain of by-value instantiations followed before giving up.
const MAX_DEPTH: usize = 64;

/// Computes record layouts from resolved types and the ABI table.
///
/// Each call to `layout` is the owner pass of one record and the only
/// place its layout diagnostics come from. Records reached as bases or
/// by-value members are laid out quietly and cached, so the engine can be
/// shared by all layout threads.
pub struct LayoutEngine<'m> {
    types: &'m [ResolvedType],
    snapshot: &'m Snapshot,
    abi: &'m AbiConfig,
    explicit_authoritative: bool,
    cache: LayoutCache,
}

/// Running state while members are placed.
struct Cursor {
    /// Next free byte; `None` while inference is paused.
    offset: Option<u64>,
    alignment: Alignment,
    /// End of the largest union member so far.
    union_end: Option<u64>,
    last_explicit: Option<u64>,
    bits: Option<BitRun>,
    incomplete: bool,
}

/// Storage unit currently being filled with bit-fields.
struct BitRun {
    offset: u64,
    unit: u64,
    used: u32,
}

impl<'m> LayoutEngine<'m> {
    /// `types` is indexed by `TypeId`.
    pub fn new(types: &'m [ResolvedType], snapshot: &'m Snapshot, config: &'m Config) -> Self {
        Self {
            types,
            snapshot,
            abi: &config.abi,
            explicit_authoritative: config.explicit_offsets_authoritative,
            cache: LayoutCache::new(),
        }
    }

    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    /// Lays out one record. Enums and records that depend on template
    /// parameters have no layout of their own.
    pub fn layout(&self, id: TypeId) -> Option<(RecordLayout, Vec<Diagnostic>)> {
        let ty = &self.types[id.index()];
        if ty.is_enum() || self.is_dependent(id) {
            return None;
        }
        let mut diagnostics = Vec::new();
        let mut stack = vec![InstanceKey::plain(id)];
        let layout = self.build(ty, &Bindings::default(), &mut stack, Some(&mut diagnostics));
        trace!("laid out {}: {:?} bytes", ty.qualified, layout.size);
        Some((layout, diagnostics))
    }

    /// Declared inside a template, or a template itself.
    fn is_dependent(&self, id: TypeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.types[current.index()].is_template() {
                return true;
            }
            cursor = self.snapshot.parent_of(current);
        }
        false
    }

    fn instance(&self, id: TypeId, bindings: Bindings, stack: &mut Vec<InstanceKey>) -> RecordLayout {
        let key = InstanceKey {
            id,
            args: bindings.key(),
        };
        if let Some(layout) = self.cache.get(&key) {
            return layout;
        }
        if stack.contains(&key) || stack.len() >= MAX_DEPTH {
            // Contains itself by value.
            return RecordLayout::new();
        }
        stack.push(key.clone());
        let layout = self.build(&self.types[id.index()], &bindings, stack, None);
        stack.pop();
        self.cache.insert(key, layout.clone());
        layout
    }

    /// Layout of the record a (substituted) reference names, instantiating
    /// templates with its arguments.
    fn record_layout(&self, ty: &ResolvedTypeRef, outer: &Bindings, stack: &mut Vec<InstanceKey>) -> Option<RecordLayout> {
        let id = ty.declared()?;
        let target = &self.types[id.index()];
        if target.is_enum() {
            return None;
        }
        let bindings = if target.is_template() {
            self.bind(target, &ty.args, outer)
        } else if self.is_dependent(id) {
            outer.clone()
        } else {
            Bindings::default()
        };
        Some(self.instance(id, bindings, stack))
    }

    fn bind(&self, record: &ResolvedType, args: &[ResolvedArg], outer: &Bindings) -> Bindings {
        let mut bindings = match self.snapshot.parent_of(record.id) {
            Some(parent) if self.is_dependent(parent) => outer.clone(),
            _ => Bindings::default(),
        };
        let scope = self.snapshot.get(record.id).scope();
        for (index, param) in record.template_params.iter().enumerate() {
            let bound = match args.get(index) {
                Some(ResolvedArg::Type(ty)) => Some(Bound::Type(ty.clone())),
                Some(ResolvedArg::Value(value)) => Some(Bound::Value(*value)),
                Some(ResolvedArg::Dependent(_)) => None,
                None => param.default.as_ref().and_then(|default| {
                    let value_param = matches!(param.kind, TemplateParamKind::Value(_));
                    self.default_arg(default, value_param, &bindings, &scope)
                }),
            };
            if let Some(bound) = bound {
                bindings.bind(&param.name, bound);
            }
        }
        bindings
    }

    fn default_arg(&self, default: &TemplateArg, value_param: bool, bindings: &Bindings, scope: &[String]) -> Option<Bound> {
        match default {
            TemplateArg::Value(expr) => self.evaluate(expr, bindings, scope).map(Bound::Value),
            TemplateArg::Type(ty) if value_param => {
                let expr = Expr::new(ExprKind::Name(ty.base_name().clone()), Default::default());
                self.evaluate(&expr, bindings, scope).map(Bound::Value)
            }
            TemplateArg::Type(ty) => {
                let name = ty.base_name();
                let joined = name.joined();
                let target = if name.is_simple() && bindings.get(&joined).is_some() {
                    TypeTarget::TemplateParam { name: joined }
                } else if let Some(scalar) = ScalarType::from_name(&joined) {
                    TypeTarget::Scalar { scalar }
                } else if let Some(id) = self.snapshot.lookup_type(name, scope).filter(|_| ty.args().is_empty()) {
                    TypeTarget::Declared {
                        id,
                        qualified: self.types[id.index()].qualified.clone(),
                    }
                } else if self.abi.container(name.last()).is_some() {
                    TypeTarget::Container {
                        name: name.last().to_string(),
                    }
                } else {
                    TypeTarget::Opaque
                };
                let resolved = ResolvedTypeRef {
                    spelling: ty.to_string(),
                    target,
                    args: Vec::new(),
                    pointer_depth: ty.pointer_depth,
                    reference: ty.reference,
                    is_const: ty.is_const,
                };
                Some(Bound::Type(bindings.substitute(&resolved)))
            }
        }
    }

    /// Evaluates a dependent expression; any issue makes it unknown.
    fn evaluate(&self, expr: &Expr, bindings: &Bindings, scope: &[String]) -> Option<ResolvedValue> {
        let names = BindingScope {
            bindings,
            types: self.types,
            snapshot: self.snapshot,
            scope: scope.to_vec(),
        };
        let mut evaluator = Evaluator::new(&names);
        let value = evaluator.evaluate(expr);
        if evaluator.issues().is_empty() {
            Some(value)
        } else {
            None
        }
    }

    /// Size and alignment of a by-value use of a type.
    fn size_of(&self, ty: &ResolvedTypeRef, bindings: &Bindings, stack: &mut Vec<InstanceKey>) -> Option<(u64, Alignment)> {
        let pointer = self.abi.pointer_size;
        if ty.is_indirect() {
            return Some((pointer, self.align(pointer)));
        }
        match &ty.target {
            TypeTarget::Scalar { scalar: ScalarType::Void } => None,
            TypeTarget::Scalar { scalar } => Some((scalar.size(pointer), self.align(scalar.alignment(pointer)))),
            TypeTarget::Declared { id, .. } => {
                let target = &self.types[id.index()];
                if target.is_enum() {
                    let storage = target.storage.unwrap_or(ScalarType::I32);
                    return Some((storage.size(pointer), self.align(storage.alignment(pointer))));
                }
                let layout = self.record_layout(ty, bindings, stack)?;
                Some((layout.size?, layout.alignment))
            }
            TypeTarget::Container { name } => self
                .abi
                .container(name)
                .map(|container| (container.size, self.align(container.alignment))),
            TypeTarget::TemplateParam { .. } | TypeTarget::Opaque => None,
        }
    }

    fn align(&self, alignment: u64) -> Alignment {
        Alignment::new(self.abi.clamp_alignment(alignment))
    }

    fn element_count(&self, field: &ResolvedField, bindings: &Bindings, scope: &[String]) -> Option<u64> {
        field.array.iter().try_fold(1u64, |count, dim| {
            let length = match dim {
                ArrayDim::Fixed(length) => *length,
                ArrayDim::Dependent(expr) => {
                    let value = self.evaluate(expr, bindings, scope)?.as_i128()?;
                    u64::try_from(value).ok()?
                }
            };
            count.checked_mul(length)
        })
    }

    fn build(
        &self,
        ty: &ResolvedType,
        bindings: &Bindings,
        stack: &mut Vec<InstanceKey>,
        mut report: Option<&mut Vec<Diagnostic>>,
    ) -> RecordLayout {
        let is_union = ty.kind == TypeKind::Union;
        let scope = self.snapshot.get(ty.id).scope();
        let mut layout = RecordLayout::new();
        let mut cursor = Cursor {
            offset: Some(0),
            alignment: Alignment::default(),
            union_end: Some(0),
            last_explicit: None,
            bits: None,
            incomplete: false,
        };

        let bases: Vec<(String, Option<RecordLayout>)> = ty
            .bases
            .iter()
            .map(|base| {
                let base_ty = bindings.substitute(&base.ty);
                let layout = self.record_layout(&base_ty, bindings, stack);
                (base_ty.spelling.clone(), layout)
            })
            .collect();

        let base_vptr = bases.iter().any(|(_, base)| base.as_ref().map_or(false, |b| b.has_vptr));
        layout.has_vptr = base_vptr || ty.declares_virtual;
        if ty.declares_virtual && !base_vptr {
            let pointer = self.abi.pointer_size;
            cursor.offset = Some(pointer);
            cursor.alignment = self.align(pointer);
        }

        for (name, base) in bases {
            let base = match base {
                Some(base) if base.size.is_some() => base,
                _ => {
                    self.pause(&mut cursor, ty, &format!("base `{}`", name), &ty.location, report.as_deref_mut());
                    continue;
                }
            };
            if base.is_empty() {
                continue;
            }
            cursor.alignment = cursor.alignment.max(base.alignment);
            let start = cursor.offset.map(|offset| base.alignment.align(offset));
            for member in &base.members {
                layout.members.push(MemberLayout {
                    inherited: true,
                    offset: start.and_then(|s| member.offset.map(|o| s + o)),
                    inferred: start.and_then(|s| member.inferred.map(|o| s + o)),
                    ..member.clone()
                });
            }
            cursor.offset = match (start, base.size) {
                (Some(start), Some(size)) => Some(start + size),
                _ => None,
            };
        }

        for field in ty.fields.iter().filter(|f| !f.is_static) {
            let field_ty = bindings.substitute(&field.ty);
            let element = self.size_of(&field_ty, bindings, stack);
            let count = self.element_count(field, bindings, &scope);
            let alignment = element.map_or(Alignment::default(), |(_, a)| a);
            let size = match (element, count) {
                (Some((size, _)), Some(count)) => size.checked_mul(count),
                _ => None,
            };
            cursor.alignment = cursor.alignment.max(alignment);

            let (inferred, bit_offset) = match (field.bit_width, element) {
                (Some(width), Some((unit, _))) => self.place_bits(&mut cursor, width, unit, alignment, is_union),
                _ => {
                    cursor.bits = None;
                    let inferred = if is_union { Some(0) } else { cursor.offset.map(|o| alignment.align(o)) };
                    (inferred, None)
                }
            };

            let explicit = field.explicit_offset;
            if let Some(report) = report.as_deref_mut() {
                self.check_explicit(&cursor, ty, field, inferred, is_union, report);
            }
            if !is_union {
                if let Some(explicit) = explicit {
                    cursor.last_explicit = Some(explicit);
                }
            }
            let recorded = match explicit {
                Some(explicit) if self.explicit_authoritative || inferred.is_none() => Some(explicit),
                _ => inferred,
            };

            let unit_size = match (field.bit_width, element) {
                (Some(_), Some((unit, _))) => Some(unit),
                _ => size,
            };
            if unit_size.is_none() {
                let what = format!("field `{}` of type `{}`", field.name, field_ty.spelling);
                self.pause(&mut cursor, ty, &what, &field.location, report.as_deref_mut());
            }

            if is_union {
                cursor.union_end = match (cursor.union_end, unit_size) {
                    (Some(end), Some(size)) => Some(end.max(size)),
                    _ => None,
                };
            } else if bit_offset.is_none() || bit_offset == Some(0) || recorded != inferred {
                cursor.offset = match (recorded, unit_size) {
                    (Some(offset), Some(size)) => Some(offset + size),
                    _ => None,
                };
                if let (Some(run), Some(offset)) = (cursor.bits.as_mut(), recorded) {
                    run.offset = offset;
                }
            }

            layout.members.push(MemberLayout {
                name: field.name.clone(),
                declared_in: ty.qualified.clone(),
                inherited: false,
                offset: recorded,
                inferred,
                explicit,
                size: unit_size,
                bit_offset,
                bit_width: field.bit_width,
            });
        }

        layout.alignment = cursor.alignment;
        let end = if is_union { cursor.union_end } else { cursor.offset };
        layout.size = end.map(|end| {
            let end = if layout.is_empty() { 1 } else { end };
            layout.alignment.align(end)
        });
        layout
    }

    /// Places a bit-field, packing it into the open storage unit when it
    /// fits. Returns the unit's offset and the bit position inside it.
    fn place_bits(&self, cursor: &mut Cursor, width: u32, unit: u64, alignment: Alignment, is_union: bool) -> (Option<u64>, Option<u32>) {
        if is_union {
            return (Some(0), Some(0));
        }
        let capacity = (unit * 8) as u32;
        if width > 0 {
            if let Some(run) = cursor.bits.as_mut() {
                if run.unit == unit && run.used + width <= capacity {
                    let position = run.used;
                    run.used += width;
                    return (Some(run.offset), Some(position));
                }
            }
        }
        let offset = cursor.offset.map(|o| alignment.align(o));
        cursor.bits = match (offset, width) {
            (Some(offset), w) if w > 0 => Some(BitRun { offset, unit, used: width }),
            _ => None,
        };
        (offset, Some(0))
    }

    fn check_explicit(&self, cursor: &Cursor, ty: &ResolvedType, field: &ResolvedField, inferred: Option<u64>, is_union: bool, report: &mut Vec<Diagnostic>) {
        let explicit = match field.explicit_offset {
            Some(explicit) => explicit,
            None => return,
        };
        if let Some(inferred) = inferred {
            if inferred != explicit {
                report.push(Diagnostic::new(
                    DiagnosticKind::OffsetMismatch,
                    format!(
                        "`{}::{}` is annotated at 0x{:X} but the layout puts it at 0x{:X}",
                        ty.qualified, field.name, explicit, inferred
                    ),
                    field.location.clone(),
                ));
            }
        }
        if let Some(last) = cursor.last_explicit {
            if !is_union && explicit < last {
                report.push(Diagnostic::new(
                    DiagnosticKind::NonMonotonicOffset,
                    format!(
                        "`{}::{}` is annotated at 0x{:X}, before the previous annotation 0x{:X}",
                        ty.qualified, field.name, explicit, last
                    ),
                    field.location.clone(),
                ));
            }
        }
    }

    /// Stops inference until the next annotation, noting the first cause.
    fn pause(&self, cursor: &mut Cursor, ty: &ResolvedType, what: &str, location: &SourceLocation, report: Option<&mut Vec<Diagnostic>>) {
        cursor.offset = None;
        cursor.bits = None;
        if cursor.incomplete {
            return;
        }
        cursor.incomplete = true;
        if let Some(report) = report {
            report.push(Diagnostic::new(
                DiagnosticKind::IncompleteLayout,
                format!(
                    "layout of `{}` is incomplete: size of {} is unknown; later offsets come from annotations only",
                    ty.qualified, what
                ),
                location.clone(),
            ));
        }
    }
}

/// Stores a computed layout on its type and copies recorded offsets onto
/// the type's own fields.
pub fn apply_layout(ty: &mut ResolvedType, layout: RecordLayout) {
    let offsets: Vec<Option<u64>> = layout.own_members().map(|member| member.offset).collect();
    for (field, offset) in ty.fields.iter_mut().filter(|f| !f.is_static).zip(offsets) {
        field.offset = offset;
    }
    ty.layout = Some(layout);
}

/// Records annotated offsets on a type that gets no computed layout, such
/// as a template or a record nested in one.
pub fn apply_explicit_offsets(ty: &mut ResolvedType) {
    for field in ty.fields.iter_mut().filter(|f| !f.is_static && f.offset.is_none()) {
        field.offset = field.explicit_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::registry::{Resolver, SnapshotBuilder};

    fn laid_out(source: &str, config: &Config) -> (Vec<ResolvedType>, Vec<Diagnostic>) {
        let builder = SnapshotBuilder::new("test");
        builder.register_file(0, parse_source("test.hpp", source));
        let snapshot = builder.freeze();
        let resolver = Resolver::new(&snapshot, &config.abi);
        let mut types: Vec<ResolvedType> = snapshot.ids().map(|id| resolver.resolve(id).0).collect();

        let engine = LayoutEngine::new(&types, &snapshot, config);
        let mut diagnostics = Vec::new();
        let layouts: Vec<Option<RecordLayout>> = snapshot
            .ids()
            .map(|id| {
                engine.layout(id).map(|(layout, diags)| {
                    diagnostics.extend(diags);
                    layout
                })
            })
            .collect();
        drop(engine);
        for (ty, layout) in types.iter_mut().zip(layouts) {
            if let Some(layout) = layout {
                apply_layout(ty, layout);
            }
        }
        (types, diagnostics)
    }

    fn find<'a>(types: &'a [ResolvedType], name: &str) -> &'a ResolvedType {
        types.iter().find(|t| t.qualified == name).unwrap()
    }

    fn offsets(ty: &ResolvedType) -> Vec<Option<u64>> {
        ty.fields.iter().map(|f| f.offset).collect()
    }

    #[test]
    fn test_annotated_record_offsets() {
        let (types, diagnostics) = laid_out(
            "struct GameApp {\n  void* vtable; // 0\n  uint8_t unk8[0x30 - 0x8]; // 8\n  float dt; // 30\n  bool ready;\n}",
            &Config::default(),
        );
        assert!(diagnostics.is_empty());
        let app = find(&types, "GameApp");
        assert_eq!(offsets(app), vec![Some(0), Some(8), Some(0x30), Some(0x34)]);
        assert_eq!(app.size(), Some(0x38));
        assert_eq!(app.layout.as_ref().unwrap().alignment.as_u64(), 8);
    }

    #[test]
    fn test_mismatch_reported_once_and_explicit_kept() {
        let source = "struct S {\n  int a; // 0\n  int b; // 8\n  int c;\n  int d; // 10\n};";
        let (types, diagnostics) = laid_out(source, &Config::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::OffsetMismatch);
        assert!(diagnostics[0].message.contains("0x8") && diagnostics[0].message.contains("0x4"));
        assert_eq!(offsets(find(&types, "S")), vec![Some(0), Some(8), Some(0xC), Some(0x10)]);

        let advisory = Config::default().with_explicit_offsets_authoritative(false);
        let (types, diagnostics) = laid_out(source, &advisory);
        assert_eq!(diagnostics.iter().filter(|d| d.kind == DiagnosticKind::OffsetMismatch).count(), 2);
        assert_eq!(offsets(find(&types, "S")), vec![Some(0), Some(4), Some(8), Some(0xC)]);
    }

    #[test]
    fn test_non_monotonic_annotation() {
        let (_, diagnostics) = laid_out("struct S { int a; // 8\n int b; // 4\n };", &Config::default());
        assert!(diagnostics.iter().any(|d| d.kind == DiagnosticKind::NonMonotonicOffset));
    }

    #[test]
    fn test_vptr_and_bases() {
        let (types, diagnostics) = laid_out(
            "class Base { public: virtual ~Base(); int id; };\n\
             class Derived : public Base { public: void Tick() override; float x; };\n\
             struct Plain { char tag; };\n\
             class Mixed : public Plain { virtual void Run(); int n; };",
            &Config::default(),
        );
        assert!(diagnostics.is_empty());
        let base = find(&types, "Base");
        assert_eq!(offsets(base), vec![Some(8)]);
        assert_eq!(base.size(), Some(16));

        let derived = find(&types, "Derived");
        let layout = derived.layout.as_ref().unwrap();
        assert!(layout.has_vptr);
        assert_eq!(layout.member("id").unwrap().offset, Some(8));
        assert!(layout.member("id").unwrap().inherited);
        assert_eq!(layout.member("id").unwrap().declared_in, "Base");
        assert_eq!(offsets(derived), vec![Some(16)]);
        assert_eq!(derived.size(), Some(24));

        let mixed = find(&types, "Mixed");
        assert_eq!(mixed.layout.as_ref().unwrap().member("tag").unwrap().offset, Some(8));
        assert_eq!(offsets(mixed), vec![Some(12)]);
    }

    #[test]
    fn test_containers_enums_and_nested_records() {
        let (types, diagnostics) = laid_out(
            "enum class EKind : uint8_t { A, B };\n\
             struct Vec3 { float x, y, z; };\n\
             struct Entity { EKind kind; Vec3 pos; DynArray<Handle<Entity>> children; CName name; HashMap<uint64_t, CString> tags; };",
            &Config::default(),
        );
        assert!(diagnostics.is_empty());
        let entity = find(&types, "Entity");
        assert_eq!(offsets(entity), vec![Some(0), Some(4), Some(0x10), Some(0x20), Some(0x28)]);
        assert_eq!(entity.size(), Some(0x58));
    }

    #[test]
    fn test_bit_fields_and_unions() {
        let (types, _) = laid_out(
            "struct Flags { uint32_t a : 3; uint32_t b : 5; uint32_t c : 30; uint8_t d; };\n\
             union Value { int32_t i; double d; char bytes[12]; };\n\
             struct Empty {};",
            &Config::default(),
        );
        let flags = find(&types, "Flags");
        let layout = flags.layout.as_ref().unwrap();
        assert_eq!(layout.member("b").unwrap().bit_offset, Some(3));
        assert_eq!(offsets(flags), vec![Some(0), Some(0), Some(4), Some(8)]);
        assert_eq!(flags.size(), Some(12));

        let value = find(&types, "Value");
        assert_eq!(offsets(value), vec![Some(0), Some(0), Some(0)]);
        assert_eq!(value.size(), Some(16));

        assert_eq!(find(&types, "Empty").size(), Some(1));
    }

    #[test]
    fn test_unknown_size_pauses_until_annotation() {
        let (types, diagnostics) = laid_out(
            "struct World {\n  int id;\n  CMystery data;\n  int after;\n  int synced; // 40\n  int last;\n};",
            &Config::default(),
        );
        let notes: Vec<_> = diagnostics.iter().filter(|d| d.kind == DiagnosticKind::IncompleteLayout).collect();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("data"));
        assert_eq!(diagnostics.len(), 1);
        let world = find(&types, "World");
        assert_eq!(offsets(world), vec![Some(0), Some(4), None, Some(0x40), Some(0x44)]);
        assert_eq!(world.size(), Some(0x48));
    }

    #[test]
    fn test_template_instantiation() {
        let (types, diagnostics) = laid_out(
            "template<typename T, int N = 2> struct Array { T items[N]; int count; };\n\
             struct Inventory { Array<float, 4> slots; Array<double> pair; int gold; };",
            &Config::default(),
        );
        assert!(diagnostics.is_empty());
        assert!(find(&types, "Array").layout.is_none());
        let inventory = find(&types, "Inventory");
        assert_eq!(offsets(inventory), vec![Some(0), Some(0x18), Some(0x30)]);
        assert_eq!(inventory.size(), Some(0x38));
    }

    #[test]
    fn test_self_containing_record_has_no_size() {
        let (types, _) = laid_out("struct A { B b; }; struct B { A a; int x; }; struct C { A* a; int y; };", &Config::default());
        assert_eq!(find(&types, "A").size(), None);
        assert_eq!(find(&types, "B").size(), None);
        assert_eq!(find(&types, "C").size(), Some(16));
    }
}
