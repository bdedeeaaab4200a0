// Tue Oct 13 2026 - Alex

use super::builder::TypeEntry;
use super::symbol::{DeclKey, Registration, ScopeHit, SymbolEntry, SymbolKind, SymbolRef, TypeId};
use crate::diagnostic::{Diagnostic, DiagnosticKind, SourceLocation};
use crate::parser::QualifiedName;
use ahash::{AHashMap, AHashSet};
use log::debug;

/// A frozen batch of declarations: read-only, shareable across resolver
/// threads.
#[derive(Debug)]
pub struct Snapshot {
    id: String,
    files: Vec<String>,
    types: Vec<TypeEntry>,
    by_key: AHashMap<DeclKey, TypeId>,
    symbols: AHashMap<String, SymbolEntry>,
    diagnostics: Vec<Diagnostic>,
}

impl Snapshot {
    /// Builds the frozen view from sorted registrations. Duplicate type
    /// definitions keep the later one; the earlier is dropped together with
    /// its members and nested types.
    pub(crate) fn assemble(
        id: String,
        files: Vec<String>,
        types: Vec<TypeEntry>,
        names: AHashMap<String, Vec<Registration>>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let mut last_by_name: AHashMap<&str, usize> = AHashMap::new();
        for (index, entry) in types.iter().enumerate() {
            last_by_name.insert(entry.qualified.as_str(), index);
        }

        let mut dropped = AHashSet::new();
        for (index, entry) in types.iter().enumerate() {
            let parent_dropped = entry.parent.is_some_and(|p| dropped.contains(&p));
            let superseded = last_by_name[entry.qualified.as_str()] != index;
            if superseded && !parent_dropped {
                let winner = &types[last_by_name[entry.qualified.as_str()]];
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateDefinition,
                    format!(
                        "`{}` is defined again at {}; this definition is dropped",
                        entry.qualified,
                        winner.location()
                    ),
                    entry.location(),
                ));
            }
            if superseded || parent_dropped {
                dropped.insert(entry.key);
            }
        }

        let types: Vec<TypeEntry> = types.into_iter().filter(|t| !dropped.contains(&t.key)).collect();
        let by_key: AHashMap<DeclKey, TypeId> = types
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.key, TypeId(index as u32)))
            .collect();

        let mut snapshot = Self {
            id,
            files,
            types,
            by_key,
            symbols: AHashMap::new(),
            diagnostics: Vec::new(),
        };

        let mut names: Vec<(String, Vec<Registration>)> = names.into_iter().collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, registrations) in names {
            let mut entry = SymbolEntry::default();
            let mut strong = Vec::new();
            for registration in registrations {
                let owner = match snapshot.by_key.get(&registration.owner) {
                    Some(owner) => *owner,
                    None => continue,
                };
                let symbol = match registration.kind {
                    SymbolKind::Type => SymbolRef::Type(owner),
                    SymbolKind::Field => SymbolRef::Field {
                        owner,
                        index: registration.index,
                    },
                    SymbolKind::Enumerator => SymbolRef::Enumerator {
                        owner,
                        index: registration.index,
                    },
                    SymbolKind::Constant => SymbolRef::Constant {
                        owner,
                        index: registration.index,
                    },
                };
                if registration.weak {
                    entry.weak.push(symbol);
                } else {
                    strong.push(symbol);
                }
            }
            if let Some((last, earlier)) = strong.split_last() {
                for symbol in earlier {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DuplicateDefinition,
                        format!(
                            "`{}` is declared again at {}; lookups use the later declaration",
                            name,
                            snapshot.symbol_location(*last)
                        ),
                        snapshot.symbol_location(*symbol),
                    ));
                }
                entry.primary = Some(*last);
            }
            if entry.primary.is_some() || !entry.weak.is_empty() {
                snapshot.symbols.insert(name, entry);
            }
        }

        debug!(
            "snapshot {}: {} types kept, {} dropped, {} names",
            snapshot.id,
            snapshot.types.len(),
            dropped.len(),
            snapshot.symbols.len()
        );
        snapshot.diagnostics = diagnostics;
        snapshot
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn types(&self) -> &[TypeEntry] {
        &self.types
    }

    pub fn get(&self, id: TypeId) -> &TypeEntry {
        &self.types[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len()).map(|i| TypeId(i as u32))
    }

    pub fn id_of(&self, key: DeclKey) -> Option<TypeId> {
        self.by_key.get(&key).copied()
    }

    pub fn parent_of(&self, id: TypeId) -> Option<TypeId> {
        self.get(id).parent.and_then(|key| self.id_of(key))
    }

    /// Types declared directly at namespace scope, in declaration order.
    pub fn top_level(&self) -> Vec<TypeId> {
        self.ids().filter(|id| self.get(*id).parent.is_none()).collect()
    }

    /// The type itself followed by everything nested inside it, preorder.
    pub fn with_nested(&self, root: TypeId) -> Vec<TypeId> {
        let mut result = vec![root];
        let mut cursor = 0;
        while cursor < result.len() {
            let key = self.get(result[cursor]).key;
            result.extend(self.ids().filter(|id| self.get(*id).parent == Some(key)));
            cursor += 1;
        }
        result.sort();
        result
    }

    /// Diagnostics from parsing and from the registration barrier.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn find(&self, qualified: &str) -> Option<TypeId> {
        match self.symbols.get(qualified)?.primary? {
            SymbolRef::Type(id) => Some(id),
            _ => None,
        }
    }

    /// Looks `name` up from `scope`, innermost scope first. Strong
    /// definitions shadow injected enumerators at the same level.
    pub fn lookup(&self, name: &QualifiedName, scope: &[String]) -> ScopeHit {
        self.lookup_where(name, scope, |_| true)
    }

    /// Like `lookup`, but only types count; a field named like a type does
    /// not hide it.
    pub fn lookup_type(&self, name: &QualifiedName, scope: &[String]) -> Option<TypeId> {
        match self.lookup_where(name, scope, |symbol| symbol.kind() == SymbolKind::Type) {
            ScopeHit::Found(SymbolRef::Type(id)) => Some(id),
            _ => None,
        }
    }

    fn lookup_where(&self, name: &QualifiedName, scope: &[String], accept: impl Fn(&SymbolRef) -> bool) -> ScopeHit {
        let joined = name.joined();
        let depth = if name.global { 0 } else { scope.len() };
        for level in (0..=depth).rev() {
            let candidate = if level == 0 {
                joined.clone()
            } else {
                format!("{}::{}", scope[..level].join("::"), joined)
            };
            let entry = match self.symbols.get(&candidate) {
                Some(entry) => entry,
                None => continue,
            };
            if let Some(primary) = entry.primary.filter(|p| accept(p)) {
                return ScopeHit::Found(primary);
            }
            let weak: Vec<SymbolRef> = entry.weak.iter().copied().filter(|w| accept(w)).collect();
            match weak.len() {
                0 => continue,
                1 => return ScopeHit::Found(weak[0]),
                candidates => {
                    return ScopeHit::Ambiguous {
                        first: weak[0],
                        candidates,
                    }
                }
            }
        }
        ScopeHit::Missing
    }

    pub fn symbol_location(&self, symbol: SymbolRef) -> SourceLocation {
        let entry = self.get(symbol.owner());
        let span = match (symbol, &entry.body) {
            (SymbolRef::Field { index, .. }, super::builder::TypeBody::Record(record)) => record.fields[index].span,
            (SymbolRef::Constant { index, .. }, super::builder::TypeBody::Record(record)) => record.constants[index].span,
            (SymbolRef::Enumerator { index, .. }, super::builder::TypeBody::Enum(decl)) => decl.enumerators[index].span,
            _ => entry.span,
        };
        SourceLocation::new(&entry.file, span)
    }

    /// Readable name of a symbol for messages.
    pub fn describe(&self, symbol: SymbolRef) -> String {
        let entry = self.get(symbol.owner());
        let member = match (symbol, &entry.body) {
            (SymbolRef::Field { index, .. }, super::builder::TypeBody::Record(record)) => record.fields[index].name.as_str(),
            (SymbolRef::Constant { index, .. }, super::builder::TypeBody::Record(record)) => record.constants[index].name.as_str(),
            (SymbolRef::Enumerator { index, .. }, super::builder::TypeBody::Enum(decl)) => decl.enumerators[index].name.as_str(),
            _ => return entry.qualified.clone(),
        };
        format!("{}::{}", entry.qualified, member)
    }
}
