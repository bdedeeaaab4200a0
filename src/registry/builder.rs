// Tue Oct 13 2026 - Alex

use super::snapshot::Snapshot;
use super::symbol::{DeclKey, Registration, SymbolKind};
use crate::diagnostic::{Diagnostic, SourceLocation, Span};
use crate::parser::{Declaration, EnumDecl, ParsedFile, RecordDecl};
use ahash::{AHashMap, RandomState};
use log::{debug, trace};
use parking_lot::Mutex;

const SHARD_COUNT: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Enum(EnumDecl),
    /// Nested declarations are split out into their own entries.
    Record(RecordDecl),
}

/// One enum or record definition, detached from the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeEntry {
    pub key: DeclKey,
    pub name: String,
    pub qualified: String,
    pub namespace: Vec<String>,
    pub parent: Option<DeclKey>,
    pub file: String,
    pub span: Span,
    pub body: TypeBody,
}

impl TypeEntry {
    /// Scope chain used for names inside this type, itself included.
    pub fn scope(&self) -> Vec<String> {
        self.qualified.split("::").map(str::to_string).collect()
    }

    /// Scope the type is declared in.
    pub fn enclosing_scope(&self) -> Vec<String> {
        let mut scope = self.scope();
        scope.pop();
        scope
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(&self.file, self.span)
    }

    pub fn as_record(&self) -> Option<&RecordDecl> {
        match &self.body {
            TypeBody::Record(record) => Some(record),
            TypeBody::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDecl> {
        match &self.body {
            TypeBody::Enum(decl) => Some(decl),
            TypeBody::Record(_) => None,
        }
    }
}

/// Phase one of the registry. Parser tasks register whole files
/// concurrently through `&self`; `freeze` consumes the builder.
pub struct SnapshotBuilder {
    id: String,
    hasher: RandomState,
    shards: Vec<Mutex<AHashMap<String, Vec<Registration>>>>,
    types: Mutex<Vec<TypeEntry>>,
    files: Mutex<Vec<(u32, String)>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl SnapshotBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            hasher: RandomState::with_seeds(0x51, 0x7e, 0x3a, 0x19),
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(AHashMap::new())).collect(),
            types: Mutex::new(Vec::new()),
            files: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registers every type, field, enumerator and constant of one parsed
    /// file. `index` is the file's position in the batch.
    pub fn register_file(&self, index: u32, parsed: ParsedFile) {
        let ParsedFile { file, diagnostics } = parsed;
        let mut walker = FileWalker {
            file_index: index,
            file: file.name.clone(),
            ordinal: 0,
            types: Vec::new(),
            names: Vec::new(),
        };
        let mut namespace = Vec::new();
        walker.walk(file.declarations, &mut namespace, None);

        trace!(
            "registering {}: {} types, {} names",
            file.name,
            walker.types.len(),
            walker.names.len()
        );

        let mut by_shard: Vec<Vec<(String, Registration)>> = (0..SHARD_COUNT).map(|_| Vec::new()).collect();
        for (name, registration) in walker.names {
            by_shard[self.shard_of(&name)].push((name, registration));
        }
        for (shard, entries) in self.shards.iter().zip(by_shard) {
            if entries.is_empty() {
                continue;
            }
            let mut shard = shard.lock();
            for (name, registration) in entries {
                shard.entry(name).or_default().push(registration);
            }
        }

        self.types.lock().extend(walker.types);
        self.files.lock().push((index, file.name));
        self.diagnostics.lock().extend(diagnostics);
    }

    fn shard_of(&self, name: &str) -> usize {
        (self.hasher.hash_one(name) as usize) % SHARD_COUNT
    }

    /// The phase barrier: no registration can happen after this.
    pub fn freeze(self) -> Snapshot {
        let mut names = AHashMap::new();
        for shard in self.shards {
            for (name, mut registrations) in shard.into_inner() {
                registrations.sort_by_key(Registration::sort_key);
                names.insert(name, registrations);
            }
        }
        let mut types = self.types.into_inner();
        types.sort_by_key(|entry| entry.key);
        let mut files = self.files.into_inner();
        files.sort_by_key(|(index, _)| *index);
        let files = files.into_iter().map(|(_, name)| name).collect();

        debug!("freezing snapshot {} with {} types", self.id, types.len());
        Snapshot::assemble(self.id, files, types, names, self.diagnostics.into_inner())
    }
}

struct FileWalker {
    file_index: u32,
    file: String,
    ordinal: u32,
    types: Vec<TypeEntry>,
    names: Vec<(String, Registration)>,
}

impl FileWalker {
    fn next_key(&mut self) -> DeclKey {
        let key = DeclKey::new(self.file_index, self.ordinal);
        self.ordinal += 1;
        key
    }

    fn walk(&mut self, declarations: Vec<Declaration>, namespace: &mut Vec<String>, parent: Option<(DeclKey, &str)>) {
        for declaration in declarations {
            match declaration {
                Declaration::Namespace(ns) => {
                    let depth = namespace.len();
                    namespace.extend(ns.path);
                    self.walk(ns.declarations, namespace, parent);
                    namespace.truncate(depth);
                }
                Declaration::Enum(decl) => self.register_enum(decl, namespace, parent),
                Declaration::Record(decl) => self.register_record(decl, namespace, parent),
            }
        }
    }

    fn prefix(namespace: &[String], parent: Option<(DeclKey, &str)>) -> String {
        match parent {
            Some((_, qualified)) => qualified.to_string(),
            None => namespace.join("::"),
        }
    }

    fn push_name(&mut self, name: String, registration: Registration) {
        self.names.push((name, registration));
    }

    fn register_enum(&mut self, decl: EnumDecl, namespace: &[String], parent: Option<(DeclKey, &str)>) {
        let key = self.next_key();
        let prefix = Self::prefix(namespace, parent);
        let qualified = qualify(&prefix, &decl.name);

        self.push_name(qualified.clone(), type_registration(key));
        for (index, enumerator) in decl.enumerators.iter().enumerate() {
            let strong = Registration {
                kind: SymbolKind::Enumerator,
                owner: key,
                index,
                weak: false,
            };
            self.push_name(qualify(&qualified, &enumerator.name), strong);
            if !decl.scoped {
                self.push_name(qualify(&prefix, &enumerator.name), Registration { weak: true, ..strong });
            }
        }

        self.types.push(TypeEntry {
            key,
            name: decl.name.clone(),
            qualified,
            namespace: namespace.to_vec(),
            parent: parent.map(|(key, _)| key),
            file: self.file.clone(),
            span: decl.span,
            body: TypeBody::Enum(decl),
        });
    }

    fn register_record(&mut self, mut decl: RecordDecl, namespace: &mut Vec<String>, parent: Option<(DeclKey, &str)>) {
        let key = self.next_key();
        let prefix = Self::prefix(namespace, parent);
        let qualified = qualify(&prefix, &decl.name);

        self.push_name(qualified.clone(), type_registration(key));
        for (index, field) in decl.fields.iter().enumerate() {
            self.push_name(
                qualify(&qualified, &field.name),
                Registration {
                    kind: SymbolKind::Field,
                    owner: key,
                    index,
                    weak: false,
                },
            );
        }
        for (index, constant) in decl.constants.iter().enumerate() {
            self.push_name(
                qualify(&qualified, &constant.name),
                Registration {
                    kind: SymbolKind::Constant,
                    owner: key,
                    index,
                    weak: false,
                },
            );
        }

        let nested = std::mem::take(&mut decl.nested);
        self.walk(nested, namespace, Some((key, &qualified)));

        self.types.push(TypeEntry {
            key,
            name: decl.name.clone(),
            qualified,
            namespace: namespace.clone(),
            parent: parent.map(|(key, _)| key),
            file: self.file.clone(),
            span: decl.span,
            body: TypeBody::Record(decl),
        });
    }
}

fn type_registration(key: DeclKey) -> Registration {
    Registration {
        kind: SymbolKind::Type,
        owner: key,
        index: 0,
        weak: false,
    }
}

pub(crate) fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use rayon::prelude::*;

    #[test]
    fn test_preorder_keys_and_qualified_names() {
        let builder = SnapshotBuilder::new("s");
        builder.register_file(
            0,
            parse_source(
                "a.hpp",
                "namespace game { struct Player { enum class Owner { None }; struct Binding { int key; }; int hp; }; }",
            ),
        );
        let snapshot = builder.freeze();
        let names: Vec<&str> = snapshot.types().iter().map(|t| t.qualified.as_str()).collect();
        assert_eq!(names, vec!["game::Player", "game::Player::Owner", "game::Player::Binding"]);
        assert_eq!(snapshot.types()[1].parent, Some(DeclKey::new(0, 0)));
        assert_eq!(snapshot.types()[0].namespace, vec!["game"]);
    }

    #[test]
    fn test_concurrent_registration_is_deterministic() {
        let sources: Vec<String> = (0..24)
            .map(|i| format!("struct T{} {{ int a; }};\nenum E{} {{ V{} }};", i, i, i))
            .collect();
        let run = || {
            let builder = SnapshotBuilder::new("s");
            sources
                .par_iter()
                .enumerate()
                .for_each(|(i, src)| builder.register_file(i as u32, parse_source(&format!("{}.hpp", i), src)));
            let snapshot = builder.freeze();
            snapshot.types().iter().map(|t| t.qualified.clone()).collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first.len(), 48);
        assert_eq!(first[0], "T0");
        assert_eq!(first[1], "E0");
        assert_eq!(first, run());
    }
}
