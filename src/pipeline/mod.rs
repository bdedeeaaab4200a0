// Fri Oct 16 2026 - Alex

use crate::config::Config;
use crate::diagnostic::{sort_diagnostics, Diagnostic};
use crate::parser::parse_source;
use crate::registry::{ResolvedType, Resolver, SnapshotBuilder, SnapshotModel, TypeId};
use crate::structure::{apply_explicit_offsets, apply_layout, LayoutEngine, RecordLayout};
use crate::utils::scoped_timer;
use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::io;
use std::path::Path;

/// One declaration file of a batch.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub name: String,
    pub text: String,
}

impl SourceText {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Builds the model of one snapshot from a batch of declaration files.
///
/// Runs on a dedicated pool of `max_threads` workers unless `parallel` is
/// off; both paths produce the same model.
pub fn analyze_snapshot(id: &str, sources: &[SourceText], config: &Config) -> SnapshotModel {
    let _timer = scoped_timer(&format!("snapshot {}", id));
    if config.parallel && config.max_threads > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(config.max_threads).build() {
            Ok(pool) => return pool.install(|| run(id, sources, config, true)),
            Err(e) => warn!("Failed to start a {}-thread pool, running sequentially: {}", config.max_threads, e),
        }
    }
    run(id, sources, config, false)
}

fn run(id: &str, sources: &[SourceText], config: &Config, parallel: bool) -> SnapshotModel {
    let builder = SnapshotBuilder::new(id);
    {
        let _timer = scoped_timer("parse");
        let register = |(index, source): (usize, &SourceText)| {
            builder.register_file(index as u32, parse_source(&source.name, &source.text));
        };
        if parallel {
            sources.par_iter().enumerate().for_each(register);
        } else {
            sources.iter().enumerate().for_each(register);
        }
    }
    let snapshot = builder.freeze();
    let mut diagnostics = snapshot.diagnostics().to_vec();

    let mut types: Vec<ResolvedType> = {
        let _timer = scoped_timer("resolve");
        let resolver = Resolver::new(&snapshot, &config.abi);
        let roots = snapshot.top_level();
        let resolve_group = |root: &TypeId| -> Vec<(ResolvedType, Vec<Diagnostic>)> {
            snapshot.with_nested(*root).into_iter().map(|id| resolver.resolve(id)).collect()
        };
        let resolved: Vec<(ResolvedType, Vec<Diagnostic>)> = if parallel {
            roots.par_iter().flat_map_iter(resolve_group).collect()
        } else {
            roots.iter().flat_map(resolve_group).collect()
        };
        let mut types = Vec::with_capacity(resolved.len());
        for (ty, found) in resolved {
            diagnostics.extend(found);
            types.push(ty);
        }
        types.sort_by_key(|ty| ty.id);
        types
    };
    debug!("resolved {} types in snapshot {}", types.len(), id);

    if config.compute_layouts {
        let _timer = scoped_timer("layout");
        let ids: Vec<TypeId> = snapshot.ids().collect();
        let layouts: Vec<(TypeId, RecordLayout, Vec<Diagnostic>)> = {
            let engine = LayoutEngine::new(&types, &snapshot, config);
            let lay_out = |id: &TypeId| engine.layout(*id).map(|(layout, found)| (*id, layout, found));
            let layouts = if parallel {
                ids.par_iter().filter_map(lay_out).collect()
            } else {
                ids.iter().filter_map(lay_out).collect()
            };
            debug!("{} record instances cached in snapshot {}", engine.cache().size(), id);
            layouts
        };
        for (id, layout, found) in layouts {
            diagnostics.extend(found);
            apply_layout(&mut types[id.index()], layout);
        }
    }
    if config.explicit_offsets_authoritative {
        for ty in types.iter_mut().filter(|ty| !ty.is_enum() && ty.layout.is_none()) {
            apply_explicit_offsets(ty);
        }
    }

    sort_diagnostics(&mut diagnostics, snapshot.files());
    let model = SnapshotModel {
        id: id.to_string(),
        files: snapshot.files().to_vec(),
        types: types.into_iter().map(|ty| (ty.qualified.clone(), ty)).collect::<IndexMap<_, _>>(),
        diagnostics,
    };
    info!(
        "Snapshot {}: {} files, {} types, {} diagnostics ({} errors)",
        model.id,
        model.files.len(),
        model.types.len(),
        model.diagnostics.len(),
        model.error_count()
    );
    model
}
