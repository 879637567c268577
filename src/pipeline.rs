//! One build pass: files in, sandbox document out.
//!
//! Only [`PreviewError::EntryNotFound`] aborts a pass. Unresolved imports and
//! component compile failures are collected into the [`BuildReport`] and
//! isolated inside the document.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

use crate::cache::TranspileCache;
use crate::config::PreviewConfig;
use crate::document::{DocumentInputs, SandboxDocument, SandboxDocumentBuilder};
use crate::error::{PreviewError, Result, TranspileError};
use crate::files::{File, FileKind};
use crate::graph::{extract_import_specifiers, DependencyGraph};
use crate::jsx_lowerer::lower_component;
use crate::markup;
use crate::registry::ModuleRegistry;
use crate::resolve::{is_relative, PathIndex};
use crate::transpile::{rewrite_component_source, ComponentUnit, RewrittenSource, ScriptUnit};

/// An import that matched neither a project file nor a registered component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedImport {
    pub file: String,
    pub specifier: String,
}

/// Everything a pass noticed without failing.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    #[serde(serialize_with = "serialize_errors")]
    pub transpile_failures: Vec<TranspileError>,
    pub unresolved_imports: Vec<UnresolvedImport>,
    pub warnings: Vec<String>,
    pub cache_hits: usize,
    pub compiled: usize,
}

fn serialize_errors<S>(errors: &[TranspileError], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub document: SandboxDocument,
    /// Page actually used, which may differ from the one requested.
    pub page: String,
    pub graph: DependencyGraph,
    pub report: BuildReport,
}

/// Page to build: `page` itself, else the default page, else the first
/// markup file.
pub fn find_entry<'f>(files: &'f [File], page: &str, default_page: &str) -> Option<&'f File> {
    let markup: Vec<&File> = files.iter().filter(|f| f.kind() == FileKind::Markup).collect();
    markup
        .iter()
        .find(|f| f.name == page || f.canonical_path() == page.trim_start_matches('/'))
        .or_else(|| markup.iter().find(|f| f.name == default_page))
        .or_else(|| markup.first())
        .copied()
}

/// Run one build pass over `files` (active followed by retained).
pub fn build_document(
    files: &[File],
    page: &str,
    config: &PreviewConfig,
    cache: &mut TranspileCache,
) -> Result<BuildOutput> {
    let span = tracing::info_span!("build_preview", page = %page, files = files.len());
    let _enter = span.enter();

    let index = PathIndex::new(files);
    let graph = DependencyGraph::build(files, &index);

    if files.is_empty() {
        return Ok(BuildOutput {
            document: SandboxDocument::blank(),
            page: String::new(),
            graph,
            report: BuildReport::default(),
        });
    }

    let entry = match find_entry(files, page, &config.default_page) {
        Some(entry) => entry,
        None => {
            tracing::warn!(page, "no markup file to build");
            return Err(PreviewError::EntryNotFound {
                page: page.to_string(),
            });
        }
    };
    if entry.name != page {
        tracing::debug!(requested = page, using = %entry.name, "falling back to another page");
    }

    let mut report = BuildReport::default();

    let styles: Vec<&File> = files.iter().filter(|f| f.kind() == FileKind::Style).collect();
    let script_files: Vec<&File> = files.iter().filter(|f| f.kind() == FileKind::Script).collect();
    let component_files: Vec<&File> = files.iter().filter(|f| f.kind().is_component()).collect();

    let scripts: Vec<ScriptUnit> = graph
        .emission_order(&script_files, None)
        .into_iter()
        .map(|file| {
            for specifier in extract_import_specifiers(&file.content) {
                if index.resolve(&file.directory(), &specifier).is_none() {
                    report.unresolved_imports.push(UnresolvedImport {
                        file: file.display_path(),
                        specifier,
                    });
                }
            }
            ScriptUnit::new(file, &index)
        })
        .collect();

    let entry_path = component_files
        .iter()
        .filter(|f| f.stem() == config.entry_component)
        .min_by_key(|f| (f.directory_segments().len(), f.canonical_path()))
        .map(|f| f.canonical_path());
    let ordered = graph.emission_order(&component_files, entry_path.as_deref());
    let components = compile_components(
        &ordered,
        &index,
        entry_path.as_deref(),
        config,
        cache,
        &mut report,
    );

    check_component_imports(&components, &mut report);
    check_markup(entry, files, !components.is_empty(), config, &mut report);

    let pages = files
        .iter()
        .filter(|f| f.kind() == FileKind::Markup)
        .map(|f| f.name.clone())
        .collect();

    let document = SandboxDocumentBuilder::new(config).build(DocumentInputs {
        page: entry,
        styles,
        scripts,
        components,
        pages,
        index: &index,
    });

    tracing::debug!(
        page = %entry.name,
        compiled = report.compiled,
        cache_hits = report.cache_hits,
        failures = report.transpile_failures.len(),
        "build pass finished"
    );

    Ok(BuildOutput {
        document,
        page: entry.name.clone(),
        graph,
        report,
    })
}

/// Rewrite every component, serve what the cache already has and compile the
/// rest on the rayon pool. Output keeps the order of `ordered`.
fn compile_components(
    ordered: &[&File],
    index: &PathIndex,
    entry_path: Option<&str>,
    config: &PreviewConfig,
    cache: &mut TranspileCache,
    report: &mut BuildReport,
) -> Vec<ComponentUnit> {
    let prepared: Vec<(&File, RewrittenSource, String)> = ordered
        .iter()
        .map(|file| {
            let rewritten = rewrite_component_source(&file.content, &file.directory(), index);
            let key = TranspileCache::compute_key(
                &file.canonical_path(),
                file.kind() == FileKind::TypedComponent,
                &rewritten.code,
            );
            (*file, rewritten, key)
        })
        .collect();

    let hits: Vec<Option<std::result::Result<String, TranspileError>>> =
        prepared.iter().map(|(_, _, key)| cache.get(key)).collect();
    let missed: Vec<bool> = hits.iter().map(Option::is_none).collect();

    let compiled: Vec<std::result::Result<String, TranspileError>> = prepared
        .par_iter()
        .zip(hits.into_par_iter())
        .map(|((file, rewritten, _), hit)| match hit {
            Some(hit) => hit,
            None => {
                tracing::debug!(file = %file.display_path(), "compiling component");
                lower_component(
                    &rewritten.code,
                    &file.name,
                    file.kind() == FileKind::TypedComponent,
                )
            }
        })
        .collect();

    let mut live = HashSet::new();
    let mut units = Vec::with_capacity(prepared.len());
    for (((file, rewritten, key), compiled), missed) in prepared.into_iter().zip(compiled).zip(missed) {
        if missed {
            report.compiled += 1;
            cache.set(key.clone(), compiled.clone());
        } else {
            report.cache_hits += 1;
        }
        if let Err(err) = &compiled {
            tracing::warn!(file = %file.display_path(), error = %err, "component failed to compile");
            report.transpile_failures.push(err.clone());
        }
        live.insert(key);
        let global = (entry_path == Some(file.canonical_path().as_str()))
            .then_some(config.entry_component.as_str());
        units.push(ComponentUnit::from_parts(file, global, rewritten, compiled));
    }
    cache.retain_keys(&live);
    units
}

/// Component imports are looked up in the sandbox registry at run time; run
/// the same lookup now so misses show up in the report.
fn check_component_imports(units: &[ComponentUnit], report: &mut BuildReport) {
    let mut registry = ModuleRegistry::new();
    for unit in units.iter().filter(|u| !u.is_failed()) {
        for alias in &unit.aliases {
            registry.register(alias.clone(), unit.path.clone());
        }
    }
    for unit in units {
        for specifier in &unit.component_imports {
            if registry.resolve(specifier).is_none() {
                let kind = if is_relative(specifier) { "Component" } else { "Package" };
                report
                    .warnings
                    .push(format!("{} not found: {} (imported by /{})", kind, specifier, unit.path));
                report.unresolved_imports.push(UnresolvedImport {
                    file: format!("/{}", unit.path),
                    specifier: specifier.clone(),
                });
            }
        }
    }
}

fn check_markup(
    entry: &File,
    files: &[File],
    has_components: bool,
    config: &PreviewConfig,
    report: &mut BuildReport,
) {
    let outline = markup::outline(&entry.content);
    if has_components && !outline.has_id(&config.mount_id) {
        report.warnings.push(format!(
            "{} has no element with id \"{}\"; the {} component will not be mounted",
            entry.name, config.mount_id, config.entry_component
        ));
    }
    for link in &outline.page_links {
        let name = markup::page_name(link);
        let exists = files
            .iter()
            .any(|f| f.kind() == FileKind::Markup && f.name == name);
        if !exists {
            report
                .warnings
                .push(format!("{} links to missing page {}", entry.name, name));
        }
    }
}
