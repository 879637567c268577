//! Dependency graph over the code files of one build pass.
//!
//! ## Invariants
//!
//! 1. **Single scan**: every file is scanned at most once per pass, cycles included.
//! 2. **Stable edges**: a file's dependencies keep the order of its import statements,
//!    without duplicates.
//! 3. **Emission order**: in any subset, a file is emitted after everything it depends
//!    on, including dependencies reached only through files outside the subset.
//!    Ties break by canonical path; the entry component goes last unless an edge says
//!    otherwise. Cycles break on the smallest remaining path.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::files::File;
use crate::resolve::PathIndex;

lazy_static! {
    /// `import x from "./a"`, `import { a, b } from '../b'`, `import "./c.css"`.
    static ref IMPORT_RE: Regex =
        Regex::new(r#"(?m)\bimport\s+(?:[\w*{}\s,$]*?\s*from\s*)?['"]([^'"\n]+)['"]"#).unwrap();
}

/// Import specifiers of a source file, in source order.
pub fn extract_import_specifiers(source: &str) -> Vec<String> {
    IMPORT_RE
        .captures_iter(source)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
    visit_order: Vec<String>,
}

impl DependencyGraph {
    /// Scan every script and component file in `files`.
    pub fn build<'f>(files: &'f [File], index: &PathIndex<'f>) -> Self {
        let mut builder = GraphBuilder {
            index,
            visited: HashSet::new(),
            graph: DependencyGraph::default(),
        };
        for file in files.iter().filter(|f| f.kind().is_code()) {
            builder.process(file);
        }
        builder.graph
    }

    pub fn dependencies(&self, path: &str) -> &[String] {
        self.edges.get(path).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Files in the order they were first scanned.
    pub fn visit_order(&self) -> &[String] {
        &self.visit_order
    }

    pub fn contains(&self, path: &str) -> bool {
        self.edges.contains_key(path)
    }

    /// Every path reachable from `path`, excluding `path` itself unless it
    /// sits on a cycle.
    pub fn transitive_dependencies(&self, path: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = self.dependencies(path).iter().map(|s| s.as_str()).collect();
        while let Some(next) = stack.pop() {
            if seen.insert(next.to_string()) {
                stack.extend(self.dependencies(next).iter().map(|s| s.as_str()));
            }
        }
        seen
    }

    /// Order `subset` so dependencies come first. `entry` names the canonical
    /// path that should go last when nothing depends on it.
    pub fn emission_order<'f>(&self, subset: &[&'f File], entry: Option<&str>) -> Vec<&'f File> {
        let by_path: BTreeMap<String, &'f File> = subset
            .iter()
            .map(|f| (f.canonical_path(), *f))
            .collect();

        let key = |path: &str| (Some(path) == entry, path.to_string());

        // Dependencies inside the subset, looking through files outside it.
        let mut pending: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for path in by_path.keys() {
            let deps = self.subset_dependencies(path, &by_path);
            for dep in &deps {
                dependents.entry(dep.clone()).or_default().push(path.clone());
            }
            pending.insert(path.clone(), deps);
        }

        let mut ready: BTreeSet<(bool, String)> = pending
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(path, _)| key(path))
            .collect();
        let mut remaining: BTreeSet<(bool, String)> =
            by_path.keys().map(|p| key(p)).collect();
        let mut ordered = Vec::with_capacity(by_path.len());

        while !remaining.is_empty() {
            let next = match ready.iter().next().cloned() {
                Some(next) => next,
                None => match remaining.iter().next().cloned() {
                    // Only cycles remain.
                    Some(next) => {
                        tracing::debug!(path = %next.1, "breaking import cycle");
                        next
                    }
                    None => break,
                },
            };
            ready.remove(&next);
            remaining.remove(&next);

            let path = next.1;
            if let Some(users) = dependents.get(&path) {
                for user in users {
                    if let Some(deps) = pending.get_mut(user) {
                        deps.remove(&path);
                        let user_key = key(user);
                        if deps.is_empty() && remaining.contains(&user_key) {
                            ready.insert(user_key);
                        }
                    }
                }
            }
            if let Some(file) = by_path.get(&path) {
                ordered.push(*file);
            }
        }

        ordered
    }

    fn subset_dependencies(
        &self,
        path: &str,
        subset: &BTreeMap<String, &File>,
    ) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = self.dependencies(path).iter().map(|s| s.as_str()).collect();
        while let Some(next) = stack.pop() {
            if next == path || !seen.insert(next) {
                continue;
            }
            if subset.contains_key(next) {
                found.insert(next.to_string());
            } else {
                stack.extend(self.dependencies(next).iter().map(|s| s.as_str()));
            }
        }
        found
    }
}

struct GraphBuilder<'i, 'f> {
    index: &'i PathIndex<'f>,
    visited: HashSet<String>,
    graph: DependencyGraph,
}

impl<'i, 'f> GraphBuilder<'i, 'f> {
    fn process(&mut self, file: &'f File) {
        let path = file.canonical_path();
        if !self.visited.insert(path.clone()) {
            return;
        }
        self.graph.visit_order.push(path.clone());
        self.graph.edges.entry(path.clone()).or_default();

        let dir = file.directory();
        for specifier in extract_import_specifiers(&file.content) {
            let Some(target) = self.index.resolve(&dir, &specifier) else {
                continue;
            };
            let target_path = target.canonical_path();
            if let Some(deps) = self.graph.edges.get_mut(&path) {
                if !deps.contains(&target_path) {
                    deps.push(target_path);
                }
            }
            if target.kind().is_code() {
                self.process(target);
            }
        }
    }
}
