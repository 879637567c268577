//! Import specifier resolution against the virtual file set.
//!
//! Resolution is best effort: a specifier either lands on a project file or
//! is dropped. There is no package resolution and no error for misses.

use std::collections::HashMap;

use crate::files::{directory_segments, strip_extension, File};

/// Extension suffixes, in priority order, applied to a normalized specifier.
const EXTENSION_SUFFIXES: [&str; 3] = [".js", ".jsx", ".tsx"];
const INDEX_SUFFIXES: [&str; 3] = ["/index.js", "/index.jsx", "/index.tsx"];

/// Lookup table from path keys to files.
///
/// Canonical paths always win. Alias keys (bare file name, and for component
/// files the stem and the extension-less canonical path) are only inserted
/// when no file already claims that key.
pub struct PathIndex<'f> {
    by_key: HashMap<String, &'f File>,
}

impl<'f> PathIndex<'f> {
    pub fn new(files: &'f [File]) -> Self {
        let mut by_key = HashMap::new();

        for file in files {
            by_key.entry(file.canonical_path()).or_insert(file);
        }

        for file in files {
            by_key.entry(file.name.clone()).or_insert(file);
            if file.kind().is_component() {
                let canonical = file.canonical_path();
                by_key
                    .entry(strip_extension(&canonical).to_string())
                    .or_insert(file);
                by_key.entry(file.stem().to_string()).or_insert(file);
            }
        }

        Self { by_key }
    }

    pub fn get(&self, key: &str) -> Option<&'f File> {
        self.by_key.get(key).copied()
    }

    /// Resolve `specifier` as imported from a file living in `from_dir`.
    pub fn resolve(&self, from_dir: &str, specifier: &str) -> Option<&'f File> {
        let specifier = specifier.trim();
        if specifier.is_empty() {
            return None;
        }

        if !is_relative(specifier) {
            if let Some(file) = self.get(specifier) {
                return Some(file);
            }
        }

        let normalized = normalize_specifier(from_dir, specifier);
        let found = candidates(&normalized)
            .into_iter()
            .find_map(|candidate| self.get(&candidate));
        if found.is_none() {
            tracing::trace!(specifier, from_dir, "import did not resolve");
        }
        found
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".."
}

/// Turn a specifier into a root-relative path without a leading slash.
///
/// Relative specifiers are joined onto `from_dir` segment by segment; `..`
/// never climbs above the root. Bare and absolute specifiers are taken as
/// root-relative.
pub fn normalize_specifier(from_dir: &str, specifier: &str) -> String {
    let mut segments: Vec<&str> = if is_relative(specifier) {
        directory_segments(from_dir)
    } else {
        Vec::new()
    };

    for part in specifier.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Candidate lookup keys for a normalized specifier, highest priority first.
pub fn candidates(resolved: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(8);
    out.push(resolved.to_string());
    for ext in EXTENSION_SUFFIXES {
        out.push(format!("{}{}", resolved, ext));
    }
    let stripped = strip_code_extension(resolved);
    if stripped != resolved {
        out.push(stripped.to_string());
    }
    for index in INDEX_SUFFIXES {
        out.push(format!("{}{}", resolved, index));
    }
    out
}

fn strip_code_extension(path: &str) -> &str {
    for ext in [".js", ".jsx", ".tsx"] {
        if let Some(stripped) = path.strip_suffix(ext) {
            return stripped;
        }
    }
    path
}
