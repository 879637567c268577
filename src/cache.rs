use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

use crate::error::TranspileError;

/// Compile results kept across build passes, keyed by content hash.
///
/// A key covers everything the compiler sees (file name, dialect, rewritten
/// source), so an entry never goes stale; entries are only dropped by
/// [`TranspileCache::retain_keys`] to bound memory.
#[derive(Debug, Default)]
pub struct TranspileCache {
    entries: HashMap<String, Result<String, TranspileError>>,
    hits: u64,
    misses: u64,
}

impl TranspileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_key(file_name: &str, typed: bool, source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(file_name.as_bytes());
        hasher.update([0u8, typed as u8]);
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&mut self, key: &str) -> Option<Result<String, TranspileError>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(entry.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn set(&mut self, key: String, compiled: Result<String, TranspileError>) {
        self.entries.insert(key, compiled);
    }

    /// Drop every entry not in `live`.
    pub fn retain_keys(&mut self, live: &HashSet<String>) {
        self.entries.retain(|key, _| live.contains(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
