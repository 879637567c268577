//! Shareable project snapshots.
//!
//! A snapshot is the file set plus the page being viewed, serialized as JSON
//! and base64-encoded into a share link. Encoding uses the URL-safe alphabet
//! without padding; decoding also accepts the standard alphabet, with or
//! without padding, so links produced by older hosts keep working.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::files::{File, FileKind};

/// Newest snapshot format this crate reads and the one it writes.
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    1
}

fn root_path() -> String {
    "/".to_string()
}

/// The `type` tag of a snapshot entry. Hosts also store folder records
/// (`{"name", "type": "folder", "path"}`) next to files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryKind {
    File(FileKind),
    Other(String),
}

impl EntryKind {
    pub fn is_folder(&self) -> bool {
        matches!(self, EntryKind::Other(tag) if tag.eq_ignore_ascii_case("folder"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    pub name: String,
    /// Informational for files; the kind is always re-derived from `name`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "root_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub files: Vec<SnapshotFile>,
    #[serde(default)]
    pub current_page: String,
}

impl Snapshot {
    pub fn capture(files: &[File], current_page: &str) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            files: files
                .iter()
                .map(|f| SnapshotFile {
                    name: f.name.clone(),
                    kind: Some(EntryKind::File(f.kind())),
                    content: f.content.clone(),
                    path: f.path.clone(),
                })
                .collect(),
            current_page: current_page.to_string(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn encode(&self) -> Result<String, SnapshotError> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self, SnapshotError> {
        let normalized: String = encoded
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                c => c,
            })
            .collect();
        let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes())?;
        let json = String::from_utf8(bytes)?;
        Self::from_json(&json)
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }

    /// `<origin><share_path><encoded>`.
    pub fn share_url(&self, origin: &str, share_path: &str) -> Result<String, SnapshotError> {
        Ok(format!(
            "{}/{}/{}",
            origin.trim_end_matches('/'),
            share_path.trim_matches('/'),
            self.encode()?
        ))
    }

    pub fn from_share_url(url: &str, share_path: &str) -> Result<Self, SnapshotError> {
        let marker = format!("/{}/", share_path.trim_matches('/'));
        let malformed = || SnapshotError::MalformedUrl {
            url: url.to_string(),
        };
        let start = url.rfind(&marker).ok_or_else(malformed)? + marker.len();
        let encoded = url[start..].split(['?', '#']).next().unwrap_or_default();
        if encoded.is_empty() {
            return Err(malformed());
        }
        Self::decode(encoded)
    }

    /// Files with fresh ids (`snapshot-0`, `snapshot-1`, …) and the page to open.
    /// Folder records are dropped; directories live in each file's `path`.
    pub fn into_files(self) -> (Vec<File>, String) {
        let files = self
            .files
            .into_iter()
            .filter(|f| !f.kind.as_ref().is_some_and(EntryKind::is_folder))
            .enumerate()
            .map(|(i, f)| File::new(format!("snapshot-{}", i), f.name, f.path, f.content))
            .collect();
        (files, self.current_page)
    }
}
