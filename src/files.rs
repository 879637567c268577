//! Virtual project files.
//!
//! The build only ever reads these. A file's directory is stored the way the
//! editor hands it over (`/`, `./`, `/components`, `/components/`), so every
//! consumer goes through [`File::canonical_path`] instead of joining strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role of a file in the build, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    #[serde(rename = "html")]
    Markup,
    #[serde(rename = "css")]
    Style,
    #[serde(rename = "javascript")]
    Script,
    #[serde(rename = "jsx")]
    Component,
    #[serde(rename = "tsx")]
    TypedComponent,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "other")]
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        match extension(name).map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("html") | Some("htm") => FileKind::Markup,
            Some("css") => FileKind::Style,
            Some("js") => FileKind::Script,
            Some("jsx") => FileKind::Component,
            Some("tsx") => FileKind::TypedComponent,
            Some("json") => FileKind::Json,
            _ => FileKind::Other,
        }
    }

    /// Component-syntax files that go through the native compiler.
    pub fn is_component(self) -> bool {
        matches!(self, FileKind::Component | FileKind::TypedComponent)
    }

    /// Files whose imports participate in the dependency graph.
    pub fn is_code(self) -> bool {
        matches!(
            self,
            FileKind::Script | FileKind::Component | FileKind::TypedComponent
        )
    }
}

/// One file of the virtual project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    pub name: String,
    /// Directory the file lives in. `/` and `./` both mean the project root.
    pub path: String,
    pub content: String,
}

impl File {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: FileId::new(id),
            name: name.into(),
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_name(&self.name)
    }

    /// Directory segments, root-relative, without `.` or empty segments.
    pub fn directory_segments(&self) -> Vec<&str> {
        directory_segments(&self.path)
    }

    /// Directory as a root-relative path without leading or trailing slash.
    /// Empty for the root.
    pub fn directory(&self) -> String {
        self.directory_segments().join("/")
    }

    /// `components/Button.jsx`, or just `App.jsx` at the root.
    pub fn canonical_path(&self) -> String {
        join_path(&self.directory(), &self.name)
    }

    /// `/components/Button.jsx`, used in diagnostics and generated comments.
    pub fn display_path(&self) -> String {
        format!("/{}", self.canonical_path())
    }

    /// File name without its last extension.
    pub fn stem(&self) -> &str {
        strip_extension(&self.name)
    }
}

/// Split a directory string into its meaningful segments.
pub fn directory_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Extension after the last dot of the final segment, if any.
pub fn extension(name: &str) -> Option<&str> {
    let last = name.rsplit('/').next().unwrap_or(name);
    match last.rfind('.') {
        Some(0) | None => None,
        Some(i) => Some(&last[i + 1..]),
    }
}

pub fn strip_extension(name: &str) -> &str {
    match extension(name) {
        Some(ext) => &name[..name.len() - ext.len() - 1],
        None => name,
    }
}

/// Files of one build pass: the active set followed by retained files that
/// are not shadowed by an active file with the same id.
pub fn merge_with_retained(active: &[File], retained: &[File]) -> Vec<File> {
    let mut files = active.to_vec();
    for file in retained {
        if !active.iter().any(|a| a.id == file.id) {
            files.push(file.clone());
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_name("index.html"), FileKind::Markup);
        assert_eq!(FileKind::from_name("styles.css"), FileKind::Style);
        assert_eq!(FileKind::from_name("script.js"), FileKind::Script);
        assert_eq!(FileKind::from_name("App.jsx"), FileKind::Component);
        assert_eq!(FileKind::from_name("Card.TSX"), FileKind::TypedComponent);
        assert_eq!(FileKind::from_name("data.json"), FileKind::Json);
        assert_eq!(FileKind::from_name("README"), FileKind::Other);
        assert_eq!(FileKind::from_name(".env"), FileKind::Other);
    }

    #[test]
    fn test_canonical_paths() {
        let root = File::new("1", "App.jsx", "/", "");
        assert_eq!(root.canonical_path(), "App.jsx");
        assert_eq!(root.display_path(), "/App.jsx");

        let dotted = File::new("2", "App.jsx", "./", "");
        assert_eq!(dotted.canonical_path(), "App.jsx");

        let nested = File::new("3", "Button.jsx", "/components/", "");
        assert_eq!(nested.canonical_path(), "components/Button.jsx");
        assert_eq!(nested.directory(), "components");
        assert_eq!(nested.stem(), "Button");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("a/b/x.jsx"), "a/b/x");
        assert_eq!(strip_extension("a.b/x"), "a.b/x");
        assert_eq!(strip_extension("x.test.js"), "x.test");
    }

    #[test]
    fn test_merge_with_retained_prefers_active() {
        let active = vec![File::new("1", "index.html", "/", "new")];
        let retained = vec![
            File::new("1", "index.html", "/", "old"),
            File::new("2", "about.html", "/", "about"),
        ];
        let merged = merge_with_retained(&active, &retained);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].content, "new");
        assert_eq!(merged[1].name, "about.html");
    }
}
