//! # Sandbox Document Assembly
//!
//! Stitches one build pass into a single self-contained HTML document.
//!
//! ## Key Invariants
//!
//! 1. **Bridge First**: the console/error/navigation interceptors and the
//!    module shim are the first scripts in `<head>`, ahead of any runtime asset,
//!    user markup or user script.
//! 2. **One Element Per File**: every style, script module and component gets
//!    its own `<style>`/`<script>` element, so a parse error in one cannot take
//!    the others down.
//! 3. **No Tag Breakout**: embedded text never contains a literal `</script` or
//!    `</style`.
//! 4. **Traceable Lines**: every embedded source body is recorded in
//!    [`SandboxDocument::line_map`], so a document line reported by the sandbox
//!    maps back to the project file and line.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::PreviewConfig;
use crate::files::{File, FileKind};
use crate::markup;
use crate::registry;
use crate::resolve::PathIndex;
use crate::runtime;
use crate::transpile::{ComponentUnit, ScriptUnit, UnitText};

lazy_static! {
    static ref SCRIPT_CLOSE_RE: Regex = Regex::new(r"(?i)</(script)").unwrap();
    static ref STYLE_CLOSE_RE: Regex = Regex::new(r"(?i)</(style)").unwrap();
}

/// Lines `first_line..first_line + line_count` of the document (1-based)
/// hold lines `1..=line_count` of the file at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub path: String,
    pub first_line: usize,
    pub line_count: usize,
}

/// The generated document plus what is needed to interpret reports about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxDocument {
    pub html: String,
    /// Markup page the document was built from. Empty for a blank document.
    pub page: String,
    pub line_map: Vec<SourceSpan>,
}

impl SandboxDocument {
    /// Document shown when the project has no files at all.
    pub fn blank() -> Self {
        Self {
            html: "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n</head>\n<body>\n</body>\n</html>\n"
                .to_string(),
            page: String::new(),
            line_map: Vec::new(),
        }
    }

    /// Map a 1-based document line to `(path, line)` in the project.
    pub fn locate(&self, line: usize) -> Option<(&str, usize)> {
        self.line_map
            .iter()
            .find(|span| line >= span.first_line && line < span.first_line + span.line_count)
            .map(|span| (span.path.as_str(), line - span.first_line + 1))
    }
}

/// Everything one document is built from, already ordered.
pub struct DocumentInputs<'a> {
    pub page: &'a File,
    pub styles: Vec<&'a File>,
    pub scripts: Vec<ScriptUnit>,
    pub components: Vec<ComponentUnit>,
    /// Markup file names the click interceptor treats as project pages.
    pub pages: Vec<String>,
    /// Used to tell project assets from external ones in the markup.
    pub index: &'a PathIndex<'a>,
}

/// Writer that keeps track of the line it is on.
struct LineWriter {
    out: String,
    line: usize,
}

impl LineWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            line: 1,
        }
    }

    fn push(&mut self, text: &str) {
        self.line += text.matches('\n').count();
        self.out.push_str(text);
    }

    fn line(&mut self, text: &str) {
        self.push(text);
        self.push("\n");
    }

    /// Write `body` starting on a fresh line and return the span it occupies.
    fn body(&mut self, path: &str, body: &str) -> SourceSpan {
        if !self.out.ends_with('\n') {
            self.push("\n");
        }
        let first_line = self.line;
        self.push(body);
        SourceSpan {
            path: path.to_string(),
            first_line,
            line_count: body.matches('\n').count() + 1,
        }
    }
}

pub struct SandboxDocumentBuilder<'c> {
    config: &'c PreviewConfig,
}

impl<'c> SandboxDocumentBuilder<'c> {
    pub fn new(config: &'c PreviewConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, inputs: DocumentInputs<'_>) -> SandboxDocument {
        let has_components = !inputs.components.is_empty();
        let has_typed = inputs
            .components
            .iter()
            .any(|unit| FileKind::from_name(&unit.name) == FileKind::TypedComponent);

        let outline = markup::outline(&inputs.page.content);
        let title = outline
            .title
            .clone()
            .unwrap_or_else(|| inputs.page.name.clone());
        let page_dir = inputs.page.directory();
        let body_markup = markup::strip_local_asset_tags(
            &markup::strip_document_wrappers(&inputs.page.content),
            |target| is_project_asset(inputs.index, &page_dir, target),
        );

        let mut doc = LineWriter::new();
        let mut line_map = Vec::new();

        doc.line("<!DOCTYPE html>");
        doc.line("<html lang=\"en\">");
        doc.line("<head>");
        doc.line("<meta charset=\"UTF-8\">");
        doc.line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
        doc.line(&format!("<title>{}</title>", escape_text(&title)));
        inline_script(&mut doc, &runtime::bridge_script(&inputs.pages));
        inline_script(&mut doc, &runtime::module_shim_script());

        if has_components {
            let cdn = &self.config.cdn;
            external_script(&mut doc, &cdn.react);
            external_script(&mut doc, &cdn.react_dom);
            external_script(&mut doc, &cdn.react_router);
            if has_typed {
                external_script(&mut doc, &cdn.typescript);
            }
        }

        for style in &inputs.styles {
            doc.line("<style>");
            doc.line(&format!("/* File: {} */", style.display_path()));
            let span = doc.body(&style.canonical_path(), &escape_style(&style.content));
            line_map.push(span);
            doc.line("");
            doc.line("</style>");
        }
        doc.line("</head>");

        doc.line("<body>");
        doc.line(body_markup.trim_matches('\n'));

        for script in &inputs.scripts {
            embed_unit(&mut doc, &mut line_map, &script.path, script.render());
        }

        if has_components {
            inline_script(&mut doc, &registry::runtime_script());
            inline_script(&mut doc, &runtime::router_script());
            for unit in &inputs.components {
                if unit.is_failed() {
                    inline_script(&mut doc, &unit.render().body);
                } else {
                    embed_unit(&mut doc, &mut line_map, &unit.path, unit.render());
                }
            }
        }

        let auto_mount = inputs.components.iter().any(|u| u.global.is_some() && !u.is_failed());
        inline_script(
            &mut doc,
            &runtime::boot_script(&self.config.entry_component, &self.config.mount_id, auto_mount),
        );
        doc.line("</body>");
        doc.line("</html>");

        SandboxDocument {
            html: doc.out,
            page: inputs.page.name.clone(),
            line_map,
        }
    }
}

fn inline_script(doc: &mut LineWriter, code: &str) {
    doc.line("<script>");
    doc.line(&escape_script(code));
    doc.line("</script>");
}

fn external_script(doc: &mut LineWriter, src: &str) {
    doc.line(&format!(
        "<script crossorigin src=\"{}\"></script>",
        escape_attribute(src)
    ));
}

fn embed_unit(doc: &mut LineWriter, line_map: &mut Vec<SourceSpan>, path: &str, text: UnitText) {
    doc.line("<script>");
    doc.push(&escape_script(&text.prelude));
    let span = doc.body(path, &escape_script(&text.body));
    line_map.push(span);
    doc.push(&escape_script(&text.epilogue));
    doc.line("");
    doc.line("</script>");
}

/// True when `target` (an href/src from the markup) names a file in the project.
fn is_project_asset(index: &PathIndex, page_dir: &str, target: &str) -> bool {
    if target.contains("://") || target.starts_with("//") || target.starts_with("data:") {
        return false;
    }
    let path = target.split(['?', '#']).next().unwrap_or(target);
    index.resolve(page_dir, path).is_some()
}

/// `</script` would end the element early; `<\/script` reads the same to JS.
pub fn escape_script(code: &str) -> String {
    SCRIPT_CLOSE_RE.replace_all(code, r"<\/$1").into_owned()
}

pub fn escape_style(css: &str) -> String {
    STYLE_CLOSE_RE.replace_all(css, r"<\/$1").into_owned()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(files: &[File], components: &[&str]) -> SandboxDocument {
        let config = PreviewConfig::default();
        let index = PathIndex::new(files);
        let page = files
            .iter()
            .find(|f| f.kind() == FileKind::Markup)
            .unwrap();
        let units = files
            .iter()
            .filter(|f| components.contains(&f.name.as_str()))
            .map(|f| ComponentUnit::compile(f, &index, (f.stem() == "App").then_some("App")))
            .collect();
        SandboxDocumentBuilder::new(&config).build(DocumentInputs {
            page,
            styles: files.iter().filter(|f| f.kind() == FileKind::Style).collect(),
            scripts: Vec::new(),
            components: units,
            pages: vec![page.name.clone()],
            index: &index,
        })
    }

    #[test]
    fn test_plain_page_has_no_runtime_assets() {
        let files = vec![
            File::new("1", "index.html", "/", "<!DOCTYPE html><html><body><p>Hi</p></body></html>"),
            File::new("2", "styles.css", "/", "p { color: red; }"),
        ];
        let doc = build(&files, &[]);
        assert!(!doc.html.contains("unpkg.com"));
        assert!(doc.html.contains("/* File: /styles.css */"));
        assert!(doc.html.contains("<p>Hi</p>"));
        assert_eq!(doc.html.matches("<!DOCTYPE").count(), 1);
        assert_eq!(doc.html.matches("<body>").count(), 1);
        assert_eq!(doc.page, "index.html");
    }

    #[test]
    fn test_bridge_precedes_user_content() {
        let files = vec![
            File::new("1", "index.html", "/", "<div id=\"app\"></div>"),
            File::new("2", "App.jsx", "/", "export default function App() { return <p>x</p>; }"),
        ];
        let doc = build(&files, &["App.jsx"]);
        let bridge = doc.html.find("preview-console").unwrap();
        let react = doc.html.find("react.development.js").unwrap();
        let markup = doc.html.find("<div id=\"app\">").unwrap();
        assert!(bridge < react);
        assert!(react < markup);
        assert!(!doc.html.contains("typescript.js"));
    }

    #[test]
    fn test_typed_component_pulls_type_checker() {
        let files = vec![
            File::new("1", "index.html", "/", "<div id=\"app\"></div>"),
            File::new("2", "App.tsx", "/", "export default function App(): any { return null; }"),
        ];
        let doc = build(&files, &["App.tsx"]);
        assert!(doc.html.contains("typescript.js"));
    }

    #[test]
    fn test_local_asset_tags_are_stripped() {
        let files = vec![
            File::new(
                "1",
                "index.html",
                "/",
                "<link rel=\"stylesheet\" href=\"styles.css\"><link rel=\"stylesheet\" href=\"https://x.io/a.css\"><script src=\"./main.js\"></script>",
            ),
            File::new("2", "styles.css", "/", "body {}"),
            File::new("3", "main.js", "/", "console.log(1);"),
        ];
        let doc = build(&files, &[]);
        assert!(!doc.html.contains("href=\"styles.css\""));
        assert!(!doc.html.contains("src=\"./main.js\""));
        assert!(doc.html.contains("https://x.io/a.css"));
    }

    #[test]
    fn test_embedded_close_tags_are_escaped() {
        let files = vec![
            File::new("1", "index.html", "/", "<div id=\"app\"></div>"),
            File::new(
                "2",
                "App.jsx",
                "/",
                "const s = \"</script>\";\nexport default function App() { return <p>{s}</p>; }",
            ),
            File::new("3", "a.css", "/", "/* </style> */"),
        ];
        let doc = build(&files, &["App.jsx"]);
        assert!(doc.html.contains(r"<\/script>"));
        assert!(doc.html.contains(r"<\/style>"));
    }

    #[test]
    fn test_line_map_locates_component_lines() {
        let source = "export default function App() {\n  const broken = undefinedThing;\n  return <p>x</p>;\n}\n";
        let files = vec![
            File::new("1", "index.html", "/", "<div id=\"app\"></div>"),
            File::new("2", "App.jsx", "/", source),
        ];
        let doc = build(&files, &["App.jsx"]);
        let span = doc
            .line_map
            .iter()
            .find(|s| s.path == "App.jsx")
            .unwrap()
            .clone();
        let lines: Vec<&str> = doc.html.lines().collect();
        assert!(lines[span.first_line].contains("undefinedThing"));
        assert_eq!(doc.locate(span.first_line + 1), Some(("App.jsx", 2)));
        assert_eq!(doc.locate(1), None);
    }

    #[test]
    fn test_blank_document() {
        let doc = SandboxDocument::blank();
        assert!(doc.html.contains("<body>"));
        assert!(doc.page.is_empty());
        assert!(doc.line_map.is_empty());
    }
}
