//! Component and script transpilation.
//!
//! Component files go through ordered text rewrites (imports become lookups
//! against host globals, the registry or script modules; exports become a
//! single `ComponentToExport` binding), then through [`lower_component`], and
//! are finally wrapped in an isolated, self-registering block.
//!
//! Script files get a lighter rewrite so `import`/`export` work inside the
//! per-script closure.
//!
//! Every rewrite keeps the line count of the text it replaces.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::error::TranspileError;
use crate::files::{File, FileKind};
use crate::jsx_lowerer::{js_string, lower_component};
use crate::resolve::{is_relative, PathIndex};

/// Hooks every component can use without importing them.
const AMBIENT_HOOKS: [&str; 8] = [
    "useState",
    "useEffect",
    "useContext",
    "useReducer",
    "useCallback",
    "useMemo",
    "useRef",
    "useLayoutEffect",
];

/// Name the default export is rebound to inside a component block.
pub const EXPORT_BINDING: &str = "ComponentToExport";

lazy_static! {
    static ref TYPE_IMPORT_RE: Regex =
        Regex::new(r#"\bimport\s+type\s+[^;'"]*?\s*from\s*['"][^'"\n]+['"];?"#).unwrap();
    static ref FRAMEWORK_IMPORT_RE: Regex = Regex::new(
        r#"\bimport\s+([\w*{}\s,$]+?)\s*from\s*['"](react|react-dom|react-dom/client)['"];?"#
    )
    .unwrap();
    static ref ROUTER_IMPORT_RE: Regex =
        Regex::new(r#"\bimport\s+([\w*{}\s,$]+?)\s*from\s*['"]react-router-dom['"];?"#).unwrap();
    static ref FROM_IMPORT_RE: Regex =
        Regex::new(r#"\bimport\s+([\w*{}\s,$]+?)\s*from\s*['"]([^'"\n]+)['"];?"#).unwrap();
    static ref SIDE_EFFECT_IMPORT_RE: Regex =
        Regex::new(r#"\bimport\s*['"]([^'"\n]+)['"];?"#).unwrap();
    static ref EXPORT_DEFAULT_RE: Regex = Regex::new(r"\bexport\s+default\s+").unwrap();
    static ref EXPORT_LIST_RE: Regex =
        Regex::new(r#"\bexport\s*(\{[^}]*\}|\*(?:\s+as\s+[\w$]+)?)\s*(?:from\s*['"][^'"\n]*['"])?\s*;?"#)
            .unwrap();
    static ref EXPORT_DECL_RE: Regex = Regex::new(
        r"\bexport\s+((?:async\s+)?function\*?\s*([\w$]+)|class\s+([\w$]+)|(?:const|let|var)\s+([\w$]+))"
    )
    .unwrap();
    static ref EXPORT_RE: Regex = Regex::new(r"\bexport\s+").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORT CLAUSES
// ═══════════════════════════════════════════════════════════════════════════════

/// Bindings introduced by one `import … from` clause.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportClause {
    pub default: Option<String>,
    pub namespace: Option<String>,
    /// `(imported, local)` pairs.
    pub named: Vec<(String, String)>,
}

impl ImportClause {
    pub fn parse(clause: &str) -> Self {
        let mut out = ImportClause::default();
        let clause = clause.trim();

        let (head, braces) = match (clause.find('{'), clause.rfind('}')) {
            (Some(open), Some(close)) if close > open => {
                (format!("{}{}", &clause[..open], &clause[close + 1..]), Some(&clause[open + 1..close]))
            }
            _ => (clause.to_string(), None),
        };

        for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(ns) = part.strip_prefix('*') {
                let ns = ns.trim().trim_start_matches("as").trim();
                if !ns.is_empty() {
                    out.namespace = Some(ns.to_string());
                }
            } else {
                out.default = Some(part.to_string());
            }
        }

        if let Some(braces) = braces {
            for spec in braces.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let spec = spec.strip_prefix("type ").map(str::trim).unwrap_or(spec);
                let mut words = spec.split_whitespace();
                let imported = words.next().unwrap_or_default().to_string();
                let local = match (words.next(), words.next()) {
                    (Some("as"), Some(local)) => local.to_string(),
                    _ => imported.clone(),
                };
                if !imported.is_empty() {
                    out.named.push((imported, local));
                }
            }
        }
        out
    }

    /// Declarations binding this clause. `default_expr` feeds the default
    /// import, `module_expr` the namespace and named imports.
    pub fn bind(&self, default_expr: &str, module_expr: &str) -> String {
        let mut out = Vec::new();
        if let Some(ns) = &self.namespace {
            out.push(format!("const {} = {};", ns, module_expr));
        }
        if let Some(default) = &self.default {
            out.push(format!("const {} = {};", default, default_expr));
        }
        if !self.named.is_empty() {
            let source = match &self.default {
                Some(default) if default_expr == module_expr => default.clone(),
                _ => module_expr.to_string(),
            };
            out.push(format!("const {} = {} || {{}};", self.pattern(), source));
        }
        if out.is_empty() {
            format!("{};", module_expr)
        } else {
            out.join(" ")
        }
    }

    fn pattern(&self) -> String {
        let parts: Vec<String> = self
            .named
            .iter()
            .map(|(imported, local)| {
                if imported == local {
                    imported.clone()
                } else {
                    format!("{}: {}", imported, local)
                }
            })
            .collect();
        format!("{{ {} }}", parts.join(", "))
    }
}

/// Replace every match of `re`, padding the replacement with newlines so the
/// text keeps its line count.
fn replace_keeping_lines<F>(re: &Regex, source: &str, mut replace: F) -> String
where
    F: FnMut(&Captures) -> String,
{
    re.replace_all(source, |caps: &Captures| {
        let mut text = replace(caps);
        let want = caps[0].matches('\n').count();
        let have = text.matches('\n').count();
        for _ in have..want {
            text.push('\n');
        }
        text
    })
    .into_owned()
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT REWRITES
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of the text rewrites that run before compilation.
#[derive(Debug, Default)]
pub struct RewrittenSource {
    pub code: String,
    /// Names bound from the framework globals, as `(local, expression)`.
    pub framework_bindings: Vec<(String, String)>,
    /// Specifiers handed to `importComponent`.
    pub component_imports: Vec<String>,
}

/// Rewrite imports and exports of a component file living in `dir`.
pub fn rewrite_component_source(source: &str, dir: &str, index: &PathIndex) -> RewrittenSource {
    let mut framework_bindings: Vec<(String, String)> = Vec::new();
    let mut component_imports = Vec::new();

    let code = replace_keeping_lines(&TYPE_IMPORT_RE, source, |_| String::new());

    let code = replace_keeping_lines(&FRAMEWORK_IMPORT_RE, &code, |caps| {
        let global = if &caps[2] == "react" { "React" } else { "ReactDOM" };
        let clause = ImportClause::parse(&caps[1]);
        let mut bind = |local: &str, expr: String| {
            if local != global && !framework_bindings.iter().any(|(l, _)| l == local) {
                framework_bindings.push((local.to_string(), expr));
            }
        };
        if let Some(default) = &clause.default {
            bind(default, global.to_string());
        }
        if let Some(ns) = &clause.namespace {
            bind(ns, global.to_string());
        }
        for (imported, local) in &clause.named {
            bind(local, format!("{}.{}", global, imported));
        }
        String::new()
    });

    let code = replace_keeping_lines(&ROUTER_IMPORT_RE, &code, |caps| {
        ImportClause::parse(&caps[1]).bind("window.ReactRouterDOM", "window.ReactRouterDOM")
    });

    let code = replace_keeping_lines(&FROM_IMPORT_RE, &code, |caps| {
        let clause = ImportClause::parse(&caps[1]);
        let specifier = &caps[2];
        if is_relative(specifier) {
            if let Some(target) = index.resolve(dir, specifier) {
                if target.kind() == FileKind::Script {
                    let path = js_string(&target.canonical_path());
                    return clause.bind(
                        &format!("requireDefault({})", path),
                        &format!("requireModule({})", path),
                    );
                }
            }
        }
        component_imports.push(specifier.to_string());
        let lookup = format!("importComponent({})", js_string(specifier));
        clause.bind(&lookup, &lookup)
    });

    let code = replace_keeping_lines(&SIDE_EFFECT_IMPORT_RE, &code, |_| String::new());

    let code = replace_keeping_lines(&EXPORT_DEFAULT_RE, &code, |_| {
        format!("const {} = ", EXPORT_BINDING)
    });

    let code = replace_keeping_lines(&EXPORT_LIST_RE, &code, |caps| {
        let list = caps[1].trim_start_matches('{').trim_end_matches('}');
        list.split(',')
            .map(str::trim)
            .find_map(|spec| {
                let mut words = spec.split_whitespace();
                match (words.next(), words.next(), words.next()) {
                    (Some(local), Some("as"), Some("default")) => {
                        Some(format!("const {} = {};", EXPORT_BINDING, local))
                    }
                    _ => None,
                }
            })
            .unwrap_or_default()
    });

    let code = replace_keeping_lines(&EXPORT_RE, &code, |_| String::new());

    RewrittenSource {
        code,
        framework_bindings,
        component_imports,
    }
}

/// Aliases a component registers under: stem, name, and both joined with the
/// directory.
pub fn registration_names(file: &File) -> Vec<String> {
    let dir = file.directory();
    let mut names = vec![file.stem().to_string(), file.name.clone()];
    if !dir.is_empty() {
        names.push(format!("{}/{}", dir, file.stem()));
        names.push(format!("{}/{}", dir, file.name));
    }
    names.dedup();
    names
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT UNITS
// ═══════════════════════════════════════════════════════════════════════════════

/// One component file, ready to be placed in the document.
#[derive(Debug, Clone)]
pub struct ComponentUnit {
    pub path: String,
    pub name: String,
    pub aliases: Vec<String>,
    /// Global the component is also bound to (the pass's entry file only).
    pub global: Option<String>,
    pub framework_bindings: Vec<(String, String)>,
    pub component_imports: Vec<String>,
    pub compiled: Result<String, TranspileError>,
}

/// Text of a unit split so the compiled body can be located in the document.
#[derive(Debug, Clone)]
pub struct UnitText {
    pub prelude: String,
    pub body: String,
    pub epilogue: String,
}

impl ComponentUnit {
    /// Rewrite and compile `file`. `global` is set for the entry file only.
    pub fn compile(file: &File, index: &PathIndex, global: Option<&str>) -> Self {
        let rewritten = rewrite_component_source(&file.content, &file.directory(), index);
        let compiled = lower_component(
            &rewritten.code,
            &file.name,
            file.kind() == FileKind::TypedComponent,
        );
        Self::from_parts(file, global, rewritten, compiled)
    }

    pub fn from_parts(
        file: &File,
        global: Option<&str>,
        rewritten: RewrittenSource,
        compiled: Result<String, TranspileError>,
    ) -> Self {
        Self {
            path: file.canonical_path(),
            name: file.name.clone(),
            aliases: registration_names(file),
            global: global.map(str::to_string),
            framework_bindings: rewritten.framework_bindings,
            component_imports: rewritten.component_imports,
            compiled,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.compiled.is_err()
    }

    pub fn render(&self) -> UnitText {
        let label = js_string(&format!("Error in {}:", self.name));
        match &self.compiled {
            Err(err) => UnitText {
                prelude: String::new(),
                body: format!("console.error({}, {});", label, js_string(&err.to_string())),
                epilogue: String::new(),
            },
            Ok(body) => UnitText {
                prelude: self.prelude(),
                body: body.clone(),
                epilogue: self.epilogue(&label),
            },
        }
    }

    fn prelude(&self) -> String {
        let mut bindings: Vec<(String, String)> = AMBIENT_HOOKS
            .iter()
            .map(|h| (h.to_string(), format!("React.{}", h)))
            .collect();
        for (local, expr) in &self.framework_bindings {
            if !bindings.iter().any(|(l, _)| l == local) {
                bindings.push((local.clone(), expr.clone()));
            }
        }
        let bindings = bindings
            .iter()
            .map(|(local, expr)| format!("{} = {}", local, expr))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"// Component: /{path}
try {{
(function () {{
  const React = window.React;
  const ReactDOM = window.ReactDOM;
  const {bindings};
  const requireModule = window.__PREVIEW__.require;
  const requireDefault = window.__PREVIEW__.requireDefault;
  const importComponent = function (name) {{
    const found = window.__PREVIEW__.getComponent(name);
    if (found) return found;
    console.warn("Component not found: " + name);
    return function MissingComponent() {{
      return React.createElement("div", {{ style: {{ color: "red" }} }}, "Component not found: " + name);
    }};
  }};
"#,
            path = self.path,
            bindings = bindings,
        )
    }

    fn epilogue(&self, label: &str) -> String {
        let aliases = serde_json::to_string(&self.aliases).unwrap_or_else(|_| "[]".to_string());
        let global = match &self.global {
            Some(global) => format!(
                "\n    window[{}] = {};",
                js_string(global),
                EXPORT_BINDING
            ),
            None => String::new(),
        };
        format!(
            r#"
  if (typeof {export} !== "undefined") {{
    {aliases}.forEach(function (alias) {{
      window.__PREVIEW__.registerComponent(alias, {export});
    }});{global}
  }}
}})();
}} catch (error) {{
  console.error({label}, error);
}}"#,
            export = EXPORT_BINDING,
            aliases = aliases,
            global = global,
            label = label,
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCRIPT MODULES
// ═══════════════════════════════════════════════════════════════════════════════

/// A plain script file wrapped as a module with a private `exports` object.
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    pub path: String,
    pub body: String,
    pub exported: Vec<(String, String)>,
}

impl ScriptUnit {
    pub fn new(file: &File, index: &PathIndex) -> Self {
        let (body, exported) = rewrite_script_source(&file.content, &file.directory(), index);
        Self {
            path: file.canonical_path(),
            body,
            exported,
        }
    }

    pub fn render(&self) -> UnitText {
        let path = js_string(&self.path);
        let label = js_string(&format!("Error in /{}:", self.path));
        let publish: String = self
            .exported
            .iter()
            .map(|(name, local)| format!("\n    exports[{}] = {};", js_string(name), local))
            .collect();
        UnitText {
            prelude: format!(
                "// Module: /{}\n(function (exports) {{\n  const requireModule = window.__PREVIEW__.require;\n  const requireDefault = window.__PREVIEW__.requireDefault;\n  try {{\n",
                self.path
            ),
            body: self.body.clone(),
            epilogue: format!(
                "{}\n  }} catch (error) {{\n    console.error({}, error);\n  }}\n}})(window.__PREVIEW__.defineModule({}));",
                publish, label, path
            ),
        }
    }
}

/// Rewrite a script's imports and exports. Returns the body and the
/// `(exported, local)` names to publish after it runs.
pub fn rewrite_script_source(
    source: &str,
    dir: &str,
    index: &PathIndex,
) -> (String, Vec<(String, String)>) {
    let mut exported = Vec::new();

    let code = replace_keeping_lines(&FROM_IMPORT_RE, source, |caps| {
        let clause = ImportClause::parse(&caps[1]);
        match index.resolve(dir, &caps[2]) {
            Some(target) if target.kind().is_code() => {
                let path = js_string(&target.canonical_path());
                clause.bind(
                    &format!("requireDefault({})", path),
                    &format!("requireModule({})", path),
                )
            }
            _ => format!("/* unresolved import {} */", js_string(&caps[2])),
        }
    });

    let code = replace_keeping_lines(&SIDE_EFFECT_IMPORT_RE, &code, |_| String::new());

    let code = replace_keeping_lines(&EXPORT_DEFAULT_RE, &code, |_| "exports.default = ".to_string());

    let code = replace_keeping_lines(&EXPORT_LIST_RE, &code, |caps| {
        let list = caps[1].trim_start_matches('{').trim_end_matches('}');
        for spec in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let mut words = spec.split_whitespace();
            if let Some(local) = words.next() {
                let name = match (words.next(), words.next()) {
                    (Some("as"), Some(name)) => name,
                    _ => local,
                };
                exported.push((name.to_string(), local.to_string()));
            }
        }
        String::new()
    });

    let code = replace_keeping_lines(&EXPORT_DECL_RE, &code, |caps| {
        let name = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string());
        if let Some(name) = name {
            exported.push((name.clone(), name));
        }
        caps[1].to_string()
    });

    (code, exported)
}
