//! Component registry with fuzzy lookup.
//!
//! The same lookup runs in two places: [`ModuleRegistry`] at build time (to
//! report component imports that will miss), and the script returned by
//! [`runtime_script`] inside the sandbox, where compiled components register
//! themselves. Both walk the strategies in the same order over the same
//! extension list.

use std::collections::HashMap;

/// Suffixes tried after an exact miss, in order.
pub const COMPONENT_EXTENSIONS: [&str; 4] = [".jsx", ".js", ".tsx", ".ts"];

/// Insertion-ordered name → value map.
#[derive(Debug, Clone)]
pub struct ModuleRegistry<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for ModuleRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> ModuleRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `name`. A later registration under the same name wins.
    pub fn register(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Find a registration for `name`, or `None` when every strategy misses.
    pub fn resolve(&self, name: &str) -> Option<&T> {
        if name.is_empty() {
            return None;
        }
        if let Some(found) = self.lookup(name) {
            return Some(found);
        }

        let (dir, last) = name.rsplit_once('/')?;
        if let Some(found) = self.lookup(last) {
            return Some(found);
        }

        let dir = trim_relative_prefix(dir);
        let index = if dir.is_empty() {
            "index".to_string()
        } else {
            format!("{}/index", dir)
        };
        if let Some(found) = self.get(&index) {
            return Some(found);
        }
        COMPONENT_EXTENSIONS
            .iter()
            .find_map(|ext| self.get(&format!("{}{}", index, ext)))
    }

    fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    fn lookup(&self, name: &str) -> Option<&T> {
        if let Some(found) = self.get(name) {
            return Some(found);
        }

        for ext in COMPONENT_EXTENSIONS {
            if let Some(found) = self.get(&format!("{}{}", name, ext)) {
                return Some(found);
            }
        }

        let lowered = name.to_lowercase();
        if let Some((_, found)) = self
            .entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == lowered)
        {
            return Some(found);
        }

        case_variants(name)
            .iter()
            .find_map(|variant| self.get(variant))
    }
}

/// Drop leading `./` and `../` groups so `./components/Button` can match a
/// registration under `components/Button`.
fn trim_relative_prefix(dir: &str) -> &str {
    let mut rest = dir;
    loop {
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("../") {
            rest = r;
        } else if rest == "." || rest == ".." {
            return "";
        } else {
            return rest;
        }
    }
}

/// Case-convention rewrites: Pascal, camel, kebab to camel, kebab to Pascal.
pub fn case_variants(name: &str) -> Vec<String> {
    let pascal = upper_first(name);
    let camel = lower_first(name);
    let kebab_camel = kebab_to_camel(name);
    let kebab_pascal = upper_first(&kebab_camel);
    vec![pascal, camel, kebab_camel, kebab_pascal]
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn kebab_to_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for c in s.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// SANDBOX RUNTIME
// ═══════════════════════════════════════════════════════════════════════════════

const RUNTIME_TEMPLATE: &str = r#"(function () {
  var preview = window.__PREVIEW__ = window.__PREVIEW__ || {};
  var names = [];
  var components = {};
  var EXTENSIONS = __EXTENSIONS__;

  function upperFirst(s) { return s.charAt(0).toUpperCase() + s.slice(1); }
  function lowerFirst(s) { return s.charAt(0).toLowerCase() + s.slice(1); }
  function kebabToCamel(s) {
    return s.replace(/-([a-zA-Z0-9])/g, function (_, c) { return c.toUpperCase(); });
  }
  function has(name) { return Object.prototype.hasOwnProperty.call(components, name); }

  function lookup(name) {
    if (has(name)) return components[name];
    for (var i = 0; i < EXTENSIONS.length; i++) {
      if (has(name + EXTENSIONS[i])) return components[name + EXTENSIONS[i]];
    }
    var lowered = name.toLowerCase();
    for (var j = 0; j < names.length; j++) {
      if (names[j].toLowerCase() === lowered) return components[names[j]];
    }
    var camel = kebabToCamel(name);
    var variants = [upperFirst(name), lowerFirst(name), camel, upperFirst(camel)];
    for (var k = 0; k < variants.length; k++) {
      if (has(variants[k])) return components[variants[k]];
    }
    return null;
  }

  preview.registerComponent = function (name, component) {
    if (!has(name)) names.push(name);
    components[name] = component;
  };

  preview.getComponent = function (name) {
    if (!name) return null;
    var found = lookup(name);
    if (found) return found;
    var slash = name.lastIndexOf('/');
    if (slash === -1) return null;
    found = lookup(name.slice(slash + 1));
    if (found) return found;
    var dir = name.slice(0, slash).replace(/^(\.\.?\/)+/, '').replace(/^\.\.?$/, '');
    var index = dir ? dir + '/index' : 'index';
    if (has(index)) return components[index];
    for (var i = 0; i < EXTENSIONS.length; i++) {
      if (has(index + EXTENSIONS[i])) return components[index + EXTENSIONS[i]];
    }
    return null;
  };

  preview.listComponents = function () { return names.slice(); };
})();"#;

/// Registry implementation installed into the sandbox before any component runs.
pub fn runtime_script() -> String {
    let extensions = serde_json::to_string(&COMPONENT_EXTENSIONS).unwrap_or_else(|_| "[]".into());
    RUNTIME_TEMPLATE.replace("__EXTENSIONS__", &extensions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_extension() {
        let mut reg = ModuleRegistry::new();
        reg.register("Button.jsx", 1);
        assert_eq!(reg.resolve("Button.jsx"), Some(&1));
        assert_eq!(reg.resolve("Button"), Some(&1));
    }

    #[test]
    fn test_case_conventions() {
        let mut reg = ModuleRegistry::new();
        reg.register("MyWidget", "w");
        assert_eq!(reg.resolve("myWidget"), Some(&"w"));
        assert_eq!(reg.resolve("my-widget"), Some(&"w"));
        assert_eq!(reg.resolve("MYWIDGET"), Some(&"w"));
    }

    #[test]
    fn test_case_insensitive_prefers_first_registered() {
        let mut reg = ModuleRegistry::new();
        reg.register("Card", 1);
        reg.register("CARD", 2);
        assert_eq!(reg.resolve("card"), Some(&1));
    }

    #[test]
    fn test_last_registration_wins() {
        let mut reg = ModuleRegistry::new();
        reg.register("App", 1);
        reg.register("App", 2);
        assert_eq!(reg.resolve("App"), Some(&2));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_path_falls_back_to_last_segment() {
        let mut reg = ModuleRegistry::new();
        reg.register("Header", "h");
        assert_eq!(reg.resolve("./components/Header"), Some(&"h"));
        assert_eq!(reg.resolve("../layout/header"), Some(&"h"));
    }

    #[test]
    fn test_directory_index() {
        let mut reg = ModuleRegistry::new();
        reg.register("widgets/index.jsx", "idx");
        assert_eq!(reg.resolve("./widgets/Missing"), Some(&"idx"));
    }

    #[test]
    fn test_miss_returns_none() {
        let mut reg: ModuleRegistry<u8> = ModuleRegistry::new();
        assert_eq!(reg.resolve("Nothing"), None);
        assert_eq!(reg.resolve(""), None);
        reg.register("App", 1);
        assert_eq!(reg.resolve("./a/b/Nothing"), None);
    }

    #[test]
    fn test_case_variants() {
        assert_eq!(
            case_variants("my-widget"),
            vec!["My-widget", "my-widget", "myWidget", "MyWidget"]
        );
    }

    #[test]
    fn test_runtime_script_carries_extensions() {
        let js = runtime_script();
        assert!(js.contains(r#"[".jsx",".js",".tsx",".ts"]"#));
        assert!(js.contains("preview.registerComponent"));
        assert!(js.contains("preview.getComponent"));
        assert!(!js.contains("__EXTENSIONS__"));
    }
}
