//! Entry markup handling.
//!
//! The markup page is embedded into the generated document, so its own
//! document wrappers are stripped, and tags that load project files are
//! removed because those files are inlined anyway. An html5ever parse gives
//! the outline used for build diagnostics.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::{Captures, Regex};

lazy_static! {
    static ref WRAPPER_TAG_RE: Regex =
        Regex::new(r"(?i)<!doctype[^>]*>|</?html\b[^>]*>|</?head\b[^>]*>|</?body\b[^>]*>").unwrap();
    static ref LINK_TAG_RE: Regex = Regex::new(r"(?is)<link\b[^>]*>").unwrap();
    static ref SCRIPT_SRC_RE: Regex =
        Regex::new(r"(?is)<script\b[^>]*\bsrc\s*=[^>]*>\s*</script\s*>").unwrap();
    static ref HREF_RE: Regex = Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap();
    static ref SRC_RE: Regex = Regex::new(r#"(?i)\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap();
    static ref REL_STYLESHEET_RE: Regex = Regex::new(r#"(?i)\brel\s*=\s*["']?stylesheet"#).unwrap();
}

/// What a markup page references.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarkupOutline {
    pub title: Option<String>,
    /// Every `id` attribute in document order.
    pub ids: Vec<String>,
    /// `href`s of anchors pointing at other pages (`*.html`, `*.htm`).
    pub page_links: Vec<String>,
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
}

impl MarkupOutline {
    pub fn has_id(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }
}

/// Parse `html` and collect its outline. html5ever recovers from any input,
/// so this never fails on malformed markup.
pub fn outline(html: &str) -> MarkupOutline {
    let mut outline = MarkupOutline::default();
    let dom = match parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
    {
        Ok(dom) => dom,
        Err(e) => {
            tracing::debug!(error = %e, "markup could not be read");
            return outline;
        }
    };
    walk(&dom.document, &mut outline);
    outline
}

fn walk(handle: &Handle, outline: &mut MarkupOutline) {
    if let NodeData::Element { name, attrs, .. } = &handle.data {
        let tag = name.local.to_string();
        let attributes = attrs.borrow();
        let attr = |key: &str| {
            attributes
                .iter()
                .find(|a| a.name.local.to_string() == key)
                .map(|a| a.value.to_string())
        };

        if let Some(id) = attr("id") {
            outline.ids.push(id);
        }
        match tag.as_str() {
            "a" => {
                if let Some(href) = attr("href") {
                    if is_page_link(&href) {
                        outline.page_links.push(href);
                    }
                }
            }
            "link" => {
                let rel = attr("rel").unwrap_or_default().to_ascii_lowercase();
                if rel.split_whitespace().any(|r| r == "stylesheet") {
                    if let Some(href) = attr("href") {
                        outline.stylesheets.push(href);
                    }
                }
            }
            "script" => {
                if let Some(src) = attr("src") {
                    outline.scripts.push(src);
                }
            }
            "title" if outline.title.is_none() => {
                let text = text_content(handle);
                if !text.trim().is_empty() {
                    outline.title = Some(text.trim().to_string());
                }
            }
            _ => {}
        }
    }

    for child in handle.children.borrow().iter() {
        walk(child, outline);
    }
}

fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            _ => out.push_str(&text_content(child)),
        }
    }
    out
}

fn is_page_link(href: &str) -> bool {
    if href.contains("://") || href.starts_with("//") || href.starts_with('#') {
        return false;
    }
    let path = href.split(['?', '#']).next().unwrap_or(href).to_ascii_lowercase();
    path.ends_with(".html") || path.ends_with(".htm")
}

/// Last path segment of a page link (`./pages/about.html?x` → `about.html`).
pub fn page_name(href: &str) -> &str {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.rsplit('/').next().unwrap_or(path)
}

/// Remove `<!DOCTYPE>`, `<html>`, `<head>` and `<body>` tags, keeping their content.
pub fn strip_document_wrappers(html: &str) -> String {
    WRAPPER_TAG_RE.replace_all(html, "").into_owned()
}

/// Remove stylesheet links and external scripts whose target satisfies `is_local`.
pub fn strip_local_asset_tags<F>(html: &str, is_local: F) -> String
where
    F: Fn(&str) -> bool,
{
    let attr_value = |re: &Regex, tag: &str| -> Option<String> {
        re.captures(tag).and_then(|c| {
            c.get(1)
                .or_else(|| c.get(2))
                .or_else(|| c.get(3))
                .map(|m| m.as_str().to_string())
        })
    };

    let without_links = LINK_TAG_RE.replace_all(html, |caps: &Captures| {
        let tag = &caps[0];
        match attr_value(&HREF_RE, tag) {
            Some(href) if REL_STYLESHEET_RE.is_match(tag) && is_local(&href) => String::new(),
            _ => tag.to_string(),
        }
    });

    SCRIPT_SRC_RE
        .replace_all(&without_links, |caps: &Captures| {
            let tag = &caps[0];
            match attr_value(&SRC_RE, tag) {
                Some(src) if is_local(&src) => String::new(),
                _ => tag.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <title> Demo </title>
  <link rel="stylesheet" href="styles.css">
  <link rel="stylesheet" href="https://cdn.example.com/x.css">
  <link rel="icon" href="favicon.ico">
</head>
<body class="main">
  <div id="app"></div>
  <a href="about.html">About</a>
  <a href="https://example.com/other.html">Ext</a>
  <a href="#top">Top</a>
  <script src="./script.js"></script>
</body>
</html>"##;

    #[test]
    fn test_outline() {
        let outline = outline(PAGE);
        assert_eq!(outline.title.as_deref(), Some("Demo"));
        assert!(outline.has_id("app"));
        assert_eq!(outline.page_links, vec!["about.html"]);
        assert_eq!(
            outline.stylesheets,
            vec!["styles.css", "https://cdn.example.com/x.css"]
        );
        assert_eq!(outline.scripts, vec!["./script.js"]);
    }

    #[test]
    fn test_strip_document_wrappers() {
        let stripped = strip_document_wrappers(PAGE);
        assert!(!stripped.to_lowercase().contains("<html"));
        assert!(!stripped.contains("<head>"));
        assert!(!stripped.contains("</body>"));
        assert!(!stripped.contains("<!DOCTYPE"));
        assert!(stripped.contains(r#"<div id="app"></div>"#));
    }

    #[test]
    fn test_wrapper_regex_spares_similar_tags() {
        let html = "<header>h</header><bodyguard></bodyguard>";
        assert_eq!(strip_document_wrappers(html), html);
    }

    #[test]
    fn test_strip_local_asset_tags() {
        let stripped = strip_local_asset_tags(PAGE, |p| !p.contains("://"));
        assert!(!stripped.contains(r#"href="styles.css""#));
        assert!(stripped.contains("https://cdn.example.com/x.css"));
        assert!(stripped.contains("favicon.ico"));
        assert!(!stripped.contains("script.js"));
    }

    #[test]
    fn test_page_name() {
        assert_eq!(page_name("./pages/about.html?x=1"), "about.html");
        assert_eq!(page_name("contact.html#form"), "contact.html");
    }
}
