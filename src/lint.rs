//! Per-file syntax checks feeding the problems list.
//!
//! These run independently of the build pass: a file with problems is still
//! built, and its issues are reported next to the runtime errors.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::files::{File, FileKind};

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose end tag may be omitted.
const OPTIONAL_CLOSE: [&str; 10] = [
    "p", "li", "dt", "dd", "tr", "td", "th", "option", "thead", "tbody",
];

lazy_static! {
    static ref TAG_RE: Regex =
        Regex::new(r"(?s)<!--.*?-->|<!(?:[^>]*)>|<(/?)([a-zA-Z][\w:-]*)((?:[^>'\x22]|'[^']*'|\x22[^\x22]*\x22)*?)(/?)>").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One problem in one file. `line` and `column` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxIssue {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    /// File name the issue belongs to.
    pub source: String,
}

pub fn check_file(file: &File) -> Vec<SyntaxIssue> {
    check_syntax(&file.name, &file.content)
}

/// Check `content` according to the kind implied by `name`.
pub fn check_syntax(name: &str, content: &str) -> Vec<SyntaxIssue> {
    let issue = |offset: usize, message: String, severity: Severity| {
        let (line, column) = position(content, offset);
        SyntaxIssue {
            message,
            line,
            column,
            severity,
            source: name.to_string(),
        }
    };

    match FileKind::from_name(name) {
        FileKind::Markup => check_markup(content)
            .into_iter()
            .map(|(offset, message, severity)| issue(offset, message, severity))
            .collect(),
        FileKind::Style => check_style(content)
            .into_iter()
            .map(|(offset, message)| issue(offset, message, Severity::Error))
            .collect(),
        FileKind::Json => match serde_json::from_str::<serde_json::Value>(content) {
            Ok(_) => Vec::new(),
            Err(e) => vec![SyntaxIssue {
                message: e.to_string(),
                line: e.line().max(1),
                column: e.column().max(1),
                severity: Severity::Error,
                source: name.to_string(),
            }],
        },
        kind @ (FileKind::Script | FileKind::Component | FileKind::TypedComponent) => {
            check_code(content, kind == FileKind::TypedComponent)
                .into_iter()
                .map(|(offset, message)| issue(offset, message, Severity::Error))
                .collect()
        }
        FileKind::Other => Vec::new(),
    }
}

/// 1-based line and column of byte `offset`.
pub fn position(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, before[line_start..].chars().count() + 1)
}

fn check_code(content: &str, typed: bool) -> Vec<(usize, String)> {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_module(true)
        .with_typescript(typed)
        .with_jsx(true);
    let ret = Parser::new(&allocator, content, source_type).parse();
    ret.errors
        .iter()
        .map(|error| {
            let offset = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| label.offset())
                .unwrap_or(0);
            (offset, error.message.to_string())
        })
        .collect()
}

fn check_style(content: &str) -> Vec<(usize, String)> {
    let mut issues = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let bytes = content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                match content[i + 2..].find("*/") {
                    Some(end) => i += end + 4,
                    None => {
                        issues.push((i, "Unterminated comment".to_string()));
                        break;
                    }
                }
                continue;
            }
            quote @ (b'"' | b'\'') => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] != quote && bytes[j] != b'\n' {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                if j >= bytes.len() || bytes[j] != quote {
                    issues.push((i, "Unterminated string".to_string()));
                }
                i = j + 1;
                continue;
            }
            b'{' => open.push(i),
            b'}' => {
                if open.pop().is_none() {
                    issues.push((i, "Unexpected }".to_string()));
                }
            }
            _ => {}
        }
        i += 1;
    }
    for offset in open {
        issues.push((offset, "{ is never closed".to_string()));
    }
    issues.sort_by_key(|(offset, _)| *offset);
    issues
}

fn check_markup(content: &str) -> Vec<(usize, String, Severity)> {
    let mut issues = Vec::new();
    let mut stack: Vec<(String, usize)> = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = TAG_RE.captures_at(content, cursor) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        cursor = whole.end.max(cursor + 1);
        let Some(tag) = caps.get(2) else { continue };
        let name = tag.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(4).is_some_and(|m| !m.as_str().is_empty());

        if closing {
            match stack.iter().rposition(|(open, _)| *open == name) {
                Some(pos) => {
                    for (unclosed, offset) in stack.drain(pos..).skip(1) {
                        if !OPTIONAL_CLOSE.contains(&unclosed.as_str()) {
                            issues.push((
                                offset,
                                format!("<{}> is not closed before </{}>", unclosed, name),
                                Severity::Warning,
                            ));
                        }
                    }
                }
                None => {
                    if !VOID_ELEMENTS.contains(&name.as_str()) {
                        issues.push((
                            whole.start,
                            format!("Unexpected closing tag </{}>", name),
                            Severity::Error,
                        ));
                    }
                }
            }
            continue;
        }

        if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
            continue;
        }

        if name == "script" || name == "style" || name == "textarea" || name == "title" {
            let close = format!("</{}", name);
            match content[cursor..].to_ascii_lowercase().find(&close) {
                Some(end) => cursor += end,
                None => {
                    issues.push((whole.start, format!("<{}> is never closed", name), Severity::Error));
                    break;
                }
            }
        }
        stack.push((name, whole.start));
    }

    for (name, offset) in stack {
        if !OPTIONAL_CLOSE.contains(&name.as_str()) {
            issues.push((offset, format!("<{}> is never closed", name), Severity::Warning));
        }
    }
    issues.sort_by_key(|(offset, _, _)| *offset);
    issues
}
