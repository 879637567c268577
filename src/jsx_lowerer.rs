//! JSX/TSX lowering for preview components.
//!
//! The parsed program is only read, never mutated. Output is produced by
//! splicing the original source: TypeScript-only syntax is blanked in place
//! and every outermost JSX element is replaced by nested
//! `React.createElement(tag, props, ...children)` calls.
//!
//! Each replacement carries exactly as many newlines as the text it replaces,
//! so line N of the output is line N of the input. Runtime errors reported by
//! the sandbox can therefore be mapped straight back to the user's file.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use regex::Regex;

use crate::error::TranspileError;

lazy_static! {
    static ref TS_MODIFIER_RE: Regex =
        Regex::new(r"\b(?:public|private|protected|readonly|override|abstract|declare)\b").unwrap();
    static ref CLASS_KEYWORD_RE: Regex = Regex::new(r"\bclass\b").unwrap();
}

/// Compile one component source. `typed` enables TypeScript syntax.
pub fn lower_component(
    source: &str,
    file_name: &str,
    typed: bool,
) -> Result<String, TranspileError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_module(true)
        .with_typescript(typed)
        .with_jsx(true);
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        return Err(TranspileError::Syntax {
            file: file_name.to_string(),
            message: error.to_string(),
        });
    }

    let lines = LineIndex::new(source);
    let mut collector = EditCollector::new(source, &lines);
    collector.visit_program(&ret.program);

    if let Some(construct) = collector.unsupported.into_iter().next() {
        return Err(TranspileError::Unsupported {
            file: file_name.to_string(),
            construct,
        });
    }

    Ok(splice(source, 0, source.len() as u32, collector.edits))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE SPLICING
// ═══════════════════════════════════════════════════════════════════════════════

struct Edit {
    start: u32,
    end: u32,
    text: String,
}

/// Byte offsets of line starts.
struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i as u32 + 1),
        );
        Self { starts }
    }

    fn line_of(&self, pos: u32) -> usize {
        self.starts.partition_point(|&s| s <= pos).saturating_sub(1)
    }
}

/// Copy `source[start..end]`, substituting non-overlapping edits.
fn splice(source: &str, start: u32, end: u32, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.start, std::cmp::Reverse(e.end)));
    let mut out = String::with_capacity((end - start) as usize);
    let mut cursor = start;
    for edit in edits {
        if edit.start < cursor || edit.end > end {
            continue;
        }
        out.push_str(&source[cursor as usize..edit.start as usize]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&source[cursor as usize..end as usize]);
    out
}

/// Same-shape whitespace: every character becomes a space, line breaks stay.
fn blank_text(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' { c } else { ' ' })
        .collect()
}

/// Output buffer that pads with newlines to stay on the source line it mirrors.
struct Emitter<'l> {
    out: String,
    line: usize,
    lines: &'l LineIndex,
}

impl<'l> Emitter<'l> {
    fn new(lines: &'l LineIndex, start: u32) -> Self {
        Self {
            out: String::new(),
            line: lines.line_of(start),
            lines,
        }
    }

    fn goto(&mut self, pos: u32) {
        let target = self.lines.line_of(pos);
        while self.line < target {
            self.out.push('\n');
            self.line += 1;
        }
    }

    fn push(&mut self, s: &str) {
        self.line += s.matches('\n').count();
        self.out.push_str(s);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EDIT COLLECTOR
// ═══════════════════════════════════════════════════════════════════════════════

struct EditCollector<'s> {
    source: &'s str,
    lines: &'s LineIndex,
    edits: Vec<Edit>,
    unsupported: Vec<String>,
}

impl<'s> EditCollector<'s> {
    fn new(source: &'s str, lines: &'s LineIndex) -> Self {
        Self {
            source,
            lines,
            edits: Vec::new(),
            unsupported: Vec::new(),
        }
    }

    fn blank(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        self.edits.push(Edit {
            start,
            end,
            text: blank_text(&self.source[start as usize..end as usize]),
        });
    }

    /// Type annotations may or may not carry their `:` in the span, and an
    /// optional `?` or definite `!` marker sits right before it.
    fn blank_annotation(&mut self, span: Span) {
        let bytes = self.source.as_bytes();
        let mut start = span.start as usize;
        let skip_ws = |mut i: usize| {
            while i > 0 && bytes[i - 1].is_ascii_whitespace() {
                i -= 1;
            }
            i
        };
        let at = skip_ws(start);
        if at > 0 && bytes[at - 1] == b':' {
            start = skip_ws(at - 1);
        }
        let at = skip_ws(start);
        if at > 0 && (bytes[at - 1] == b'?' || bytes[at - 1] == b'!') {
            start = at - 1;
        }
        self.blank(start as u32, span.end);
    }

    /// Blank TypeScript-only modifier keywords found in `[start, end)`.
    fn blank_modifiers(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        let source = self.source;
        let region = &source[start as usize..end as usize];
        for m in TS_MODIFIER_RE.find_iter(region) {
            self.blank(start + m.start() as u32, start + m.end() as u32);
        }
    }

    /// Blank the first `?` or `!` marker in `[start, end)`.
    fn blank_marker(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        let source = self.source;
        if let Some(i) = source[start as usize..end as usize].find(['?', '!']) {
            let at = start + i as u32;
            self.blank(at, at + 1);
        }
    }

    /// `constructor(private name: string)` keeps `name` as a plain parameter
    /// and assigns `this.name = name;` on the body's first line, after a
    /// leading `super(...)` call when there is one.
    fn lower_parameter_properties<'a>(&mut self, func: &Function<'a>) {
        let mut assignments = String::new();
        for param in &func.params.items {
            if param.accessibility.is_none() && !param.readonly && !param.r#override {
                continue;
            }
            let head = after_decorators(param.span.start, &param.decorators);
            self.blank_modifiers(head, param.pattern.span().start);
            match &param.pattern {
                BindingPattern::BindingIdentifier(id) => {
                    assignments.push_str(&format!(" this.{0} = {0};", id.name));
                }
                _ => self
                    .unsupported
                    .push("destructured parameter property".to_string()),
            }
        }
        let Some(body) = &func.body else {
            return;
        };
        if assignments.is_empty() {
            return;
        }
        let at = body
            .statements
            .iter()
            .find_map(|stmt| match stmt {
                Statement::ExpressionStatement(s) if is_super_call(&s.expression) => {
                    Some(s.span.end)
                }
                _ => None,
            })
            .unwrap_or(body.span.start + 1);
        self.edits.push(Edit {
            start: at,
            end: at,
            text: assignments,
        });
    }

    /// Lower an expression on its own, JSX inside it included.
    fn render_expression<'a>(&mut self, expr: &Expression<'a>) -> String {
        let mut nested = EditCollector::new(self.source, self.lines);
        nested.visit_expression(expr);
        self.unsupported.append(&mut nested.unsupported);
        let span = expr.span();
        splice(self.source, span.start, span.end, nested.edits)
    }

    fn raw(&self, span: Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }

    // ───────────────────────────────────────────────────────────────────────────
    // JSX printing
    // ───────────────────────────────────────────────────────────────────────────

    fn print_element<'a>(&mut self, element: &JSXElement<'a>, em: &mut Emitter) {
        let opening = &element.opening_element;
        em.push("React.createElement(");
        em.push(&tag_expression(&opening.name));
        em.push(", ");
        self.print_props(&opening.attributes, em);
        self.print_children(&element.children, em);
        em.push(")");
    }

    fn print_fragment<'a>(&mut self, fragment: &JSXFragment<'a>, em: &mut Emitter) {
        em.push("React.createElement(React.Fragment, null");
        self.print_children(&fragment.children, em);
        em.push(")");
    }

    fn print_props<'a>(&mut self, attributes: &[JSXAttributeItem<'a>], em: &mut Emitter) {
        if attributes.is_empty() {
            em.push("null");
            return;
        }

        em.push("{");
        for (i, item) in attributes.iter().enumerate() {
            if i > 0 {
                em.push(", ");
            }
            match item {
                JSXAttributeItem::Attribute(attr) => {
                    em.goto(attr.span.start);
                    let key = match &attr.name {
                        JSXAttributeName::Identifier(id) => id.name.to_string(),
                        JSXAttributeName::NamespacedName(ns) => {
                            format!("{}:{}", ns.namespace.name, ns.name.name)
                        }
                    };
                    if is_identifier_name(&key) {
                        em.push(&key);
                    } else {
                        em.push(&js_string(&key));
                    }
                    em.push(": ");
                    self.print_attribute_value(attr.value.as_ref(), em);
                }
                JSXAttributeItem::SpreadAttribute(spread) => {
                    em.goto(spread.span.start);
                    em.push("...");
                    let text = self.render_expression(&spread.argument);
                    em.push(&text);
                }
            }
        }
        em.push("}");
    }

    fn print_attribute_value<'a>(&mut self, value: Option<&JSXAttributeValue<'a>>, em: &mut Emitter) {
        match value {
            None => em.push("true"),
            Some(JSXAttributeValue::StringLiteral(s)) => {
                let raw = self.raw(s.span);
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
                em.push(&js_string(&decode_entities(inner)));
            }
            Some(JSXAttributeValue::ExpressionContainer(container)) => {
                match container.expression.as_expression() {
                    Some(expr) => {
                        em.goto(expr.span().start);
                        let text = self.render_expression(expr);
                        em.push(&text);
                    }
                    None => em.push("undefined"),
                }
            }
            Some(JSXAttributeValue::Element(el)) => {
                em.goto(el.span.start);
                self.print_element(el, em);
            }
            Some(JSXAttributeValue::Fragment(frag)) => {
                em.goto(frag.span.start);
                self.print_fragment(frag, em);
            }
        }
    }

    fn print_children<'a>(&mut self, children: &[JSXChild<'a>], em: &mut Emitter) {
        for child in children {
            match child {
                JSXChild::Text(t) => {
                    let raw = self.raw(t.span);
                    if let Some(text) = clean_jsx_text(raw) {
                        let lead = raw.len() - raw.trim_start().len();
                        em.push(", ");
                        em.goto(t.span.start + lead as u32);
                        em.push(&js_string(&decode_entities(&text)));
                    }
                }
                JSXChild::Element(el) => {
                    em.push(", ");
                    em.goto(el.span.start);
                    self.print_element(el, em);
                }
                JSXChild::Fragment(frag) => {
                    em.push(", ");
                    em.goto(frag.span.start);
                    self.print_fragment(frag, em);
                }
                JSXChild::ExpressionContainer(container) => {
                    // `{/* comment */}` lowers to nothing.
                    if let Some(expr) = container.expression.as_expression() {
                        em.push(", ");
                        em.goto(expr.span().start);
                        let text = self.render_expression(expr);
                        em.push(&text);
                    }
                }
                JSXChild::Spread(spread) => {
                    em.push(", ");
                    em.goto(spread.span.start);
                    em.push("...");
                    let text = self.render_expression(&spread.expression);
                    em.push(&text);
                }
            }
        }
    }
}

impl<'a, 's> Visit<'a> for EditCollector<'s> {
    fn visit_jsx_element(&mut self, it: &JSXElement<'a>) {
        let mut em = Emitter::new(self.lines, it.span.start);
        self.print_element(it, &mut em);
        em.goto(it.span.end);
        self.edits.push(Edit {
            start: it.span.start,
            end: it.span.end,
            text: em.out,
        });
    }

    fn visit_jsx_fragment(&mut self, it: &JSXFragment<'a>) {
        let mut em = Emitter::new(self.lines, it.span.start);
        self.print_fragment(it, &mut em);
        em.goto(it.span.end);
        self.edits.push(Edit {
            start: it.span.start,
            end: it.span.end,
            text: em.out,
        });
    }

    fn visit_statement(&mut self, it: &Statement<'a>) {
        match it {
            Statement::TSTypeAliasDeclaration(decl) => self.blank(decl.span.start, decl.span.end),
            Statement::TSInterfaceDeclaration(decl) => self.blank(decl.span.start, decl.span.end),
            Statement::TSModuleDeclaration(decl) => self.blank(decl.span.start, decl.span.end),
            Statement::TSEnumDeclaration(decl) => {
                self.unsupported.push(format!("enum '{}'", decl.id.name));
            }
            Statement::TSImportEqualsDeclaration(_) => {
                self.unsupported.push("import = require(...)".to_string());
            }
            // Overload signatures and ambient declarations have no runtime body.
            Statement::FunctionDeclaration(func) if func.body.is_none() => {
                self.blank(func.span.start, func.span.end)
            }
            Statement::VariableDeclaration(decl) if decl.declare => {
                self.blank(decl.span.start, decl.span.end)
            }
            Statement::ClassDeclaration(class) if class.declare => {
                self.blank(class.span.start, class.span.end)
            }
            _ => walk::walk_statement(self, it),
        }
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        let source = self.source;
        let head = after_decorators(it.span.start, &it.decorators);
        let region = &source[head as usize..it.body.span.start as usize];
        if let Some(keyword) = CLASS_KEYWORD_RE.find(region) {
            self.blank_modifiers(head, head + keyword.start() as u32);
        }
        if it.r#abstract {
            let before = source[..head as usize].trim_end();
            if before.ends_with("abstract") {
                let end = before.len() as u32;
                self.blank(end - "abstract".len() as u32, end);
            }
        }
        if let (Some(first), Some(last)) = (it.implements.first(), it.implements.last()) {
            let keyword = source[..first.span.start as usize]
                .rfind("implements")
                .map_or(first.span.start, |i| i as u32);
            self.blank(keyword, last.span.end);
        }
        walk::walk_class(self, it);
    }

    fn visit_class_element(&mut self, it: &ClassElement<'a>) {
        match it {
            ClassElement::TSIndexSignature(sig) => self.blank(sig.span.start, sig.span.end),
            ClassElement::MethodDefinition(method) => {
                let abstract_member =
                    matches!(method.r#type, MethodDefinitionType::TSAbstractMethodDefinition);
                // Abstract members and overload signatures have no body.
                if abstract_member || method.value.body.is_none() {
                    self.blank(method.span.start, method.span.end);
                    return;
                }
                let head = after_decorators(method.span.start, &method.decorators);
                self.blank_modifiers(head, method.key.span().start);
                if method.optional {
                    self.blank_marker(method.key.span().end, method.value.span.start);
                }
                if matches!(method.kind, MethodDefinitionKind::Constructor) {
                    self.lower_parameter_properties(&method.value);
                }
                walk::walk_class_element(self, it);
            }
            ClassElement::PropertyDefinition(prop) => {
                let abstract_member =
                    matches!(prop.r#type, PropertyDefinitionType::TSAbstractPropertyDefinition);
                if abstract_member || prop.declare {
                    self.blank(prop.span.start, prop.span.end);
                    return;
                }
                let head = after_decorators(prop.span.start, &prop.decorators);
                self.blank_modifiers(head, prop.key.span().start);
                if (prop.optional || prop.definite) && prop.type_annotation.is_none() {
                    let end = prop.value.as_ref().map_or(prop.span.end, |v| v.span().start);
                    self.blank_marker(prop.key.span().end, end);
                }
                walk::walk_class_element(self, it);
            }
            ClassElement::AccessorProperty(accessor) => {
                if matches!(accessor.r#type, AccessorPropertyType::TSAbstractAccessorProperty) {
                    self.blank(accessor.span.start, accessor.span.end);
                    return;
                }
                let head = after_decorators(accessor.span.start, &accessor.decorators);
                self.blank_modifiers(head, accessor.key.span().start);
                walk::walk_class_element(self, it);
            }
            ClassElement::StaticBlock(_) => walk::walk_class_element(self, it),
        }
    }

    /// `function f(this: Window, ...)`: the pseudo-parameter and its comma go.
    fn visit_ts_this_parameter(&mut self, it: &TSThisParameter<'a>) {
        let source = self.source;
        let end = it
            .type_annotation
            .as_ref()
            .map_or(it.span.end, |t| t.span.end.max(it.span.end));
        let rest = &source[end as usize..];
        let trimmed = rest.trim_start();
        let end = if trimmed.starts_with(',') {
            end + (rest.len() - trimmed.len()) as u32 + 1
        } else {
            end
        };
        self.blank(it.span.start, end);
    }

    fn visit_ts_type_annotation(&mut self, it: &TSTypeAnnotation<'a>) {
        self.blank_annotation(it.span);
    }

    fn visit_ts_type_parameter_declaration(&mut self, it: &TSTypeParameterDeclaration<'a>) {
        self.blank(it.span.start, it.span.end);
    }

    fn visit_ts_type_parameter_instantiation(&mut self, it: &TSTypeParameterInstantiation<'a>) {
        self.blank(it.span.start, it.span.end);
    }

    fn visit_ts_as_expression(&mut self, it: &TSAsExpression<'a>) {
        self.visit_expression(&it.expression);
        self.blank(it.expression.span().end, it.span.end);
    }

    fn visit_ts_satisfies_expression(&mut self, it: &TSSatisfiesExpression<'a>) {
        self.visit_expression(&it.expression);
        self.blank(it.expression.span().end, it.span.end);
    }

    fn visit_ts_non_null_expression(&mut self, it: &TSNonNullExpression<'a>) {
        self.visit_expression(&it.expression);
        self.blank(it.expression.span().end, it.span.end);
    }

    fn visit_ts_type_assertion(&mut self, it: &TSTypeAssertion<'a>) {
        self.blank(it.span.start, it.expression.span().start);
        self.visit_expression(&it.expression);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSX HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn after_decorators(start: u32, decorators: &[Decorator]) -> u32 {
    decorators.last().map_or(start, |d| d.span.end)
}

fn is_super_call(expr: &Expression) -> bool {
    matches!(expr, Expression::CallExpression(call) if matches!(call.callee, Expression::Super(_)))
}

fn tag_expression(name: &JSXElementName) -> String {
    match name {
        JSXElementName::Identifier(id) => intrinsic_or_reference(&id.name),
        JSXElementName::IdentifierReference(id) => intrinsic_or_reference(&id.name),
        JSXElementName::NamespacedName(ns) => {
            js_string(&format!("{}:{}", ns.namespace.name, ns.name.name))
        }
        JSXElementName::MemberExpression(member) => member_name(member),
        JSXElementName::ThisExpression(_) => "this".to_string(),
    }
}

/// Lowercase and dashed names are host elements; anything else is a binding.
fn intrinsic_or_reference(name: &str) -> String {
    let intrinsic = name.starts_with(|c: char| c.is_ascii_lowercase()) || name.contains('-');
    if intrinsic {
        js_string(name)
    } else {
        name.to_string()
    }
}

fn member_name(member: &JSXMemberExpression) -> String {
    let object = match &member.object {
        JSXMemberExpressionObject::IdentifierReference(id) => id.name.to_string(),
        JSXMemberExpressionObject::MemberExpression(inner) => member_name(inner),
        JSXMemberExpressionObject::ThisExpression(_) => "this".to_string(),
    };
    format!("{}.{}", object, member.property.name)
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Double-quoted JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// JSX text whitespace rules: lines are trimmed where they meet a line break,
/// blank lines vanish, and the remaining lines join with a single space.
/// `None` when nothing visible is left.
pub fn clean_jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    let last_non_empty = lines
        .iter()
        .rposition(|l| l.chars().any(|c| c != ' ' && c != '\t'));

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut text = line.replace('\t', " ");
        if i != 0 {
            text = text.trim_start_matches(' ').to_string();
        }
        if i != lines.len() - 1 {
            text = text.trim_end_matches(' ').to_string();
        }
        if text.is_empty() {
            continue;
        }
        out.push_str(&text);
        if Some(i) != last_non_empty {
            out.push(' ');
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

const NAMED_ENTITIES: [(&str, &str); 24] = [
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{a0}"),
    ("copy", "©"),
    ("reg", "®"),
    ("trade", "™"),
    ("hellip", "…"),
    ("mdash", "—"),
    ("ndash", "–"),
    ("lsquo", "‘"),
    ("rsquo", "’"),
    ("ldquo", "“"),
    ("rdquo", "”"),
    ("bull", "•"),
    ("middot", "·"),
    ("times", "×"),
    ("divide", "÷"),
    ("larr", "←"),
    ("rarr", "→"),
    ("euro", "€"),
    ("deg", "°"),
];

/// Decode HTML character references the way JSX text and attribute strings
/// are decoded. Unknown references are left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 10)
            .and_then(|semi| decode_reference(&after[..semi]).map(|s| (s, semi)));
        match decoded {
            Some((value, semi)) => {
                out.push_str(&value);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| c.to_string());
    }
    NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, value)| value.to_string())
}
