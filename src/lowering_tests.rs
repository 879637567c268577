#[cfg(test)]
mod tests {
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    use crate::error::TranspileError;
    use crate::jsx_lowerer::lower_component;

    fn jsx(src: &str) -> String {
        lower_component(src, "Test.jsx", false).unwrap()
    }

    fn tsx(src: &str) -> String {
        lower_component(src, "Test.tsx", true).unwrap()
    }

    fn assert_parses_as_js(out: &str) {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, out, SourceType::mjs()).parse();
        assert!(ret.errors.is_empty(), "{:?}\n{}", ret.errors, out);
    }

    #[test]
    fn test_intrinsic_element_with_props_and_text() {
        let out = jsx(r#"const el = <div className="x">Hello</div>;"#);
        assert_eq!(
            out,
            r#"const el = React.createElement("div", {className: "x"}, "Hello");"#
        );
    }

    #[test]
    fn test_component_reference_and_expression_child() {
        let out = jsx("const el = <Card title={t}>{count}</Card>;");
        assert_eq!(out, "const el = React.createElement(Card, {title: t}, count);");
    }

    #[test]
    fn test_fragment() {
        let out = jsx("const el = <><b>x</b></>;");
        assert_eq!(
            out,
            r#"const el = React.createElement(React.Fragment, null, React.createElement("b", null, "x"));"#
        );
    }

    #[test]
    fn test_member_tag() {
        let out = jsx("const el = <Foo.Bar x={1} />;");
        assert_eq!(out, "const el = React.createElement(Foo.Bar, {x: 1});");
    }

    #[test]
    fn test_dashed_attribute_spread_and_boolean() {
        let out = jsx(r#"const el = <input aria-label="Name" {...rest} disabled />;"#);
        assert_eq!(
            out,
            r#"const el = React.createElement("input", {"aria-label": "Name", ...rest, disabled: true});"#
        );
    }

    #[test]
    fn test_element_as_attribute_value() {
        let out = jsx("const el = <Route element={<Home />} />;");
        assert_eq!(
            out,
            "const el = React.createElement(Route, {element: React.createElement(Home, null)});"
        );
    }

    #[test]
    fn test_comment_child_and_entities() {
        assert_eq!(
            jsx("const el = <div>{/* note */}</div>;"),
            r#"const el = React.createElement("div", null);"#
        );
        assert_eq!(
            jsx("const el = <p>a &amp; b</p>;"),
            r#"const el = React.createElement("p", null, "a & b");"#
        );
    }

    #[test]
    fn test_jsx_inside_callback_is_lowered() {
        let out = jsx("const list = items.map(i => <li key={i}>{i}</li>);");
        assert_eq!(
            out,
            r#"const list = items.map(i => React.createElement("li", {key: i}, i));"#
        );
    }

    #[test]
    fn test_lines_are_retained() {
        let src = r#"function App() {
  return (
    <div>
      <h1>Hi</h1>
      {items.map(i => <p key={i}>{i}</p>)}
    </div>
  );
}
"#;
        let out = jsx(src);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), src.lines().count());
        assert!(lines[3].contains(r#""h1""#));
        assert!(lines[4].contains(r#""p""#));
        assert!(!out.contains('<'));
    }

    #[test]
    fn test_multiline_attributes_keep_lines() {
        let src = "const el = <Button\n  onClick={go}\n  label=\"Go\"\n/>;\nconst after = 1;\n";
        let out = jsx(src);
        assert_eq!(out.lines().count(), src.lines().count());
        assert_eq!(out.lines().nth(4), Some("const after = 1;"));
        assert!(out.lines().nth(1).unwrap_or("").contains("onClick: go"));
    }

    #[test]
    fn test_type_annotations_are_blanked() {
        let out = tsx("const add = (a: number, b?: number): number => a + (b ?? 0);");
        assert!(!out.contains("number"));
        assert!(!out.contains('?') || out.contains("??"));
        assert!(out.contains("=> a + (b ?? 0);"));
        assert!(out.starts_with("const add = (a"));
    }

    #[test]
    fn test_type_declarations_and_assertions_are_blanked() {
        let src = "interface Props { name: string }\ntype Id = string;\nconst x = value as string;\nconst y = maybe!;\nconst [s, set] = useState<string>(\"\");\n";
        let out = tsx(src);
        assert_eq!(out.lines().count(), src.lines().count());
        assert!(!out.contains("interface"));
        assert!(!out.contains("type Id"));
        assert!(!out.contains(" as "));
        assert!(out.contains("maybe ;"));
        assert!(!out.contains("<string>"));
        assert!(out.contains("useState"));
    }

    #[test]
    fn test_typed_component_with_jsx() {
        let src = "function Greeting({ name }: { name: string }) {\n  return <h1>Hello {name}</h1>;\n}\n";
        let out = tsx(src);
        assert!(out.contains(r#"React.createElement("h1", null, "Hello ", name)"#));
        assert!(!out.contains("string"));
    }

    #[test]
    fn test_typed_classes_lower_to_plain_js() {
        let src = "abstract class Base {\n  abstract render(): void;\n}\nclass Store extends Base implements Countable, Named<string> {\n  private count: number = 0;\n  declare label: string;\n  public readonly max?: number;\n  [key: string]: unknown;\n  constructor(public name: string, private readonly limit = 10) {\n    super();\n  }\n  static create(this: void, name: string): Store {\n    return new Store(name);\n  }\n  protected override render(): void {}\n}\n";
        let out = tsx(src);
        assert_parses_as_js(&out);
        assert_eq!(out.lines().count(), src.lines().count());
        for word in ["abstract", "implements", "private", "public", "protected", "readonly", "override", "label"] {
            assert!(!out.contains(word), "{} left in:\n{}", word, out);
        }
        assert!(out.contains("class Store extends Base"));
        assert!(out.lines().nth(9).unwrap_or("").contains("super(); this.name = name; this.limit = limit;"));
        assert!(out.contains("create("));
        assert!(!out.contains("this:"));
        assert!(out.contains("render()"));
    }

    #[test]
    fn test_parameter_properties_without_super() {
        let out = tsx("class Point {\n  constructor(readonly x: number, y: number) {}\n}\n");
        assert_parses_as_js(&out);
        assert!(out.contains("{ this.x = x;}"));
        assert!(!out.contains("this.y"));
    }

    #[test]
    fn test_enum_is_unsupported() {
        let err = lower_component("enum Color { Red }", "Colors.tsx", true).unwrap_err();
        assert!(matches!(err, TranspileError::Unsupported { .. }));
        assert!(err.to_string().contains("Colors.tsx"));
    }

    #[test]
    fn test_syntax_error_names_file() {
        let err = lower_component("const = <div>;", "Broken.jsx", false).unwrap_err();
        match err {
            TranspileError::Syntax { file, message } => {
                assert_eq!(file, "Broken.jsx");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
