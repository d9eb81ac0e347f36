// Syntactic type inference shared by the extractors
//
// Best-effort only: nothing is resolved against a real type table.

use crate::model::UNKNOWN_TYPE;
use crate::parser::node_text;
use tree_sitter::Node;

/// Type name of a literal node, if it is one
pub(crate) fn literal_type(node: &Node, source: &[u8]) -> Option<&'static str> {
    let ty = match node.kind() {
        "integer" => "int",
        "float" => "float",
        "true" | "false" => "bool",
        "none" => "NoneType",
        "string" | "concatenated_string" => {
            let prefix: String = node_text(node, source)
                .chars()
                .take_while(|c| c.is_ascii_alphabetic())
                .collect();
            if prefix.to_ascii_lowercase().contains('b') {
                "bytes"
            } else {
                "str"
            }
        }
        _ => return None,
    };
    Some(ty)
}

/// Infer the type of an expression
pub(crate) fn infer_type(node: &Node, source: &[u8]) -> String {
    if let Some(ty) = literal_type(node, source) {
        return ty.to_string();
    }
    match node.kind() {
        "identifier" => node_text(node, source).to_string(),
        "list" | "list_comprehension" => "List".to_string(),
        "dictionary" | "dictionary_comprehension" => "Dict".to_string(),
        "set" | "set_comprehension" => "Set".to_string(),
        "tuple" => "Tuple".to_string(),
        "parenthesized_expression" => node
            .named_child(0)
            .map(|inner| infer_type(&inner, source))
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
        "call" => match node.child_by_field_name("function") {
            Some(callee) if callee.kind() == "identifier" => node_text(&callee, source).to_string(),
            _ => UNKNOWN_TYPE.to_string(),
        },
        _ => UNKNOWN_TYPE.to_string(),
    }
}

/// Text of a type annotation, with quoted forward references unquoted
pub(crate) fn annotation_text(node: &Node, source: &[u8]) -> String {
    let text = node_text(node, source).trim();
    let unquoted = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')));
    unquoted.unwrap_or(text).to_string()
}

/// Value of a literal default as Python's `str()` would render it.
/// f-strings are not constants and yield `None`.
pub(crate) fn literal_value(node: &Node, source: &[u8]) -> Option<String> {
    let text = node_text(node, source);
    match node.kind() {
        "integer" => Some(integer_value(text)),
        "float" => Some(float_value(text)),
        "true" | "false" | "none" => Some(text.to_string()),
        "ellipsis" => Some("Ellipsis".to_string()),
        "string" => string_value(node, source),
        "concatenated_string" => {
            let mut value = String::new();
            let mut cursor = node.walk();
            for part in node.named_children(&mut cursor) {
                value.push_str(&string_value(&part, source)?);
            }
            Some(value)
        }
        "unary_operator" => {
            let operand = node.child_by_field_name("argument")?;
            let operator = node.child_by_field_name("operator")?;
            if !matches!(operand.kind(), "integer" | "float") {
                return None;
            }
            let value = literal_value(&operand, source)?;
            match node_text(&operator, source) {
                "-" => Some(format!("-{}", value)),
                "+" => Some(value),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Decimal rendering of an integer literal (`0x10` -> `16`, `1_000` -> `1000`)
fn integer_value(text: &str) -> String {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if lower.ends_with('j') {
        return lower;
    }
    let (radix, body) = match lower.get(..2) {
        Some("0x") => (16, &lower[2..]),
        Some("0o") => (8, &lower[2..]),
        Some("0b") => (2, &lower[2..]),
        _ => (10, lower.as_str()),
    };
    match u128::from_str_radix(body, radix) {
        Ok(value) => value.to_string(),
        Err(_) => digits,
    }
}

/// Python `repr` of a float literal (`1e3` -> `1000.0`, `1e-5` -> `1e-05`)
fn float_value(text: &str) -> String {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if lower.ends_with('j') {
        return lower;
    }
    let Ok(value) = lower.parse::<f64>() else {
        return digits;
    };
    if value.is_infinite() {
        return "inf".to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{:e}", value);
        return match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, power) = match exponent.strip_prefix('-') {
                    Some(power) => ('-', power),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, power)
            }
            None => scientific,
        };
    }
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Contents of one string literal with escapes processed; `None` for f-strings
fn string_value(node: &Node, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = node_text(node, source);
    let prefix: String = text
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if prefix.contains('f') {
        return None;
    }
    let body = &text[prefix.len()..];
    let quote_len = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        3
    } else {
        1
    };
    if body.len() < quote_len * 2 {
        return Some(String::new());
    }
    let inner = &body[quote_len..body.len() - quote_len];
    if prefix.contains('r') {
        Some(inner.to_string())
    } else {
        Some(unescape(inner))
    }
}

/// Process the backslash escapes of a non-raw string body
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            // line continuation
            '\n' => {}
            '\\' | '\'' | '"' => out.push(escaped),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(code));
            }
            'x' | 'u' | 'U' => {
                let width = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.by_ref().take(width).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(escaped);
                        out.push_str(&hex);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

/// Full dotted name of a bare identifier or pure attribute chain (`a.b.c`).
/// Chains rooted in anything else (calls, subscripts) do not resolve.
pub(crate) fn attribute_chain(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(node, source).to_string()),
        "attribute" => {
            let object = node.child_by_field_name("object")?;
            let attr = node.child_by_field_name("attribute")?;
            let base = attribute_chain(&object, source)?;
            Some(format!("{}.{}", base, node_text(&attr, source)))
        }
        _ => None,
    }
}

/// Targets and value of an assignment, unfolding chains like `a = b = value`
pub(crate) fn assignment_parts<'t>(assignment: &Node<'t>) -> (Vec<Node<'t>>, Option<Node<'t>>) {
    let mut targets = Vec::new();
    let mut current = *assignment;
    loop {
        if let Some(left) = current.child_by_field_name("left") {
            targets.push(left);
        }
        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            right => return (targets, right),
        }
    }
}

/// Python's `str.isupper()`: at least one cased character and no lowercase ones
pub(crate) fn is_constant_name(name: &str) -> bool {
    let last = name.rsplit('.').next().unwrap_or(name);
    let mut cased = false;
    for c in last.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;
    use std::path::Path;

    /// Run `f` on the right-hand side of `x = <expr>`
    fn with_rhs<T>(expr: &str, f: impl Fn(&Node, &[u8]) -> T) -> T {
        let source = format!("x = {}\n", expr);
        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse_source(&source, Path::new("t.py")).unwrap();
        let stmt = tree.root_node().named_child(0).unwrap();
        let assign = stmt.named_child(0).unwrap();
        let right = assign.child_by_field_name("right").unwrap();
        f(&right, source.as_bytes())
    }

    fn infer(expr: &str) -> String {
        with_rhs(expr, infer_type)
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(infer("1"), "int");
        assert_eq!(infer("1.5"), "float");
        assert_eq!(infer("'a'"), "str");
        assert_eq!(infer("f'{y}'"), "str");
        assert_eq!(infer("b'raw'"), "bytes");
        assert_eq!(infer("True"), "bool");
        assert_eq!(infer("None"), "NoneType");
    }

    #[test]
    fn test_container_types() {
        assert_eq!(infer("[1, 2]"), "List");
        assert_eq!(infer("{'a': 1}"), "Dict");
        assert_eq!(infer("{1, 2}"), "Set");
        assert_eq!(infer("(1, 2)"), "Tuple");
    }

    #[test]
    fn test_identifier_and_call_types() {
        assert_eq!(infer("other"), "other");
        assert_eq!(infer("User(name)"), "User");
        assert_eq!(infer("self.make()"), "Any");
        assert_eq!(infer("a + b"), "Any");
    }

    fn value(expr: &str) -> Option<String> {
        with_rhs(expr, literal_value)
    }

    #[test]
    fn test_literal_values() {
        assert_eq!(value("'abc'"), Some("abc".to_string()));
        assert_eq!(value("42"), Some("42".to_string()));
        assert_eq!(value("-1"), Some("-1".to_string()));
        assert_eq!(value("None"), Some("None".to_string()));
        assert_eq!(value("..."), Some("Ellipsis".to_string()));
        assert_eq!(value("make()"), None);
        assert_eq!(value("[]"), None);
    }

    #[test]
    fn test_numbers_render_like_python() {
        assert_eq!(value("0x10"), Some("16".to_string()));
        assert_eq!(value("0o17"), Some("15".to_string()));
        assert_eq!(value("0b101"), Some("5".to_string()));
        assert_eq!(value("1_000"), Some("1000".to_string()));
        assert_eq!(value("-0x10"), Some("-16".to_string()));
        assert_eq!(value("1.50"), Some("1.5".to_string()));
        assert_eq!(value("1e3"), Some("1000.0".to_string()));
        assert_eq!(value("2."), Some("2.0".to_string()));
        assert_eq!(value("1e-5"), Some("1e-05".to_string()));
        assert_eq!(value("1.5e20"), Some("1.5e+20".to_string()));
        assert_eq!(value("3j"), Some("3j".to_string()));
    }

    #[test]
    fn test_strings_render_like_python() {
        assert_eq!(value(r"'a\nb'"), Some("a\nb".to_string()));
        assert_eq!(value(r"'tab\there'"), Some("tab\there".to_string()));
        assert_eq!(value(r"'\x41é'"), Some("A\u{e9}".to_string()));
        assert_eq!(value(r"r'a\nb'"), Some(r"a\nb".to_string()));
        assert_eq!(value(r"'keep\d'"), Some(r"keep\d".to_string()));
        assert_eq!(value("'a' 'b'"), Some("ab".to_string()));
        assert_eq!(value(r#""""doc""""#), Some("doc".to_string()));
    }

    #[test]
    fn test_fstrings_are_not_literal_values() {
        assert_eq!(value("f'{x}'"), None);
        assert_eq!(value("'a' f'{x}'"), None);
    }

    #[test]
    fn test_attribute_chain() {
        assert_eq!(with_rhs("self.a.b", attribute_chain), Some("self.a.b".to_string()));
        assert_eq!(with_rhs("name", attribute_chain), Some("name".to_string()));
        assert_eq!(with_rhs("get().a", attribute_chain), None);
    }

    #[test]
    fn test_assignment_parts_unfolds_chains() {
        let source = "a = b.c = value\n";
        let mut parser = PythonParser::new().unwrap();
        let tree = parser.parse_source(source, Path::new("t.py")).unwrap();
        let assign = tree.root_node().named_child(0).unwrap().named_child(0).unwrap();

        let (targets, value) = assignment_parts(&assign);
        let names: Vec<&str> = targets.iter().map(|t| node_text(t, source.as_bytes())).collect();
        assert_eq!(names, vec!["a", "b.c"]);
        assert_eq!(node_text(&value.unwrap(), source.as_bytes()), "value");
    }

    #[test]
    fn test_is_constant_name() {
        assert!(is_constant_name("X"));
        assert!(is_constant_name("MAX_SIZE"));
        assert!(is_constant_name("HTTP2"));
        assert!(is_constant_name("self.LIMIT"));
        assert!(!is_constant_name("Max"));
        assert!(!is_constant_name("_"));
        assert!(!is_constant_name("123"));
    }
}
