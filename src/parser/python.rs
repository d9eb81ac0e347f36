// Python parser using tree-sitter

use crate::error::{Error, Result};
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

/// Deepest syntax nesting the extractors will walk
pub const MAX_NESTING: usize = 1000;

/// Parser for Python source files
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::Parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Read a Python file as UTF-8 text
    pub fn read_file(path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::unreadable(path, e))
    }

    /// Parse Python source into a syntax tree.
    ///
    /// tree-sitter recovers from bad input, so a tree that contains error or
    /// missing nodes is reported as a parse error for `path`. So is a tree
    /// nested deeper than [`MAX_NESTING`], which the recursive extractors
    /// could not walk.
    pub fn parse_source(&mut self, source: &str, path: &Path) -> Result<Tree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parse(path, "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_syntax_error(&root) {
                Some(node) => format!(
                    "invalid syntax at line {}, column {}",
                    node_line(&node),
                    node.start_position().column + 1
                ),
                None => "invalid syntax".to_string(),
            };
            return Err(Error::parse(path, message));
        }

        if let Some(node) = nested_beyond(&root, MAX_NESTING) {
            return Err(Error::parse(
                path,
                format!(
                    "nesting deeper than {} levels at line {}",
                    MAX_NESTING,
                    node_line(&node)
                ),
            ));
        }

        Ok(tree)
    }
}

/// Locate the first error or missing node in document order
fn first_syntax_error<'t>(root: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !cursor.goto_first_child() {
            return None;
        }
        while !(cursor.node().has_error() || cursor.node().is_missing()) {
            if !cursor.goto_next_sibling() {
                return None;
            }
        }
    }
}

/// First node in document order lying more than `limit` levels below `root`.
/// Walks with a cursor so that arbitrarily deep trees are safe to inspect.
fn nested_beyond<'t>(root: &Node<'t>, limit: usize) -> Option<Node<'t>> {
    let mut cursor = root.walk();
    let mut depth = 0;
    loop {
        if depth > limit {
            return Some(cursor.node());
        }
        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
            depth -= 1;
        }
    }
}

/// Source text of a node
pub(crate) fn node_text<'s>(node: &Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

/// 1-based line of a node's first character
pub(crate) fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// The class/function node behind a possibly decorated definition
pub(crate) fn definition_of<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    match node.kind() {
        "decorated_definition" => node.child_by_field_name("definition"),
        "class_definition" | "function_definition" => Some(*node),
        _ => None,
    }
}

/// Decorator names of a class/function definition, without `@` or arguments
pub(crate) fn decorator_names(definition: &Node, source: &[u8]) -> Vec<String> {
    let Some(parent) = definition.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }

    let mut decorators = Vec::new();
    let mut cursor = parent.walk();
    for child in parent.children(&mut cursor) {
        if child.kind() == "decorator" {
            let dec = node_text(&child, source).trim_start_matches('@');
            let dec = match dec.find('(') {
                Some(idx) => &dec[..idx],
                None => dec,
            };
            decorators.push(dec.trim().to_string());
        }
    }
    decorators
}

/// Docstring of a module, class or function body
pub(crate) fn docstring(body: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    Some(clean_docstring(node_text(&expr, source)))
}

/// Strip quotes and common indentation from a string literal's text
fn clean_docstring(text: &str) -> String {
    let text = text.trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    let inner = if text.len() >= 6 && (text.starts_with("\"\"\"") || text.starts_with("'''")) {
        &text[3..text.len() - 3]
    } else if text.len() >= 2 && (text.starts_with('"') || text.starts_with('\'')) {
        &text[1..text.len() - 1]
    } else {
        text
    };

    let mut lines = inner.lines();
    let first = lines.next().unwrap_or_default().trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned = vec![first];
    for line in rest {
        let stripped = if line.is_char_boundary(indent) && line.len() >= indent {
            &line[indent..]
        } else {
            line.trim_start()
        };
        cleaned.push(stripped.trim_end().to_string());
    }
    cleaned.join("\n").trim().to_string()
}
