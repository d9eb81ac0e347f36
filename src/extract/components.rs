// Component extraction
//
// Turns the top-level classes of a file into components and derives the
// inheritance and usage edges between them.

use crate::config::ExtractConfig;
use crate::extract::classify::{ClassSignature, ComponentClassifier};
use crate::extract::infer::assignment_parts;
use crate::extract::FileContext;
use crate::model::{Component, ComponentBundle, ComponentKind, Dependency, DependencyKind};
use crate::parser::{decorator_names, definition_of, docstring, node_text};
use tree_sitter::Node;

/// A top-level class declaration as read from the tree
#[derive(Debug)]
struct ClassDecl {
    name: String,
    bases: Vec<String>,
    decorators: Vec<String>,
    description: String,
    attributes: Vec<String>,
    methods: Vec<String>,
    /// Bare-identifier callees of every call inside the class, in source order
    callees: Vec<String>,
}

impl ClassDecl {
    fn signature(&self) -> ClassSignature<'_> {
        ClassSignature {
            name: &self.name,
            bases: &self.bases,
            decorators: &self.decorators,
        }
    }
}

/// Extract components and dependencies from a module node
pub(crate) fn extract_components(
    root: &Node,
    source: &[u8],
    file: &FileContext,
    config: &ExtractConfig,
    classifier: &dyn ComponentClassifier,
) -> ComponentBundle {
    let mut bundle = ComponentBundle::default();
    let mut declared: Vec<String> = Vec::new();
    let mut module_functions: Vec<String> = Vec::new();

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        let Some(definition) = definition_of(&child) else {
            continue;
        };

        if definition.kind() == "function_definition" {
            if let Some(name) = definition.child_by_field_name("name") {
                module_functions.push(node_text(&name, source).to_string());
            }
            continue;
        }

        let Some(class) = parse_class(&definition, source, config) else {
            continue;
        };
        let kind = classifier.classify(&class.signature());

        let inheritance = if kind.is_interface() {
            DependencyKind::Implements
        } else {
            DependencyKind::Extends
        };
        for base in &class.bases {
            bundle
                .dependencies
                .push(Dependency::new(&class.name, base, inheritance));
        }

        for callee in &class.callees {
            if callee != &class.name && declared.contains(callee) && !class.bases.contains(callee) {
                bundle
                    .dependencies
                    .push(Dependency::new(&class.name, callee, DependencyKind::Uses));
            }
        }

        declared.push(class.name.clone());
        bundle.components.push(Component {
            name: class.name,
            kind,
            description: class.description,
            attributes: class.attributes,
            methods: class.methods,
            organization: file.organization.clone(),
        });
    }

    if config.module_components && !module_functions.is_empty() {
        let kind = if declared.is_empty() {
            ComponentKind::Module
        } else {
            ComponentKind::Mixed
        };
        bundle.components.push(Component {
            name: file.stem(),
            kind,
            description: docstring(root, source).unwrap_or_default(),
            attributes: Vec::new(),
            methods: module_functions,
            organization: file.organization.clone(),
        });
    }

    bundle
}

/// Parse a class definition node
fn parse_class(node: &Node, source: &[u8], config: &ExtractConfig) -> Option<ClassDecl> {
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let body = node.child_by_field_name("body")?;

    let mut bases = Vec::new();
    if let Some(args) = node.child_by_field_name("superclasses") {
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            if arg.kind() == "identifier" {
                bases.push(node_text(&arg, source).to_string());
            }
        }
    }

    let mut attributes = Vec::new();
    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        match stmt.kind() {
            "expression_statement" => {
                for target in statement_targets(&stmt) {
                    if target.kind() == "identifier" {
                        push_unique(&mut attributes, node_text(&target, source));
                    }
                }
            }
            "function_definition" | "decorated_definition" => {
                let Some(func) = definition_of(&stmt).filter(|d| d.kind() == "function_definition") else {
                    continue;
                };
                let Some(func_name) = func.child_by_field_name("name") else {
                    continue;
                };
                let func_name = node_text(&func_name, source);
                methods.push(func_name.to_string());
                if func_name == "__init__" && config.init_attributes {
                    for attr in init_attributes(&func, source) {
                        push_unique(&mut attributes, &attr);
                    }
                }
            }
            _ => {}
        }
    }

    let mut callees = Vec::new();
    collect_callees(&body, source, &mut callees);

    Some(ClassDecl {
        name,
        bases,
        decorators: decorator_names(node, source),
        description: docstring(&body, source).unwrap_or_default(),
        attributes,
        methods,
        callees,
    })
}

/// Assignment targets of an expression statement, if it is an assignment
fn statement_targets<'t>(stmt: &Node<'t>) -> Vec<Node<'t>> {
    match stmt.named_child(0) {
        Some(assign) if assign.kind() == "assignment" => assignment_parts(&assign).0,
        _ => Vec::new(),
    }
}

/// `self.<attr>` targets assigned directly in an `__init__` body
fn init_attributes(func: &Node, source: &[u8]) -> Vec<String> {
    let Some(body) = func.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut attrs = Vec::new();
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        for target in statement_targets(&stmt) {
            if target.kind() != "attribute" {
                continue;
            }
            let object = target.child_by_field_name("object");
            let attr = target.child_by_field_name("attribute");
            if let (Some(object), Some(attr)) = (object, attr) {
                if object.kind() == "identifier" && node_text(&object, source) == "self" {
                    attrs.push(node_text(&attr, source).to_string());
                }
            }
        }
    }
    attrs
}

/// Collect bare-identifier callees of every call under `node`
fn collect_callees(node: &Node, source: &[u8], callees: &mut Vec<String>) {
    if node.kind() == "call" {
        if let Some(func) = node.child_by_field_name("function") {
            if func.kind() == "identifier" {
                callees.push(node_text(&func, source).to_string());
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_callees(&child, source, callees);
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}
