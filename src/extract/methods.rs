// Method extraction
//
// Every function definition in a file becomes a Method, including nested
// ones. Methods are attributed to their innermost enclosing class.

use crate::extract::infer::{annotation_text, literal_type, literal_value};
use crate::model::{Location, Method, MethodBundle, Parameter, Visibility, UNKNOWN_TYPE};
use crate::parser::{decorator_names, docstring, node_text};
use tree_sitter::Node;

/// Separator between the alternatives of an inferred return type
pub const RETURN_TYPE_SEPARATOR: &str = " | ";

/// Where the walk currently is, relative to the nearest class
#[derive(Debug, Clone, Copy)]
struct Enclosing<'a> {
    class: Option<&'a str>,
    /// The nearest enclosing definition is the class itself, not a function
    in_class_body: bool,
}

/// Extract all methods of a module node, in source order
pub(crate) fn extract_methods(root: &Node, source: &[u8]) -> MethodBundle {
    let mut methods = Vec::new();
    let enclosing = Enclosing {
        class: None,
        in_class_body: false,
    };
    walk(root, source, enclosing, &mut methods);
    MethodBundle { methods }
}

fn walk(node: &Node, source: &[u8], enclosing: Enclosing<'_>, methods: &mut Vec<Method>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "class_definition" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                let inner = Enclosing {
                    class: Some(node_text(&name, source)),
                    in_class_body: true,
                };
                walk(&child, source, inner, methods);
            }
            "function_definition" => {
                if let Some(method) = parse_method(&child, source, enclosing) {
                    methods.push(method);
                }
                let inner = Enclosing {
                    in_class_body: false,
                    ..enclosing
                };
                walk(&child, source, inner, methods);
            }
            _ => walk(&child, source, enclosing, methods),
        }
    }
}

fn parse_method(node: &Node, source: &[u8], enclosing: Enclosing<'_>) -> Option<Method> {
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let is_static = decorator_names(node, source)
        .iter()
        .any(|d| d == "staticmethod");
    let skip_receiver = enclosing.in_class_body && !is_static;

    let return_type = match node.child_by_field_name("return_type") {
        Some(annotation) => annotation_text(&annotation, source),
        None => infer_return_type(node, source),
    };

    let parameters = node
        .child_by_field_name("parameters")
        .map(|params| parse_parameters(&params, source, skip_receiver))
        .unwrap_or_default();

    let description = node
        .child_by_field_name("body")
        .and_then(|body| docstring(&body, source))
        .unwrap_or_default();

    let location = match enclosing.class {
        Some(class) => Location::Component(class.to_string()),
        None => Location::Global,
    };

    Some(Method {
        visibility: Visibility::of(&name),
        name,
        location,
        return_type,
        is_static,
        description,
        parameters,
    })
}

/// Union of the types returned by this function's own `return` statements
fn infer_return_type(func: &Node, source: &[u8]) -> String {
    let mut types: Vec<String> = Vec::new();
    if let Some(body) = func.child_by_field_name("body") {
        collect_return_types(&body, source, &mut types);
    }
    if types.is_empty() {
        UNKNOWN_TYPE.to_string()
    } else {
        types.join(RETURN_TYPE_SEPARATOR)
    }
}

fn collect_return_types(node: &Node, source: &[u8], types: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" | "class_definition" | "lambda" => {}
            "return_statement" => {
                let Some(value) = child.named_child(0) else {
                    continue;
                };
                let ty = if value.kind() == "identifier" {
                    Some(node_text(&value, source).to_string())
                } else {
                    literal_type(&value, source).map(str::to_string)
                };
                if let Some(ty) = ty {
                    if !types.contains(&ty) {
                        types.push(ty);
                    }
                }
            }
            _ => collect_return_types(&child, source, types),
        }
    }
}

/// Positional parameters, stopping at the first `*`, `*args` or `**kwargs`
fn parse_parameters(node: &Node, source: &[u8], skip_receiver: bool) -> Vec<Parameter> {
    let mut params = Vec::new();
    let mut skipped = !skip_receiver;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let param = match child.kind() {
            "identifier" => Some(Parameter {
                name: node_text(&child, source).to_string(),
                type_name: UNKNOWN_TYPE.to_string(),
                required: true,
                default: None,
            }),
            "typed_parameter" => {
                let Some(first) = child.named_child(0) else {
                    continue;
                };
                if first.kind() != "identifier" {
                    break;
                }
                Some(Parameter {
                    name: node_text(&first, source).to_string(),
                    type_name: child
                        .child_by_field_name("type")
                        .map(|t| annotation_text(&t, source))
                        .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
                    required: true,
                    default: None,
                })
            }
            "default_parameter" | "typed_default_parameter" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                let default = child
                    .child_by_field_name("value")
                    .and_then(|value| literal_value(&value, source));
                Some(Parameter {
                    name: node_text(&name, source).to_string(),
                    type_name: child
                        .child_by_field_name("type")
                        .map(|t| annotation_text(&t, source))
                        .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
                    required: default.is_none(),
                    default,
                })
            }
            "*" | "keyword_separator" | "list_splat_pattern" | "dictionary_splat_pattern" => break,
            _ => None,
        };

        if let Some(param) = param {
            if skipped {
                params.push(param);
            } else {
                skipped = true;
            }
        }
    }

    params
}
