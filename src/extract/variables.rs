// Variable and data-flow extraction
//
// A single depth-first walk over the module. The walk carries an explicit
// `Context` (scope stack, current component, current method) and the parent
// of the node being visited. Entering a class, function or block derives a
// child context; leaving it simply drops the child, so nothing leaks between
// siblings.

use crate::extract::infer::{
    annotation_text, assignment_parts, attribute_chain, infer_type, is_constant_name,
};
use crate::model::{
    DeclarationKind, FlowKind, Scope, UsageKind, Variable, VariableBundle, VariableFlow,
    VariableUsage, Visibility, UNKNOWN_TYPE,
};
use crate::parser::{decorator_names, node_line, node_text};
use tree_sitter::Node;

/// Traversal context threaded through the walk
#[derive(Debug, Clone)]
struct Context {
    scopes: Vec<Scope>,
    component: Option<String>,
    method: Option<String>,
}

impl Context {
    fn root() -> Self {
        Self {
            scopes: vec![Scope::Global],
            component: None,
            method: None,
        }
    }

    fn scope(&self) -> Scope {
        self.scopes.last().copied().unwrap_or(Scope::Global)
    }

    /// The nearest enclosing definition is a class, looking through blocks
    fn in_class_body(&self) -> bool {
        self.scopes.iter().rev().find(|s| **s != Scope::Block) == Some(&Scope::Class)
    }

    fn enter(&self, scope: Scope) -> Self {
        let mut scopes = self.scopes.clone();
        scopes.push(scope);
        Self {
            scopes,
            component: self.component.clone(),
            method: self.method.clone(),
        }
    }

    fn enter_class(&self, name: &str) -> Self {
        Self {
            component: Some(name.to_string()),
            method: None,
            ..self.enter(Scope::Class)
        }
    }

    fn enter_function(&self, name: &str) -> Self {
        Self {
            method: Some(name.to_string()),
            ..self.enter(Scope::Method)
        }
    }
}

/// Extract variables, usages and flows of a module node
pub(crate) fn extract_variables(root: &Node, source: &[u8]) -> VariableBundle {
    let mut collector = VariableCollector {
        source,
        bundle: VariableBundle::default(),
    };
    collector.visit(root, None, &Context::root());
    collector.bundle
}

struct VariableCollector<'s> {
    source: &'s [u8],
    bundle: VariableBundle,
}

impl<'s> VariableCollector<'s> {
    fn visit<'t>(&mut self, node: &Node<'t>, parent: Option<&Node<'t>>, ctx: &Context) {
        match node.kind() {
            "class_definition" => self.visit_class(node, ctx),
            "function_definition" => self.visit_function(node, ctx),
            "block" => {
                let owns_scope = parent
                    .map(|p| matches!(p.kind(), "class_definition" | "function_definition"))
                    .unwrap_or(false);
                if owns_scope {
                    self.visit_children(node, ctx);
                } else {
                    self.visit_children(node, &ctx.enter(Scope::Block));
                }
            }
            "assignment" => self.visit_assignment(node, ctx),
            "augmented_assignment" => self.visit_augmented_assignment(node, ctx),
            "return_statement" => self.visit_return(node, ctx),
            "attribute" => self.visit_attribute(node, parent, ctx),
            "identifier" => self.visit_identifier(node, parent, ctx),
            "keyword_argument" | "named_expression" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(&value, Some(node), ctx);
                }
            }
            "lambda" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit(&body, Some(node), ctx);
                }
            }
            "for_statement" | "for_in_clause" => self.visit_children_except(node, "left", ctx),
            "as_pattern" => {
                if let Some(value) = node.named_child(0) {
                    self.visit(&value, Some(node), ctx);
                }
            }
            "import_statement"
            | "import_from_statement"
            | "future_import_statement"
            | "global_statement"
            | "nonlocal_statement"
            | "type"
            | "comment" => {}
            _ => self.visit_children(node, ctx),
        }
    }

    fn visit_children(&mut self, node: &Node, ctx: &Context) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(&child, Some(node), ctx);
        }
    }

    fn visit_children_except(&mut self, node: &Node, field: &str, ctx: &Context) {
        let skipped = node.child_by_field_name(field);
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if Some(child) != skipped {
                self.visit(&child, Some(node), ctx);
            }
        }
    }

    fn visit_class(&mut self, node: &Node, ctx: &Context) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        if let Some(bases) = node.child_by_field_name("superclasses") {
            self.visit(&bases, Some(node), ctx);
        }
        let inner = ctx.enter_class(node_text(&name, self.source));
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(&body, Some(node), &inner);
        }
    }

    fn visit_function(&mut self, node: &Node, ctx: &Context) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let is_static = decorator_names(node, self.source)
            .iter()
            .any(|d| d == "staticmethod");
        let skip_receiver = ctx.in_class_body() && !is_static;
        let inner = ctx.enter_function(node_text(&name, self.source));
        let line = node_line(node);

        if let Some(params) = node.child_by_field_name("parameters") {
            let mut skipped = !skip_receiver;
            let mut defaults = Vec::new();
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                if let Some(default) = param.child_by_field_name("value") {
                    defaults.push((default, param));
                }
                let Some((param_name, type_name)) = self.parameter(&param) else {
                    continue;
                };
                if !skipped {
                    skipped = true;
                    continue;
                }
                self.bundle.variables.push(Variable {
                    visibility: Visibility::of(&param_name),
                    name: param_name.clone(),
                    type_name,
                    scope: Scope::Method,
                    is_constant: false,
                    is_static: false,
                    component: inner.component.clone(),
                    method: inner.method.clone(),
                    line,
                    declaration: DeclarationKind::Parameter,
                });
                self.usage(param_name, UsageKind::Parameter, line, &inner);
            }

            // Defaults are evaluated where the function is defined, after
            // every parameter is bound at the `def` line
            for (default, param) in &defaults {
                self.visit(default, Some(param), ctx);
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.visit(&body, Some(node), &inner);
        }
    }

    /// Name and declared type of one parameter node
    fn parameter(&self, node: &Node) -> Option<(String, String)> {
        let type_name = node
            .child_by_field_name("type")
            .map(|t| annotation_text(&t, self.source))
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string());

        let name_node = match node.kind() {
            "identifier" => *node,
            "default_parameter" | "typed_default_parameter" => node.child_by_field_name("name")?,
            "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                let first = node.named_child(0)?;
                if first.kind() == "identifier" {
                    first
                } else {
                    first.named_child(0).filter(|n| n.kind() == "identifier")?
                }
            }
            _ => return None,
        };
        Some((node_text(&name_node, self.source).to_string(), type_name))
    }

    fn visit_assignment(&mut self, node: &Node, ctx: &Context) {
        let (targets, value) = assignment_parts(node);
        let line = node_line(node);
        let type_name = match (node.child_by_field_name("type"), value) {
            (Some(annotation), _) => annotation_text(&annotation, self.source),
            (None, Some(value)) => infer_type(&value, self.source),
            (None, None) => UNKNOWN_TYPE.to_string(),
        };
        let flow_source = value
            .filter(|v| matches!(v.kind(), "identifier" | "attribute"))
            .and_then(|v| attribute_chain(&v, self.source));

        for target in &targets {
            match target.kind() {
                "identifier" | "attribute" => match attribute_chain(target, self.source) {
                    Some(name) => {
                        self.declare(&name, type_name.clone(), line, ctx);
                        if let Some(source_name) = &flow_source {
                            self.flow(source_name, &name, line, ctx);
                        }
                    }
                    None => self.visit(target, Some(node), ctx),
                },
                "pattern_list" | "tuple_pattern" | "list_pattern" => {
                    self.declare_unpacked(target, line, ctx);
                }
                _ => self.visit(target, Some(node), ctx),
            }
        }

        if let Some(value) = value {
            self.visit(&value, Some(node), ctx);
        }
    }

    /// Each name or chain bound by an unpacking target
    fn declare_unpacked(&mut self, pattern: &Node, line: usize, ctx: &Context) {
        let mut cursor = pattern.walk();
        for element in pattern.named_children(&mut cursor) {
            match element.kind() {
                "identifier" | "attribute" => match attribute_chain(&element, self.source) {
                    Some(name) => self.declare(&name, UNKNOWN_TYPE.to_string(), line, ctx),
                    None => self.visit(&element, Some(pattern), ctx),
                },
                "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern" => {
                    self.declare_unpacked(&element, line, ctx);
                }
                _ => self.visit(&element, Some(pattern), ctx),
            }
        }
    }

    fn visit_augmented_assignment(&mut self, node: &Node, ctx: &Context) {
        if let Some(target) = node.child_by_field_name("left") {
            match attribute_chain(&target, self.source) {
                Some(name) => self.usage(name, UsageKind::Write, node_line(node), ctx),
                None => self.visit(&target, Some(node), ctx),
            }
        }
        if let Some(value) = node.child_by_field_name("right") {
            self.visit(&value, Some(node), ctx);
        }
    }

    fn visit_return(&mut self, node: &Node, ctx: &Context) {
        let Some(value) = node.named_child(0) else {
            return;
        };
        let returned = match value.kind() {
            "identifier" | "attribute" => attribute_chain(&value, self.source),
            _ => None,
        };
        match returned {
            Some(name) => self.usage(name, UsageKind::Return, node_line(node), ctx),
            None => self.visit(&value, Some(node), ctx),
        }
    }

    fn visit_attribute<'t>(&mut self, node: &Node<'t>, parent: Option<&Node<'t>>, ctx: &Context) {
        // Only the outermost attribute of a chain records the usage
        let embedded = parent
            .filter(|p| p.kind() == "attribute")
            .and_then(|p| p.child_by_field_name("object"))
            .map(|object| object == *node)
            .unwrap_or(false);
        if !embedded {
            if let Some(name) = attribute_chain(node, self.source) {
                self.usage(name, UsageKind::Read, node_line(node), ctx);
            }
        }
        if let Some(object) = node.child_by_field_name("object") {
            self.visit(&object, Some(node), ctx);
        }
    }

    fn visit_identifier(&mut self, node: &Node, parent: Option<&Node>, ctx: &Context) {
        if parent.map(|p| p.kind() == "attribute").unwrap_or(false) {
            return;
        }
        if node.prev_sibling().map(|s| s.kind() == "as").unwrap_or(false) {
            return;
        }
        let name = node_text(node, self.source).to_string();
        self.usage(name, UsageKind::Read, node_line(node), ctx);
    }

    /// Record a declaration site: a class attribute directly in a class body,
    /// an assignment anywhere else
    fn declare(&mut self, name: &str, type_name: String, line: usize, ctx: &Context) {
        let class_attribute = ctx.scope() == Scope::Class && !name.contains('.');
        let (declaration, usage) = if class_attribute {
            (DeclarationKind::ClassAttribute, UsageKind::Declaration)
        } else {
            (DeclarationKind::Assignment, UsageKind::Write)
        };
        self.bundle.variables.push(Variable {
            name: name.to_string(),
            type_name,
            scope: ctx.scope(),
            is_constant: is_constant_name(name),
            is_static: class_attribute,
            visibility: Visibility::of(name),
            component: ctx.component.clone(),
            method: ctx.method.clone(),
            line,
            declaration,
        });
        self.usage(name.to_string(), usage, line, ctx);
    }

    fn usage(&mut self, name: String, usage: UsageKind, line: usize, ctx: &Context) {
        self.bundle.usages.push(VariableUsage {
            name,
            usage,
            line,
            component: ctx.component.clone(),
            method: ctx.method.clone(),
        });
    }

    fn flow(&mut self, source: &str, target: &str, line: usize, ctx: &Context) {
        self.bundle.flows.push(VariableFlow {
            source: source.to_string(),
            target: target.to_string(),
            kind: FlowKind::Assignment,
            line,
            source_component: ctx.component.clone(),
            target_component: ctx.component.clone(),
            source_method: ctx.method.clone(),
            target_method: ctx.method.clone(),
        });
    }
}
