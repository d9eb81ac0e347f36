// Structural model entities
//
// These types are what the extractors emit and what ingestion sinks persist.
// They carry no ids, counters or timestamps so repeated runs compare equal.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sentinel used whenever a type cannot be inferred
pub const UNKNOWN_TYPE: &str = "Any";

/// Name-prefix visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Derive visibility from the final segment of a (possibly dotted) name
    pub fn of(name: &str) -> Self {
        let last = name.rsplit('.').next().unwrap_or(name);
        if last.starts_with("__") {
            Visibility::Private
        } else if last.starts_with('_') {
            Visibility::Protected
        } else {
            Visibility::Public
        }
    }
}

/// Kind of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Class,
    /// A file treated as a bag of module-level functions
    Module,
    Interface,
    /// A file with both classes and module-level functions
    Mixed,
    Service,
    Controller,
    Repository,
    Utility,
}

impl ComponentKind {
    pub fn is_interface(&self) -> bool {
        matches!(self, ComponentKind::Interface)
    }
}

/// The organization a component was found in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub name: String,
    pub path: String,
}

/// A class or module-like unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    pub description: String,
    /// Attribute names declared on the component
    pub attributes: Vec<String>,
    /// Method names declared directly in the component body
    pub methods: Vec<String>,
    pub organization: Option<OrganizationRef>,
}

/// Kind of a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Extends,
    Implements,
    Uses,
}

/// A directed edge between two components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub source: String,
    pub target: String,
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn new(source: &str, target: &str, kind: DependencyKind) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            kind,
        }
    }
}

/// Where a method lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Module-level function
    Global,
    /// Declared inside the named component
    Component(String),
    /// Declared inside a class that is not a component of this file
    Unresolved,
}

impl Location {
    pub fn component(&self) -> Option<&str> {
        match self {
            Location::Component(name) => Some(name),
            _ => None,
        }
    }
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    pub default: Option<String>,
}

/// A function or method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub location: Location,
    pub return_type: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub description: String,
    pub parameters: Vec<Parameter>,
}

/// Lexical scope of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
    Class,
    Method,
    Block,
}

/// How a variable record came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    ClassAttribute,
    Parameter,
    Assignment,
}

/// One declaration site of a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Plain name or full attribute chain (`self.a.b`)
    pub name: String,
    pub type_name: String,
    pub scope: Scope,
    pub is_constant: bool,
    pub is_static: bool,
    pub visibility: Visibility,
    pub component: Option<String>,
    pub method: Option<String>,
    pub line: usize,
    pub declaration: DeclarationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Read,
    Write,
    Parameter,
    Return,
    Declaration,
}

/// One syntactic occurrence of a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableUsage {
    pub name: String,
    pub usage: UsageKind,
    pub line: usize,
    pub component: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Assignment,
    ParameterPassing,
    ReturnValue,
    Reference,
}

/// Data moving from one named variable to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableFlow {
    pub source: String,
    pub target: String,
    pub kind: FlowKind,
    pub line: usize,
    pub source_component: Option<String>,
    pub target_component: Option<String>,
    pub source_method: Option<String>,
    pub target_method: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationKind {
    /// Leaf directory containing the package marker file
    Module,
    /// Leaf directory without a marker
    Package,
}

/// A leaf directory of the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    /// Relative to the project root, `/`-separated, `.` for the root
    pub path: String,
    pub kind: OrganizationKind,
}

impl Organization {
    pub fn to_ref(&self) -> OrganizationRef {
        OrganizationRef {
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

/// Output of the component extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentBundle {
    pub components: Vec<Component>,
    pub dependencies: Vec<Dependency>,
}

/// Output of the method extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodBundle {
    pub methods: Vec<Method>,
}

/// Output of the variable-flow extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableBundle {
    pub variables: Vec<Variable>,
    pub usages: Vec<VariableUsage>,
    pub flows: Vec<VariableFlow>,
}

/// Output of the organization walker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationBundle {
    pub organizations: Vec<Organization>,
}

/// Everything extracted from one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub components: ComponentBundle,
    pub methods: MethodBundle,
    pub variables: VariableBundle,
}
