// Component classification strategies
//
// Classification is best-effort and tied to naming conventions, so it sits
// behind a trait and can be swapped per run.

use crate::model::ComponentKind;

/// What a classifier gets to see of a class declaration
#[derive(Debug, Clone, Copy)]
pub struct ClassSignature<'a> {
    pub name: &'a str,
    /// Bases that are bare identifiers
    pub bases: &'a [String],
    pub decorators: &'a [String],
}

/// Decides the kind of a top-level class
pub trait ComponentClassifier: Send + Sync {
    fn classify(&self, class: &ClassSignature<'_>) -> ComponentKind;
}

/// Default heuristics over names, bases and decorators. First match wins.
#[derive(Debug, Clone, Default)]
pub struct NamingHeuristics;

impl ComponentClassifier for NamingHeuristics {
    fn classify(&self, class: &ClassSignature<'_>) -> ComponentKind {
        let name = class.name.to_lowercase();
        if class.decorators.iter().any(|d| d == "service") {
            ComponentKind::Service
        } else if name.contains("controller") {
            ComponentKind::Controller
        } else if name.contains("repository") {
            ComponentKind::Repository
        } else if name.contains("interface") || class.bases.iter().any(|b| b.starts_with("Abstract")) {
            ComponentKind::Interface
        } else if class.bases.iter().any(|b| b == "Utility") {
            ComponentKind::Utility
        } else {
            ComponentKind::Class
        }
    }
}

/// Classifies every class as a plain class
#[derive(Debug, Clone, Default)]
pub struct PlainClasses;

impl ComponentClassifier for PlainClasses {
    fn classify(&self, _class: &ClassSignature<'_>) -> ComponentKind {
        ComponentKind::Class
    }
}
