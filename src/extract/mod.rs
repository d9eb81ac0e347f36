// Per-file extraction pipeline
//
// Runs the component, method and variable extractors over one parsed file,
// in that order, and links owners across the three results.

pub mod classify;
mod components;
mod infer;
mod methods;
mod variables;

pub use classify::{ClassSignature, ComponentClassifier, NamingHeuristics, PlainClasses};
pub use methods::RETURN_TYPE_SEPARATOR;

use crate::config::ExtractConfig;
use crate::error::Result;
use crate::model::{FileAnalysis, Location, OrganizationRef};
use crate::parser::PythonParser;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The file being extracted and the organization it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct FileContext {
    pub path: PathBuf,
    pub organization: Option<OrganizationRef>,
}

impl FileContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            organization: None,
        }
    }

    pub fn with_organization(mut self, organization: Option<OrganizationRef>) -> Self {
        self.organization = organization;
        self
    }

    /// File name without its extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Extracts the structural model of single source files
pub struct Extractor {
    config: ExtractConfig,
    classifier: Box<dyn ComponentClassifier>,
}

impl Extractor {
    /// Create an extractor using the default naming heuristics
    pub fn new(config: ExtractConfig) -> Self {
        Self {
            config,
            classifier: Box::new(NamingHeuristics),
        }
    }

    /// Replace the component classification strategy
    pub fn with_classifier(mut self, classifier: impl ComponentClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Read, parse and extract one file
    pub fn analyze_file(&self, parser: &mut PythonParser, file: &FileContext) -> Result<FileAnalysis> {
        let source = PythonParser::read_file(&file.path)?;
        self.analyze_source(parser, &source, file)
    }

    /// Parse and extract already loaded source text
    pub fn analyze_source(
        &self,
        parser: &mut PythonParser,
        source: &str,
        file: &FileContext,
    ) -> Result<FileAnalysis> {
        let tree = parser.parse_source(source, &file.path)?;
        let root = tree.root_node();
        let bytes = source.as_bytes();

        let components = components::extract_components(
            &root,
            bytes,
            file,
            &self.config,
            self.classifier.as_ref(),
        );
        let methods = methods::extract_methods(&root, bytes);
        let variables = variables::extract_variables(&root, bytes);

        let mut analysis = FileAnalysis {
            path: file.path.clone(),
            components,
            methods,
            variables,
        };
        link_owners(&mut analysis);

        debug!(
            path = %file.path.display(),
            components = analysis.components.components.len(),
            methods = analysis.methods.methods.len(),
            variables = analysis.variables.variables.len(),
            "extracted file"
        );
        Ok(analysis)
    }
}

/// Clear every owner reference that does not name a component of this file
fn link_owners(analysis: &mut FileAnalysis) {
    let known: HashSet<String> = analysis
        .components
        .components
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let unlink = |owner: &mut Option<String>| {
        if owner.as_ref().map_or(false, |name| !known.contains(name)) {
            *owner = None;
        }
    };

    for method in &mut analysis.methods.methods {
        let missing = method
            .location
            .component()
            .map_or(false, |name| !known.contains(name));
        if missing {
            method.location = Location::Unresolved;
        }
    }
    for variable in &mut analysis.variables.variables {
        unlink(&mut variable.component);
    }
    for usage in &mut analysis.variables.usages {
        unlink(&mut usage.component);
    }
    for flow in &mut analysis.variables.flows {
        unlink(&mut flow.source_component);
        unlink(&mut flow.target_component);
    }
}

/// Whether `path` is a source file the extractors should see
pub(crate) fn is_source_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| extensions.iter().any(|allowed| allowed == ext))
}
