// Persistence collaborator for scan results

use crate::error::Result;
use crate::model::{
    Component, ComponentBundle, Dependency, Method, MethodBundle, Organization, OrganizationBundle,
    Variable, VariableBundle, VariableFlow, VariableUsage,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Receives the bundles of a scan as they are produced.
///
/// Per file the scanner calls `persist_components`, `persist_methods` and
/// `persist_variables` in that order; the first failure skips the rest.
pub trait IngestSink {
    fn persist_organizations(&mut self, bundle: &OrganizationBundle) -> Result<()>;
    fn persist_components(&mut self, path: &Path, bundle: &ComponentBundle) -> Result<()>;
    fn persist_methods(&mut self, path: &Path, bundle: &MethodBundle) -> Result<()>;
    fn persist_variables(&mut self, path: &Path, bundle: &VariableBundle) -> Result<()>;
}

/// In-memory sink accumulating everything it is given
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ingestion {
    pub organizations: Vec<Organization>,
    /// Files whose component bundle was persisted, in persistence order
    pub files: Vec<PathBuf>,
    pub components: Vec<Component>,
    pub dependencies: Vec<Dependency>,
    pub methods: Vec<Method>,
    pub variables: Vec<Variable>,
    pub usages: Vec<VariableUsage>,
    pub flows: Vec<VariableFlow>,
}

impl IngestSink for Ingestion {
    fn persist_organizations(&mut self, bundle: &OrganizationBundle) -> Result<()> {
        self.organizations.extend(bundle.organizations.iter().cloned());
        Ok(())
    }

    fn persist_components(&mut self, path: &Path, bundle: &ComponentBundle) -> Result<()> {
        self.files.push(path.to_path_buf());
        self.components.extend(bundle.components.iter().cloned());
        self.dependencies.extend(bundle.dependencies.iter().cloned());
        Ok(())
    }

    fn persist_methods(&mut self, _path: &Path, bundle: &MethodBundle) -> Result<()> {
        self.methods.extend(bundle.methods.iter().cloned());
        Ok(())
    }

    fn persist_variables(&mut self, _path: &Path, bundle: &VariableBundle) -> Result<()> {
        self.variables.extend(bundle.variables.iter().cloned());
        self.usages.extend(bundle.usages.iter().cloned());
        self.flows.extend(bundle.flows.iter().cloned());
        Ok(())
    }
}
