// Report writers
//
// `write_report` renders a finished in-memory scan as one JSON document.
// `JsonLinesSink` streams every persisted bundle as it arrives instead.

use crate::error::Result;
use crate::model::{
    Component, ComponentBundle, Dependency, Method, MethodBundle, Organization, OrganizationBundle,
    Variable, VariableBundle, VariableFlow, VariableUsage,
};
use crate::scan::{IngestSink, Ingestion, ScanReport, ScanStats};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Full JSON report of one scan
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    #[serde(flatten)]
    pub report: &'a ScanReport,
    #[serde(flatten)]
    pub ingestion: &'a Ingestion,
}

/// Write the report of a collected scan as pretty-printed JSON
pub fn write_report<W: Write>(mut writer: W, ingestion: &Ingestion, report: &ScanReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &JsonReport { report, ingestion })?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write any serializable value as pretty-printed JSON
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// One line of JSON Lines output
#[derive(Debug, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Record<'a> {
    Organizations {
        organizations: &'a [Organization],
    },
    Components {
        path: &'a Path,
        components: &'a [Component],
        dependencies: &'a [Dependency],
    },
    Methods {
        path: &'a Path,
        methods: &'a [Method],
    },
    Variables {
        path: &'a Path,
        variables: &'a [Variable],
        usages: &'a [VariableUsage],
        flows: &'a [VariableFlow],
    },
    Report {
        root: &'a Path,
        errors: &'a [String],
        stats: &'a ScanStats,
    },
}

/// Sink writing one JSON object per persisted bundle
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Append the closing report line and hand back the writer
    pub fn finish(mut self, report: &ScanReport) -> Result<W> {
        self.write(&Record::Report {
            root: &report.root,
            errors: &report.errors,
            stats: &report.stats,
        })?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write(&mut self, record: &Record<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> IngestSink for JsonLinesSink<W> {
    fn persist_organizations(&mut self, bundle: &OrganizationBundle) -> Result<()> {
        self.write(&Record::Organizations {
            organizations: &bundle.organizations,
        })
    }

    fn persist_components(&mut self, path: &Path, bundle: &ComponentBundle) -> Result<()> {
        self.write(&Record::Components {
            path,
            components: &bundle.components,
            dependencies: &bundle.dependencies,
        })
    }

    fn persist_methods(&mut self, path: &Path, bundle: &MethodBundle) -> Result<()> {
        self.write(&Record::Methods {
            path,
            methods: &bundle.methods,
        })
    }

    fn persist_variables(&mut self, path: &Path, bundle: &VariableBundle) -> Result<()> {
        self.write(&Record::Variables {
            path,
            variables: &bundle.variables,
            usages: &bundle.usages,
            flows: &bundle.flows,
        })
    }
}
