//! Surveyor - Extract the structural model of Python projects
//!
//! Walks a project tree and turns its source files into components,
//! methods, variables with their usages and flows, and leaf-directory
//! organizations, handing each bundle to an ingestion sink.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod parser;
pub mod scan;

// Re-export main types
pub use config::{Config, ExtractConfig, OutputFormat, ScanConfig};
pub use error::{Error, Result};
pub use extract::{ClassSignature, ComponentClassifier, Extractor, FileContext, NamingHeuristics, PlainClasses};
pub use model::*;
pub use output::{write_report, JsonLinesSink};
pub use parser::PythonParser;
pub use scan::{IngestSink, Ingestion, OrganizationScan, OrganizationWalker, ScanReport, ScanStats, Scanner};
