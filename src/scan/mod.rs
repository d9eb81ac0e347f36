// Project traversal
//
// A breadth-first sweep over the project: every file of one directory level
// is extracted and persisted before the next level is listed.

mod organizations;
mod sink;

pub use organizations::{DirectoryFailure, EntryFilter, OrganizationScan, OrganizationWalker};
pub use sink::{IngestSink, Ingestion};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{is_source_file, ComponentClassifier, Extractor, FileContext};
use crate::model::{FileAnalysis, OrganizationBundle, OrganizationRef};
use crate::parser::PythonParser;
use indicatif::{ProgressBar, ProgressStyle};
use organizations::list_dir;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::mem;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Counters describing one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub levels: usize,
    pub files: usize,
    pub directories: usize,
    pub organizations: usize,
    pub components: usize,
    pub methods: usize,
    pub variables: usize,
}

/// Outcome of a scan that reached the end of the tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    /// Non-fatal failures in the order they were met
    pub errors: Vec<String>,
    pub stats: ScanStats,
}

/// Where the sweep currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// List the root, walk organizations, seed the queues
    Root,
    /// Extract and persist every queued file of the current level
    Draining,
    /// List every queued directory into the next level
    Expanding,
    Done,
}

/// Walks a project and feeds its structure to an [`IngestSink`]
pub struct Scanner {
    config: Config,
    filter: EntryFilter,
    extractor: Extractor,
    verbose: bool,
}

impl Scanner {
    /// Create a scanner; fails when the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let filter = EntryFilter::new(&config.scan.ignore)?;
        let extractor = Extractor::new(config.extract.clone());
        Ok(Self {
            config,
            filter,
            extractor,
            verbose: false,
        })
    }

    /// Show a progress spinner while scanning
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replace the component classification strategy
    pub fn with_classifier(mut self, classifier: impl ComponentClassifier + 'static) -> Self {
        self.extractor = self.extractor.with_classifier(classifier);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Organization walker configured like this scanner
    pub fn organization_walker(&self) -> OrganizationWalker {
        OrganizationWalker::new(self.filter.clone(), self.config.scan.package_marker.clone())
    }

    /// Scan into an in-memory [`Ingestion`]
    pub fn scan_collect(&self, root: &Path) -> Result<(Ingestion, ScanReport)> {
        let mut ingestion = Ingestion::default();
        let report = self.scan(root, &mut ingestion)?;
        Ok((ingestion, report))
    }

    /// Scan the project at `root`.
    ///
    /// Only a missing or unlistable root is an error; everything below it is
    /// reported in [`ScanReport::errors`].
    pub fn scan(&self, root: &Path, sink: &mut dyn IngestSink) -> Result<ScanReport> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let mut sweep = Sweep {
            scanner: self,
            sink,
            root: root.clone(),
            errors: ErrorLog::default(),
            stats: ScanStats::default(),
            organizations: HashMap::new(),
            files: Vec::new(),
            dirs: Vec::new(),
            progress: self.progress(),
        };

        let mut phase = Phase::Root;
        while phase != Phase::Done {
            phase = match phase {
                Phase::Root => {
                    sweep.enter_root()?;
                    Phase::Draining
                }
                Phase::Draining => {
                    if sweep.files.is_empty() && sweep.dirs.is_empty() {
                        Phase::Done
                    } else {
                        sweep.drain();
                        Phase::Expanding
                    }
                }
                Phase::Expanding => {
                    sweep.expand();
                    Phase::Draining
                }
                Phase::Done => Phase::Done,
            };
        }

        if let Some(pb) = &sweep.progress {
            pb.finish_and_clear();
        }
        debug!(root = %root.display(), errors = sweep.errors.messages.len(), "scan finished");

        Ok(ScanReport {
            root,
            errors: sweep.errors.messages,
            stats: sweep.stats,
        })
    }

    fn progress(&self) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {pos} files {msg}") {
            pb.set_style(style);
        }
        Some(pb)
    }

    fn wants_file(&self, path: &Path) -> bool {
        let scan = &self.config.scan;
        if !is_source_file(path, &scan.extensions) {
            return false;
        }
        let is_marker = path
            .file_name()
            .map_or(false, |n| n == scan.package_marker.as_str());
        !(scan.skip_package_markers && is_marker)
    }
}

/// Ordered error messages, reporting each failed directory once
#[derive(Debug, Default)]
struct ErrorLog {
    messages: Vec<String>,
    failed_dirs: HashSet<PathBuf>,
}

impl ErrorLog {
    fn record(&mut self, error: &Error) {
        warn!("{}", error);
        self.messages.push(error.to_string());
    }

    fn record_directory(&mut self, dir: &Path, error: &Error) {
        if self.failed_dirs.insert(dir.to_path_buf()) {
            self.record(error);
        }
    }
}

/// State of one scan in progress
struct Sweep<'s, 'k> {
    scanner: &'s Scanner,
    sink: &'k mut dyn IngestSink,
    root: PathBuf,
    errors: ErrorLog,
    stats: ScanStats,
    /// Leaf directories by absolute path
    organizations: HashMap<PathBuf, OrganizationRef>,
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
    progress: Option<ProgressBar>,
}

impl Sweep<'_, '_> {
    fn enter_root(&mut self) -> Result<()> {
        let listing = list_dir(&self.root, &self.scanner.filter)?;
        self.stats.directories += 1;

        let walk = self.scanner.organization_walker().walk(&self.root);
        for failure in &walk.errors {
            self.errors.record_directory(&failure.path, &failure.to_error());
        }
        self.organizations = walk.by_directory(&self.root);
        self.stats.organizations = walk.organizations.len();

        let bundle = OrganizationBundle {
            organizations: walk.organizations,
        };
        if let Err(e) = self.sink.persist_organizations(&bundle) {
            self.errors.record(&Error::sink(&self.root, "organizations", e));
        }

        self.queue(listing.files, listing.dirs);
        Ok(())
    }

    fn queue(&mut self, files: Vec<PathBuf>, dirs: Vec<PathBuf>) {
        let wanted: Vec<PathBuf> = files.into_iter().filter(|f| self.scanner.wants_file(f)).collect();
        self.files.extend(wanted);
        self.dirs.extend(dirs);
    }

    fn file_context(&self, path: &Path) -> FileContext {
        let organization = path.parent().and_then(|dir| self.organizations.get(dir)).cloned();
        FileContext::new(path).with_organization(organization)
    }

    /// Extract every queued file, then persist the results in queue order
    fn drain(&mut self) {
        let files = mem::take(&mut self.files);
        self.stats.levels += 1;
        debug!(level = self.stats.levels, files = files.len(), "draining level");

        let contexts: Vec<FileContext> = files.iter().map(|f| self.file_context(f)).collect();
        let extractor = &self.scanner.extractor;
        let results: Vec<Result<FileAnalysis>> = if self.scanner.config.scan.parallel {
            contexts
                .par_iter()
                .map_init(PythonParser::new, |parser, ctx| match parser {
                    Ok(parser) => extractor.analyze_file(parser, ctx),
                    Err(e) => Err(Error::parser(e.to_string())),
                })
                .collect()
        } else {
            match PythonParser::new() {
                Ok(mut parser) => contexts
                    .iter()
                    .map(|ctx| extractor.analyze_file(&mut parser, ctx))
                    .collect(),
                Err(e) => contexts
                    .iter()
                    .map(|_| Err(Error::parser(e.to_string())))
                    .collect(),
            }
        };

        for (ctx, result) in contexts.iter().zip(results) {
            if let Some(pb) = &self.progress {
                let name = ctx.path.file_name().unwrap_or_default().to_string_lossy().to_string();
                pb.set_message(name);
                pb.inc(1);
            }
            self.stats.files += 1;
            match result {
                Ok(analysis) => {
                    if let Err(e) = self.persist(&analysis) {
                        self.errors.record(&e);
                    }
                }
                Err(e) => self.errors.record(&e),
            }
        }
    }

    fn persist(&mut self, analysis: &FileAnalysis) -> Result<()> {
        let path = &analysis.path;
        self.sink
            .persist_components(path, &analysis.components)
            .map_err(|e| Error::sink(path, "components", e))?;
        self.stats.components += analysis.components.components.len();

        self.sink
            .persist_methods(path, &analysis.methods)
            .map_err(|e| Error::sink(path, "methods", e))?;
        self.stats.methods += analysis.methods.methods.len();

        self.sink
            .persist_variables(path, &analysis.variables)
            .map_err(|e| Error::sink(path, "variables", e))?;
        self.stats.variables += analysis.variables.variables.len();
        Ok(())
    }

    /// List every queued directory; their contents form the next level
    fn expand(&mut self) {
        let dirs = mem::take(&mut self.dirs);
        debug!(directories = dirs.len(), "expanding level");
        let mut next_files = Vec::new();
        let mut next_dirs = Vec::new();

        for dir in dirs {
            match list_dir(&dir, &self.scanner.filter) {
                Ok(listing) => {
                    self.stats.directories += 1;
                    next_files.extend(listing.files);
                    next_dirs.extend(listing.dirs);
                }
                Err(e) => self.errors.record_directory(&dir, &e),
            }
        }

        self.queue(next_files, next_dirs);
    }
}
