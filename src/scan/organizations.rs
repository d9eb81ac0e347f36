// Leaf-directory discovery
//
// Walks the project depth-first and records every leaf directory (one with
// no subdirectories left after filtering) as an organization.

use crate::error::{Error, Result};
use crate::model::{Organization, OrganizationKind, OrganizationRef};
use glob::Pattern;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Decides which directory entries the walkers look at
#[derive(Debug, Clone)]
pub struct EntryFilter {
    ignore: Vec<Pattern>,
}

impl EntryFilter {
    /// Build a filter from ignore globs matched against entry names
    pub fn new(ignore: &[String]) -> Result<Self> {
        let ignore = ignore
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { ignore })
    }

    /// Hidden names and names matching an ignore glob are skipped
    pub fn allows(&self, name: &str) -> bool {
        !name.starts_with('.') && !self.ignore.iter().any(|p| p.matches(name))
    }
}

/// Filtered contents of one directory, in file-name order
#[derive(Debug, Default)]
pub(crate) struct Listing {
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

/// List the direct children of `dir` that pass `filter`
pub(crate) fn list_dir(dir: &Path, filter: &EntryFilter) -> Result<Listing> {
    let mut listing = Listing::default();
    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in entries {
        let entry = entry.map_err(|e| {
            let message = match e.io_error() {
                Some(io) => io.to_string(),
                None => e.to_string(),
            };
            Error::traversal(dir, message)
        })?;

        let name = entry.file_name().to_string_lossy();
        if !filter.allows(&name) {
            continue;
        }
        if entry.file_type().is_dir() {
            listing.dirs.push(entry.into_path());
        } else if entry.file_type().is_file() {
            listing.files.push(entry.into_path());
        }
    }

    Ok(listing)
}

/// Path of `dir` relative to `root`, `/`-separated, `.` for the root itself
pub(crate) fn relative_path(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// A directory the walk could not list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryFailure {
    pub path: PathBuf,
    pub message: String,
}

impl DirectoryFailure {
    pub fn to_error(&self) -> Error {
        Error::traversal(&self.path, &self.message)
    }
}

/// Result of one organization walk
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrganizationScan {
    pub organizations: Vec<Organization>,
    pub errors: Vec<DirectoryFailure>,
}

impl OrganizationScan {
    /// Organizations keyed by their absolute directory under `root`
    pub fn by_directory(&self, root: &Path) -> HashMap<PathBuf, OrganizationRef> {
        self.organizations
            .iter()
            .map(|org| {
                let dir = if org.path == "." {
                    root.to_path_buf()
                } else {
                    root.join(&org.path)
                };
                (dir, org.to_ref())
            })
            .collect()
    }
}

/// Depth-first walker producing one organization per leaf directory
#[derive(Debug, Clone)]
pub struct OrganizationWalker {
    filter: EntryFilter,
    package_marker: String,
}

impl OrganizationWalker {
    pub fn new(filter: EntryFilter, package_marker: impl Into<String>) -> Self {
        Self {
            filter,
            package_marker: package_marker.into(),
        }
    }

    /// Walk everything below `root`
    pub fn walk(&self, root: &Path) -> OrganizationScan {
        let mut scan = OrganizationScan::default();
        self.visit(root, root, &mut scan);
        scan
    }

    fn visit(&self, root: &Path, dir: &Path, scan: &mut OrganizationScan) {
        let listing = match list_dir(dir, &self.filter) {
            Ok(listing) => listing,
            Err(e) => {
                let message = match e {
                    Error::Traversal { message, .. } => message,
                    other => other.to_string(),
                };
                scan.errors.push(DirectoryFailure {
                    path: dir.to_path_buf(),
                    message,
                });
                return;
            }
        };

        if listing.dirs.is_empty() {
            scan.organizations.push(self.organization(root, dir, &listing));
            return;
        }
        for sub in &listing.dirs {
            self.visit(root, sub, scan);
        }
    }

    fn organization(&self, root: &Path, dir: &Path, listing: &Listing) -> Organization {
        let has_marker = listing
            .files
            .iter()
            .any(|f| f.file_name().map_or(false, |n| n == self.package_marker.as_str()));
        let kind = if has_marker {
            OrganizationKind::Module
        } else {
            OrganizationKind::Package
        };
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.display().to_string());

        Organization {
            name,
            path: relative_path(root, dir),
            kind,
        }
    }
}
