//! CLI module for Surveyor

mod args;

pub use args::{Args, Command};

use crate::config::{Config, OutputFormat};
use crate::error::{Error, Result};
use crate::extract::{Extractor, FileContext};
use crate::output::{write_json, write_report, JsonLinesSink};
use crate::parser::PythonParser;
use crate::scan::{ScanReport, Scanner};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "surveyor.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_logging(matches!(args.command, Command::Scan { verbose: true, .. }));

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the default level
fn init_logging(verbose: bool) {
    let default = if verbose { "surveyor=info" } else { "surveyor=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Scan {
            path,
            config,
            format,
            output,
            ignore,
            sequential,
            verbose,
        } => {
            let mut cfg = load_config(config.as_deref())?;

            // CLI takes precedence
            cfg.merge_cli(ignore, format, sequential);

            if verbose {
                eprintln!("Scanning: {}", path.display());
                eprintln!("Format: {:?}", cfg.output.format);
                eprintln!("Parallel: {}", cfg.scan.parallel);
                eprintln!("Ignore: {:?}", cfg.scan.ignore);
            }

            let scanner = Scanner::new(cfg)?.with_verbose(verbose);
            let writer = open_output(output.as_deref())?;

            let report = match scanner.config().output.format {
                OutputFormat::Json => {
                    let (ingestion, report) = scanner.scan_collect(&path)?;
                    write_report(writer, &ingestion, &report)?;
                    report
                }
                OutputFormat::Jsonl => {
                    let mut sink = JsonLinesSink::new(writer);
                    let report = scanner.scan(&path, &mut sink)?;
                    sink.finish(&report)?;
                    report
                }
            };

            summarize(&report, verbose);
            if let Some(output) = output {
                eprintln!("Output written to: {}", output.display());
            }
            Ok(())
        }

        Command::File { path, root, config } => {
            let cfg = load_config(config.as_deref())?;
            if !path.is_file() {
                return Err(Error::PathNotFound(path));
            }

            let mut file = FileContext::new(&path);
            if let Some(root) = root {
                let scanner = Scanner::new(cfg.clone())?;
                let root = canonical_dir(&root)?;
                let organizations = scanner.organization_walker().walk(&root).by_directory(&root);
                let dir = path.canonicalize()?.parent().map(Path::to_path_buf);
                file = file.with_organization(dir.and_then(|d| organizations.get(&d).cloned()));
            }

            let mut parser = PythonParser::new()?;
            let analysis = Extractor::new(cfg.extract).analyze_file(&mut parser, &file)?;
            write_json(io::stdout().lock(), &analysis)
        }

        Command::Orgs { path, config } => {
            let scanner = Scanner::new(load_config(config.as_deref())?)?;
            let root = canonical_dir(&path)?;
            let scan = scanner.organization_walker().walk(&root);
            for failure in &scan.errors {
                eprintln!("Warning: {}", failure.to_error());
            }
            write_json(io::stdout().lock(), &scan)
        }
    }
}

/// Explicit config files must load; the default one is used only if present
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG);
            if default_path.is_file() {
                Config::load(default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn canonical_dir(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(Error::NotADirectory(path.to_path_buf()));
    }
    Ok(path.canonicalize()?)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };
    Ok(writer)
}

fn summarize(report: &ScanReport, verbose: bool) {
    let stats = &report.stats;
    info!(
        files = stats.files,
        components = stats.components,
        methods = stats.methods,
        variables = stats.variables,
        errors = report.errors.len(),
        "scan complete"
    );

    if verbose {
        eprintln!(
            "Scan complete: {} files, {} components, {} methods, {} variables, {} organizations",
            stats.files, stats.components, stats.methods, stats.variables, stats.organizations
        );
    }

    if !report.errors.is_empty() {
        eprintln!("\nErrors ({}):", report.errors.len());
        for err in report.errors.iter().take(5) {
            eprintln!("  {}", err);
        }
        if report.errors.len() > 5 {
            eprintln!("  ... and {} more", report.errors.len() - 5);
        }
    }
}
