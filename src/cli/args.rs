//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Extract the structural model of a Python project
#[derive(Parser, Debug)]
#[command(name = "surveyor")]
#[command(about = "Extract the structural model of a Python project")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a project and write components, methods, variables and organizations
    Scan {
        /// Root directory of the project
        path: PathBuf,

        /// Config file path (defaults to ./surveyor.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (json, jsonl)
        #[arg(long)]
        format: Option<String>,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Glob patterns of directory or file names to skip (can be repeated)
        #[arg(long)]
        ignore: Vec<String>,

        /// Extract files one at a time
        #[arg(long)]
        sequential: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Extract a single file and print its analysis as JSON
    File {
        /// Python source file
        path: PathBuf,

        /// Project root, used to attach the file's organization
        #[arg(long)]
        root: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the organizations (leaf directories) of a project as JSON
    Orgs {
        /// Root directory of the project
        path: PathBuf,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
