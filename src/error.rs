use std::path::PathBuf;
use thiserror::Error;

/// Surveyor error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Cannot read {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("Cannot list directory {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    #[error("Failed to persist {stage} for {path}: {message}")]
    Sink {
        path: PathBuf,
        stage: &'static str,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Parser error: {0}")]
    Parser(String),
}

/// Result type alias for Surveyor operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unreadable-file error
    pub fn unreadable(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Unreadable {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a directory traversal error
    pub fn traversal(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Traversal {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a sink error for one persistence stage
    pub fn sink(path: impl Into<PathBuf>, stage: &'static str, message: impl ToString) -> Self {
        Error::Sink {
            path: path.into(),
            stage,
            message: message.to_string(),
        }
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Path of the file or directory this error is about, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Error::PathNotFound(path) | Error::NotADirectory(path) => Some(path),
            Error::Parse { path, .. }
            | Error::Unreadable { path, .. }
            | Error::Traversal { path, .. }
            | Error::Sink { path, .. } => Some(path),
            _ => None,
        }
    }
}
