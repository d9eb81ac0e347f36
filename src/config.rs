use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

/// Project traversal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns matched against directory and file names to skip
    pub ignore: Vec<String>,
    /// File whose presence marks a leaf directory as a module
    pub package_marker: String,
    /// Source file extensions fed to the extractors
    pub extensions: Vec<String>,
    /// Do not run the extractors on the package marker file itself
    pub skip_package_markers: bool,
    /// Extract the files of one level on the rayon pool
    pub parallel: bool,
}

/// Extractor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Emit a module/mixed component per file that declares module-level functions
    pub module_components: bool,
    /// Count `self.x` assignments in `__init__` as component attributes
    pub init_attributes: bool,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One pretty-printed report
    #[default]
    Json,
    /// One JSON object per persisted bundle
    Jsonl,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore: vec!["__pycache__".to_string(), "*.egg-info".to_string()],
            package_marker: "__init__.py".to_string(),
            extensions: vec!["py".to_string()],
            skip_package_markers: true,
            parallel: true,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            module_components: false,
            init_attributes: true,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, ignore: Vec<String>, format: Option<String>, sequential: bool) {
        if !ignore.is_empty() {
            self.scan.ignore.extend(ignore);
        }

        if let Some(fmt) = format {
            self.output.format = match fmt.as_str() {
                "jsonl" | "ndjson" => OutputFormat::Jsonl,
                _ => OutputFormat::Json,
            };
        }

        if sequential {
            self.scan.parallel = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scan.package_marker.trim().is_empty() {
            return Err(Error::config_validation("package_marker must not be empty"));
        }

        if self.scan.extensions.is_empty() {
            return Err(Error::config_validation("at least one extension required"));
        }

        if let Some(ext) = self.scan.extensions.iter().find(|e| e.starts_with('.')) {
            return Err(Error::config_validation(format!(
                "extension {:?} must be given without a leading dot",
                ext
            )));
        }

        for pattern in &self.scan.ignore {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.package_marker, "__init__.py");
        assert_eq!(config.scan.extensions, vec!["py".to_string()]);
        assert!(config.scan.parallel);
        assert!(!config.extract.module_components);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[scan]
ignore = ["build", "dist"]
package_marker = "__marker__"
parallel = false

[extract]
module_components = true

[output]
format = "jsonl"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.scan.ignore, vec!["build".to_string(), "dist".to_string()]);
        assert_eq!(config.scan.package_marker, "__marker__");
        assert!(!config.scan.parallel);
        assert!(config.scan.skip_package_markers);
        assert!(config.extract.module_components);
        assert!(config.extract.init_attributes);
        assert_eq!(config.output.format, OutputFormat::Jsonl);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/surveyor.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let config = Config::load_or_default(Path::new("/nonexistent/surveyor.toml"));
        assert_eq!(config.scan.package_marker, "__init__.py");
    }

    #[test]
    fn test_validation_empty_marker() {
        let mut config = Config::default();
        config.scan.package_marker = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_extensions() {
        let mut config = Config::default();
        config.scan.extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_dotted_extension() {
        let mut config = Config::default();
        config.scan.extensions = vec![".py".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_glob() {
        let mut config = Config::default();
        config.scan.ignore.push("[unclosed".to_string());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::GlobPattern(_)));
    }

    #[test]
    fn test_merge_cli_ignore() {
        let mut config = Config::default();
        let initial = config.scan.ignore.len();
        config.merge_cli(vec!["node_modules".to_string()], None, false);
        assert_eq!(config.scan.ignore.len(), initial + 1);
    }

    #[test]
    fn test_merge_cli_format() {
        let mut config = Config::default();
        config.merge_cli(vec![], Some("jsonl".to_string()), false);
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        config.merge_cli(vec![], Some("json".to_string()), false);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_merge_cli_sequential() {
        let mut config = Config::default();
        config.merge_cli(vec![], None, true);
        assert!(!config.scan.parallel);
    }

    #[test]
    fn test_output_format_parsing() {
        let toml_str = r#"format = "jsonl""#;
        let output: OutputConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(output.format, OutputFormat::Jsonl);
    }
}
