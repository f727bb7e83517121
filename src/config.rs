use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration loaded from logtally.toml.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[derive(Default)]
pub struct RunConfig {
    pub parser: ParserConfig,
    pub run: RunSettings,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    pub name: String,
    /// Parser option string, `key=value` tokens separated by whitespace.
    pub options: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[derive(Default)]
pub struct RunSettings {
    /// Abort the window on the first unparseable line instead of tallying it.
    pub fail_fast: bool,
    /// Window length reported to the parser. Measured from the run when unset.
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[derive(Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `name value units type` line per observation.
    #[default]
    Text,
    /// The full run report as JSON.
    Json,
}

// --- Default implementations ---

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            name: "nginx".to_string(),
            options: None,
        }
    }
}

impl RunConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let config = RunConfig::default();
        assert_eq!(config.parser.name, "nginx");
        assert_eq!(config.parser.options, None);
        assert!(!config.run.fail_fast);
        assert_eq!(config.run.duration_secs, None);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = RunConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logtally.toml");
        std::fs::write(
            &path,
            r#"
[parser]
name = "keyvalue"
options = "prefix=worker"

[output]
format = "json"
"#,
        )
        .unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.parser.name, "keyvalue");
        assert_eq!(config.parser.options.as_deref(), Some("prefix=worker"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.run.fail_fast);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logtally.toml");
        std::fs::write(&path, "[run]\nfail_fats = true\n").unwrap();
        let err = RunConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn directory_path_is_read_error() {
        let dir = tempdir().unwrap();
        let err = RunConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
