//! Configuration file parsing for `unfurl.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `unfurl.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UnfurlConfig {
    /// Expansion behaviour.
    #[serde(default)]
    pub expand: ExpandConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl UnfurlConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content)?;

        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })?;
        config.check()?;
        Ok(config)
    }

    /// Apply environment-specific overrides.
    ///
    /// The merged configuration is checked again before it is returned.
    pub fn with_environment(mut self, env: &str) -> SchemaResult<Self> {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(expand) = overrides.expand {
                if let Some(prefer_batch) = expand.prefer_batch {
                    self.expand.prefer_batch = prefer_batch;
                }
                if let Some(max_depth) = expand.max_depth {
                    self.expand.max_depth = Some(max_depth);
                }
            }
            if let Some(logging) = overrides.logging {
                if let Some(level) = logging.level {
                    self.logging.level = level;
                }
                if let Some(format) = logging.format {
                    self.logging.format = format;
                }
            }
        }
        self.check()?;
        Ok(self)
    }

    fn check(&self) -> SchemaResult<()> {
        if self.expand.separator.is_empty() {
            return Err(SchemaError::ConfigError {
                message: "expand.separator must not be empty".to_string(),
            });
        }
        if self.expand.max_depth == Some(0) {
            return Err(SchemaError::ConfigError {
                message: "expand.max_depth must be at least 1".to_string(),
            });
        }
        for (name, overrides) in &self.environments {
            let depth = overrides.expand.as_ref().and_then(|e| e.max_depth);
            if depth == Some(0) {
                return Err(SchemaError::ConfigError {
                    message: format!("environments.{}.expand.max_depth must be at least 1", name),
                });
            }
        }
        Ok(())
    }
}

/// Expansion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExpandConfig {
    /// Use the `batch` declaration for plural fields when one exists.
    #[serde(default = "default_true")]
    pub prefer_batch: bool,

    /// Maximum number of segments kept from each expand path.
    pub max_depth: Option<usize>,

    /// Segment separator in expand paths.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            prefer_batch: true,
            max_depth: None,
            separator: default_separator(),
        }
    }
}

fn default_true() -> bool { true }
fn default_separator() -> String { ".".to_string() }

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format (json, pretty, compact).
    #[serde(default = "default_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String { "warn".to_string() }
fn default_format() -> LogFormat { LogFormat::Json }

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON lines.
    Json,
    /// Multi-line human readable.
    Pretty,
    /// Single-line human readable.
    Compact,
}

impl LogFormat {
    /// Get the format name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Expansion overrides.
    pub expand: Option<ExpandOverride>,

    /// Logging overrides.
    pub logging: Option<LoggingOverride>,
}

/// Expansion configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExpandOverride {
    /// Override prefer_batch.
    pub prefer_batch: Option<bool>,

    /// Override max_depth.
    pub max_depth: Option<usize>,
}

/// Logging configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingOverride {
    /// Override level.
    pub level: Option<String>,

    /// Override format.
    pub format: Option<LogFormat>,
}

/// Substitute `${NAME}` with the value of the environment variable `NAME`.
///
/// Unset variables are left in place so the TOML error points at them.
fn expand_env_vars(content: &str) -> SchemaResult<String> {
    let pattern = regex_lite::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
        SchemaError::ConfigError {
            message: format!("invalid interpolation pattern: {}", e),
        }
    })?;

    let expanded = pattern.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(expanded.into_owned())
}
