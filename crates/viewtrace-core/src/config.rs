//! Configuration schema (viewtrace.toml)

use serde::{Deserialize, Serialize};

use crate::identifier::{validate_delimiter, DEFAULT_QUALIFIER_DELIMITER};

/// Config file looked up in the working directory when none is given
pub const CONFIG_FILE_NAME: &str = "viewtrace.toml";

/// How a query name is matched against graph objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The normalized query must equal an object name
    #[default]
    Exact,

    /// Any object whose name ends with the normalized query
    ///
    /// Bridges schema-qualified and unqualified references: `orders` finds
    /// `sales.orders`.
    Suffix,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Suffix => write!(f, "suffix"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Query matching mode
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Strip `~schema~.` style qualifiers during normalization
    #[serde(default = "default_true")]
    pub strip_schema_qualifier: bool,

    /// Delimiter wrapping a strippable schema qualifier
    #[serde(default = "default_delimiter")]
    pub qualifier_delimiter: char,

    /// Report objects defined by more than one file
    ///
    /// Conflicts are always resolved last-file-wins; this only controls
    /// whether they are surfaced as warnings.
    #[serde(default)]
    pub warn_on_conflicts: bool,
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    DEFAULT_QUALIFIER_DELIMITER
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            strip_schema_qualifier: true,
            qualifier_delimiter: DEFAULT_QUALIFIER_DELIMITER,
            warn_on_conflicts: false,
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot express constraints for
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strip_schema_qualifier {
            validate_delimiter(self.qualifier_delimiter)?;
        }

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
