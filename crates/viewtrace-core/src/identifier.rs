//! Identifier normalization
//!
//! Raw name tokens captured from SQL text are canonicalized into comparable
//! keys before they enter the dependency graph. Two tokens that name the same
//! object (`"Sales"."Orders"`, `sales.orders`, ` SALES.ORDERS `) normalize to
//! the same [`Identifier`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::sync::LazyLock;

use crate::config::{Config, ConfigError};

/// Characters treated as identifier quotes and removed during normalization
pub const QUOTE_CHARS: [char; 3] = ['"', '\'', '`'];

/// Default delimiter around a schema qualifier (`~schema~.table`)
pub const DEFAULT_QUALIFIER_DELIMITER: char = '~';

static DEFAULT_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~[^~]+~\.").expect("default qualifier pattern is valid"));

/// A normalized object name
///
/// Only [`Normalizer`] produces these, so every key in the graph has been
/// through the same canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Normalize `raw` with the default rules
    pub fn new(raw: &str) -> Self {
        Normalizer::default().normalize(raw)
    }

    /// The normalized key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Trailing-substring check used by suffix matching
    pub fn ends_with(&self, suffix: &Identifier) -> bool {
        self.0.ends_with(suffix.as_str())
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Canonicalizes raw identifier tokens
///
/// Normalization lowercases, removes every quote character, strips
/// delimiter-enclosed schema qualifiers (`~schema~.`) and trims surrounding
/// whitespace. It never fails and is idempotent.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Qualifier pattern; `None` disables qualifier stripping
    qualifier: Option<Regex>,

    /// Character wrapping a schema qualifier
    delimiter: char,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            qualifier: Some(DEFAULT_QUALIFIER.clone()),
            delimiter: DEFAULT_QUALIFIER_DELIMITER,
        }
    }
}

impl Normalizer {
    /// Create a normalizer with explicit qualifier handling
    pub fn new(strip_schema_qualifier: bool, delimiter: char) -> Result<Self, ConfigError> {
        if !strip_schema_qualifier {
            return Ok(Self {
                qualifier: None,
                delimiter,
            });
        }

        validate_delimiter(delimiter)?;

        let escaped = regex::escape(&delimiter.to_string());
        let pattern = format!(r"{escaped}[^{escaped}]+{escaped}\.");
        let qualifier = Regex::new(&pattern)
            .map_err(|e| ConfigError::InvalidValue(format!("qualifier_delimiter: {}", e)))?;

        Ok(Self {
            qualifier: Some(qualifier),
            delimiter,
        })
    }

    /// Build the normalizer described by a config
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(config.strip_schema_qualifier, config.qualifier_delimiter)
    }

    /// Whether delimited schema qualifiers are stripped
    pub fn strips_qualifiers(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Character wrapping a schema qualifier
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Normalize a raw token into an [`Identifier`]
    pub fn normalize(&self, raw: &str) -> Identifier {
        let mut key: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| !QUOTE_CHARS.contains(c))
            .collect();

        // Stripping one qualifier can splice two halves into a new one, so run
        // to a fixpoint.
        if let Some(qualifier) = &self.qualifier {
            loop {
                let stripped = qualifier.replace_all(&key, "");
                if stripped.len() == key.len() {
                    break;
                }
                key = stripped.into_owned();
            }
        }

        Identifier(key.trim().to_string())
    }
}

/// A delimiter must be distinguishable from the name it wraps
pub(crate) fn validate_delimiter(delimiter: char) -> Result<(), ConfigError> {
    if delimiter.is_alphanumeric()
        || delimiter.is_whitespace()
        || delimiter == '_'
        || delimiter == '.'
        || QUOTE_CHARS.contains(&delimiter)
    {
        return Err(ConfigError::InvalidValue(format!(
            "qualifier_delimiter '{}' must be a punctuation character other than '.', '_' or a quote",
            delimiter
        )));
    }

    Ok(())
}
