//! viewtrace core
//!
//! Shared domain types: normalized identifiers, the name normalizer and the
//! run configuration (`viewtrace.toml`).

pub mod identifier;
pub mod config;

pub use identifier::{Identifier, Normalizer, QUOTE_CHARS, DEFAULT_QUALIFIER_DELIMITER};
pub use config::{Config, ConfigError, MatchMode, CONFIG_FILE_NAME};
