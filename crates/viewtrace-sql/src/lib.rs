//! SQL file discovery and pattern-based dependency extraction
//!
//! This crate handles:
//! - Finding `.sql` files under a directory
//! - Extracting the defined object and its `FROM`/`JOIN` references
//! - The shallow, single-directory "who reads this table" lookup
//!
//! Extraction is deliberately pattern-based. Comments, string literals, CTEs
//! and subqueries are not understood.

pub mod scanner;
pub mod extractor;
pub mod shallow;

pub use scanner::{FileScanner, is_sql_file, read_sql_text};
pub use extractor::{DefinitionExtractor, Extraction, collapse_whitespace};
pub use shallow::find_direct_users;
