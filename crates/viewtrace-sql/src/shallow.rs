//! Shallow reference lookup
//!
//! Lists the files directly inside one directory that read from a table,
//! without building a graph. Matching is on raw text: the table name must
//! follow `FROM` or `JOIN` as a whole word, ignoring case.

use regex::Regex;
use std::path::{Path, PathBuf};

use crate::scanner::{read_sql_text, FileScanner};

/// Files directly under `dir` with a `FROM`/`JOIN` reference to `table`
///
/// Subdirectories are not searched. Unreadable files are skipped. A blank
/// table name matches nothing. The result is sorted by path.
pub fn find_direct_users(dir: &Path, table: &str) -> Result<Vec<PathBuf>, regex::Error> {
    let target = table.trim().to_lowercase();
    if target.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = Regex::new(&format!(r"\b(?:from|join)\s+{}\b", regex::escape(&target)))?;

    let mut matches: Vec<PathBuf> = FileScanner::new(dir)
        .non_recursive()
        .scan()
        .into_iter()
        .filter(|path| match read_sql_text(path) {
            Ok(content) => pattern.is_match(&content.to_lowercase()),
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "skipping unreadable file");
                false
            }
        })
        .collect();

    matches.sort();
    Ok(matches)
}
