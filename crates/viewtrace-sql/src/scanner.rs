//! Recursive `.sql` file discovery

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds SQL definition files under a root directory
#[derive(Debug, Clone)]
pub struct FileScanner {
    /// Directory to search
    root: PathBuf,

    /// Limit descent; `Some(1)` lists only the root's direct children
    max_depth: Option<usize>,
}

impl FileScanner {
    /// Create a scanner that descends through every subdirectory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: None,
        }
    }

    /// Only look at files directly inside the root
    pub fn non_recursive(mut self) -> Self {
        self.max_depth = Some(1);
        self
    }

    /// Collect every `.sql` file
    ///
    /// A missing or unreadable root yields an empty list. Entries that cannot
    /// be read are skipped. Order follows the walk and is not guaranteed.
    pub fn scan(&self) -> Vec<PathBuf> {
        if !self.root.exists() {
            tracing::debug!(root = %self.root.display(), "scan root does not exist");
            return Vec::new();
        }

        let mut walker = WalkDir::new(&self.root);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut sql_files = Vec::new();

        for entry in walker.into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());

            if is_file && is_sql_file(entry.path()) {
                sql_files.push(entry.into_path());
            }
        }

        tracing::debug!(root = %self.root.display(), files = sql_files.len(), "scan complete");
        sql_files
    }
}

/// Whether the file name ends in `.sql`, ignoring case
pub fn is_sql_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase().ends_with(".sql"))
        .unwrap_or(false)
}

/// Read a SQL file as text
///
/// Bytes that are not valid UTF-8 are dropped rather than failing the read,
/// so a stray Latin-1 character in a comment does not hide the statement.
pub fn read_sql_text(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).replace(char::REPLACEMENT_CHARACTER, ""),
    })
}
