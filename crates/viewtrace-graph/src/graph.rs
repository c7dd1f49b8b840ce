//! Dependency graph construction
//!
//! Aggregates per-file extractions into one graph of defined objects and the
//! objects they read from. The graph is rebuilt from scratch on every run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use viewtrace_core::{Config, ConfigError, Identifier, Normalizer};
use viewtrace_sql::{read_sql_text, DefinitionExtractor, Extraction, FileScanner};

/// Two files defining the same object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionConflict {
    /// The contested object
    pub object: Identifier,

    /// File whose definition was replaced
    pub previous: PathBuf,

    /// File whose definition was kept
    pub winner: PathBuf,
}

/// Defined objects and forward dependency edges
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Defined object -> file defining it
    definitions: BTreeMap<Identifier, PathBuf>,

    /// Forward edges: object -> objects it reads from
    dependencies: BTreeMap<Identifier, BTreeSet<Identifier>>,

    /// Definitions replaced by a later file, in processing order
    conflicts: Vec<DefinitionConflict>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` defines `object`
    ///
    /// A later definition replaces an earlier one; the replacement is kept as
    /// a [`DefinitionConflict`].
    pub fn insert_definition(&mut self, object: Identifier, path: impl Into<PathBuf>) {
        let path = path.into();

        if let Some(previous) = self.definitions.insert(object.clone(), path.clone()) {
            if previous != path {
                self.conflicts.push(DefinitionConflict {
                    object,
                    previous,
                    winner: path,
                });
            }
        }
    }

    /// Add a dependency edge (`from` reads from `to`)
    ///
    /// Self edges are ignored. Returns whether the edge was new.
    pub fn add_dependency(&mut self, from: &Identifier, to: &Identifier) -> bool {
        if from == to {
            return false;
        }

        self.dependencies
            .entry(from.clone())
            .or_default()
            .insert(to.clone())
    }

    /// Merge one file's extraction into the graph
    pub fn add_extraction(&mut self, path: &Path, extraction: Extraction) {
        let Some(defined) = extraction.definition else {
            return;
        };

        for dep in &extraction.dependencies {
            self.add_dependency(&defined, dep);
        }

        self.insert_definition(defined, path);
    }

    /// File defining `object`, if any
    pub fn definition_file(&self, object: &str) -> Option<&Path> {
        self.definitions.get(object).map(PathBuf::as_path)
    }

    /// Immediate dependencies of an object
    pub fn dependencies_of(&self, object: &str) -> Vec<&Identifier> {
        self.dependencies
            .get(object)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }

    /// Every forward edge as `(from, to)`
    pub fn edges(&self) -> impl Iterator<Item = (&Identifier, &Identifier)> {
        self.dependencies
            .iter()
            .flat_map(|(from, deps)| deps.iter().map(move |to| (from, to)))
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Whether `object` is defined or referenced anywhere
    pub fn contains(&self, object: &str) -> bool {
        self.definitions.contains_key(object)
            || self.dependencies.values().any(|deps| deps.contains(object))
    }

    /// Every object in the graph: definitions and dependency targets
    pub fn all_objects(&self) -> BTreeSet<&Identifier> {
        self.definitions
            .keys()
            .chain(self.dependencies.keys())
            .chain(self.dependencies.values().flatten())
            .collect()
    }

    pub fn conflicts(&self) -> &[DefinitionConflict] {
        &self.conflicts
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.dependencies.is_empty()
    }
}

/// Builds a [`DependencyGraph`] from SQL files
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    extractor: DefinitionExtractor,

    /// Log definition conflicts as warnings
    warn_on_conflicts: bool,
}

impl GraphBuilder {
    pub fn new(extractor: DefinitionExtractor) -> Self {
        Self {
            extractor,
            warn_on_conflicts: false,
        }
    }

    /// Builder configured from `viewtrace.toml` settings
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let extractor = DefinitionExtractor::new(Normalizer::from_config(config)?)?;

        Ok(Self::new(extractor).with_conflict_warnings(config.warn_on_conflicts))
    }

    pub fn with_conflict_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_conflicts = enabled;
        self
    }

    pub fn extractor(&self) -> &DefinitionExtractor {
        &self.extractor
    }

    /// Scan `root` recursively and build the graph
    pub fn build_from_dir(&self, root: &Path) -> DependencyGraph {
        self.build(FileScanner::new(root).scan())
    }

    /// Build the graph from a set of files
    ///
    /// Paths are sorted first, so which file wins a definition conflict does
    /// not depend on directory enumeration order. Invalid UTF-8 bytes are
    /// dropped; files that cannot be read contribute nothing.
    pub fn build(&self, files: impl IntoIterator<Item = PathBuf>) -> DependencyGraph {
        let mut files: Vec<PathBuf> = files.into_iter().collect();
        files.sort();
        files.dedup();

        let mut graph = DependencyGraph::new();

        for path in &files {
            let Some(text) = read_text(path) else {
                continue;
            };

            let extraction = self.extractor.extract(&text);
            match &extraction.definition {
                Some(defined) => tracing::debug!(
                    file = %path.display(),
                    object = %defined,
                    dependencies = extraction.dependencies.len(),
                    "extracted definition"
                ),
                None => tracing::debug!(file = %path.display(), "no definition found"),
            }

            let conflicts_before = graph.conflicts().len();
            graph.add_extraction(path, extraction);

            if self.warn_on_conflicts {
                for conflict in &graph.conflicts()[conflicts_before..] {
                    tracing::warn!(
                        object = %conflict.object,
                        previous = %conflict.previous.display(),
                        winner = %conflict.winner.display(),
                        "object defined by more than one file; keeping the later file"
                    );
                }
            }
        }

        graph
    }
}

/// Read a file, logging and skipping anything that cannot be read
fn read_text(path: &Path) -> Option<String> {
    match read_sql_text(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::debug!(file = %path.display(), error = %e, "skipping unreadable file");
            None
        }
    }
}
