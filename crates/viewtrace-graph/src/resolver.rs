//! Query name resolution
//!
//! Maps a user-supplied name onto graph objects, either by exact match or by
//! trailing-substring match.

use serde::Serialize;
use std::collections::BTreeSet;
use viewtrace_core::{Identifier, MatchMode, Normalizer};

use crate::graph::DependencyGraph;
use crate::tree::ReverseIndex;

/// What the graph knows about a single object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// Never defined or referenced
    Unknown,

    /// Known, but nothing reads from it
    Leaf,

    /// Known, with this many direct dependents
    HasDependents { direct: usize },
}

impl Resolution {
    /// Classify `object` against the graph and its reverse index
    pub fn classify(object: &Identifier, graph: &DependencyGraph, index: &ReverseIndex) -> Self {
        if !graph.contains(object.as_str()) {
            return Self::Unknown;
        }

        match index.dependents(object.as_str()).len() {
            0 => Self::Leaf,
            direct => Self::HasDependents { direct },
        }
    }
}

/// Resolves query strings to graph objects
#[derive(Debug, Clone, Default)]
pub struct MatchResolver {
    normalizer: Normalizer,
    mode: MatchMode,
}

impl MatchResolver {
    /// The normalizer must be the one the graph was built with, or queries
    /// and graph keys will not line up.
    pub fn new(normalizer: Normalizer, mode: MatchMode) -> Self {
        Self { normalizer, mode }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Resolve `query` to the set of matching objects
    ///
    /// An empty set means no match; it is never an error. A query that
    /// normalizes to the empty string matches nothing.
    pub fn resolve(&self, query: &str, graph: &DependencyGraph) -> BTreeSet<Identifier> {
        let target = self.normalizer.normalize(query);
        if target.is_empty() {
            return BTreeSet::new();
        }

        match self.mode {
            MatchMode::Exact => {
                if graph.contains(target.as_str()) {
                    BTreeSet::from([target])
                } else {
                    BTreeSet::new()
                }
            }
            MatchMode::Suffix => graph
                .all_objects()
                .into_iter()
                .filter(|object| object.ends_with(&target))
                .cloned()
                .collect(),
        }
    }
}
