//! Reverse dependency trees
//!
//! Inverts the forward edges of a [`DependencyGraph`] and walks them from a
//! root object, producing the tree of everything that transitively reads from
//! it. Traversal uses an explicit stack, so deep chains cannot overflow, and a
//! visited set owned by each traversal, so cycles terminate.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use viewtrace_core::Identifier;

use crate::graph::DependencyGraph;

/// Marker appended to nodes that were already expanded earlier in the tree
const REPEATED_MARKER: &str = " (already shown)";

/// Object -> objects that read from it
///
/// Derived from a graph for one query and then dropped; it is never updated
/// on its own.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    dependents: BTreeMap<Identifier, BTreeSet<Identifier>>,
}

impl ReverseIndex {
    /// Invert every forward edge of the graph
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let mut dependents: BTreeMap<Identifier, BTreeSet<Identifier>> = BTreeMap::new();

        for (object, depends_on) in graph.edges() {
            dependents
                .entry(depends_on.clone())
                .or_default()
                .insert(object.clone());
        }

        Self { dependents }
    }

    /// Direct dependents of an object, in lexicographic order
    pub fn dependents(&self, object: &str) -> Vec<&Identifier> {
        self.dependents
            .get(object)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }
}

/// One emitted line of a dependency tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: Identifier,

    /// Distance from the root; the root is 0
    pub depth: usize,

    /// Already expanded earlier in this tree, so its dependents are not
    /// listed again
    pub repeated: bool,
}

/// Reverse dependency tree rooted at one object, in depth-first order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyTree {
    pub root: Identifier,
    pub nodes: Vec<TreeNode>,
}

impl DependencyTree {
    /// Walk dependents of `root` depth-first
    ///
    /// Each node is expanded at most once. A node reached again (through a
    /// cycle or a diamond) is emitted with `repeated` set and not expanded.
    /// Siblings are visited in lexicographic order.
    pub fn build(root: &Identifier, index: &ReverseIndex) -> Self {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&Identifier, usize)> = vec![(root, 0)];
        let mut nodes = Vec::new();

        while let Some((current, depth)) = stack.pop() {
            if !visited.insert(current.as_str()) {
                nodes.push(TreeNode {
                    name: current.clone(),
                    depth,
                    repeated: true,
                });
                continue;
            }

            nodes.push(TreeNode {
                name: current.clone(),
                depth,
                repeated: false,
            });

            // Reversed so the smallest name is popped first
            for child in index.dependents(current.as_str()).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        Self {
            root: root.clone(),
            nodes,
        }
    }

    /// Nothing depends on the root
    pub fn is_leaf(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Distinct objects that transitively depend on the root
    pub fn dependent_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| !node.repeated && node.depth > 0)
            .count()
    }

    /// Render as indented text, one node per line
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        for node in &self.nodes {
            if node.depth > 0 {
                out.push_str(&"    ".repeat(node.depth - 1));
                out.push_str("└── ");
            }
            out.push_str(node.name.as_str());
            if node.repeated {
                out.push_str(REPEATED_MARKER);
            }
            out.push('\n');
        }

        out
    }
}

/// Build one tree per root against a freshly derived reverse index
///
/// Roots are independent: each traversal starts with an empty visited set.
pub fn render(roots: &BTreeSet<Identifier>, graph: &DependencyGraph) -> Vec<DependencyTree> {
    let index = ReverseIndex::from_graph(graph);

    roots
        .iter()
        .map(|root| DependencyTree::build(root, &index))
        .collect()
}
