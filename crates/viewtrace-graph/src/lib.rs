//! Dependency graph construction and reverse-dependency trees
//!
//! This crate handles:
//! - Building the object graph from extracted SQL definitions
//! - Resolving a user query to graph objects (exact or suffix match)
//! - Rendering "who depends on X" trees for impact analysis

pub mod graph;
pub mod resolver;
pub mod tree;

pub use graph::{DependencyGraph, DefinitionConflict, GraphBuilder};
pub use resolver::{MatchResolver, Resolution};
pub use tree::{DependencyTree, ReverseIndex, TreeNode, render};
