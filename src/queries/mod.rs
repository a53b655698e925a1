//! Graph queries
//!
//! Queries provide read-only access to a built lineage graph.

pub mod partial_graph;

pub use partial_graph::{ExtractOptions, Focus, PartialGraph, TraversalDepth};
