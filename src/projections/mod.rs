//! Graph projections
//!
//! Read models derived from a lineage graph for consumers outside the crate.

pub mod render_graph;

pub use render_graph::{RenderEdge, RenderGraph, RenderNode};
