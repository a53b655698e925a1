//! Lineage graph aggregates

pub mod action_graph;
pub mod builder;
pub mod lineage_graph;

pub use action_graph::*;
pub use builder::*;
pub use lineage_graph::*;
