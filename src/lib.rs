//! Lineage graphs for data-pipeline configurations
//!
//! A pipeline configuration declares data objects and the actions that transform
//! them. This crate turns such a configuration into a directed lineage graph whose
//! nodes are data objects and whose edges are (input, output) pairs of actions,
//! extracts the upstream and downstream context of a single element, assigns
//! layout levels and projects the result into node and edge lists for a drawing
//! layer.
//!
//! ```no_run
//! use sdl_lineage_graph::{ConfigData, LineageGraph, LoaderOptions, RenderGraph};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigData::load("pipeline.json", &LoaderOptions::default())?;
//! let graph = LineageGraph::from_config(&config).into_result()?;
//! let partial = graph.lineage("int-airports")?;
//! println!("{}", RenderGraph::partial(&graph, &partial).to_mermaid());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod layout;
pub mod projections;
pub mod queries;
pub mod value_objects;

// Re-export main types
pub use aggregate::*;
pub use errors::{BuildErrors, LineageError, LineageResult, ReferenceRole};

// Re-export configuration types
pub use config::{
    normalize_keys, ConfigData, ConfigError, ConfigResult, ElementEntry, ElementLists,
    LoaderOptions,
};

// Re-export query types
pub use queries::{ExtractOptions, Focus, PartialGraph, TraversalDepth};

// Re-export layout and projections
pub use layout::{assign_levels, Levels};
pub use projections::{RenderEdge, RenderGraph, RenderNode};

// Re-export infrastructure
pub use infrastructure::{
    compose_description, description_path, DescriptionCache, DescriptionError,
    DescriptionSource, FsDescriptionSource,
};

// Re-export value objects
pub use value_objects::{
    ActionId, ActionIo, DataObjectId, EdgeKind, ElementType, LayoutDirection,
};
