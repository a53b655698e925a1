//! Graph layout
//!
//! Assigns every data object a level so an external layout engine can draw the
//! lineage graph in layers.

pub mod levels;

pub use levels::{assign_levels, Levels};
