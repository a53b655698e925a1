//! Level assignment
//!
//! A node's level is one more than the highest level among its predecessors; nodes
//! without predecessors sit on level 0. Recursive inputs make cycles possible, so
//! edges closing a cycle are dropped first:
//!
//! 1. self loops are ignored;
//! 2. a depth-first search starts at every node without incoming edges, then at the
//!    remaining nodes, both in configuration order;
//! 3. every edge the search classifies as a back edge is ignored;
//! 4. levels are longest-path depths over the remaining acyclic graph.

use crate::aggregate::LineageGraph;
use crate::value_objects::DataObjectId;
use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{trace, warn};

/// Level of every data object plus the edges left out of the computation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Levels {
    /// Level per data object, in configuration order
    pub by_node: IndexMap<DataObjectId, u32>,
    /// Number of data objects on each level
    pub counts: Vec<usize>,
    /// Indices of edges ignored to break cycles
    pub ignored_edges: Vec<usize>,
}

impl Levels {
    /// Level of a data object
    pub fn level(&self, id: &str) -> Option<u32> {
        self.by_node.get(id).copied()
    }

    /// Highest assigned level, `None` for an empty graph
    pub fn max_level(&self) -> Option<u32> {
        self.by_node.values().copied().max()
    }

    /// Data objects on a given level
    pub fn nodes_on(&self, level: u32) -> impl Iterator<Item = &DataObjectId> {
        self.by_node
            .iter()
            .filter(move |(_, node_level)| **node_level == level)
            .map(|(id, _)| id)
    }
}

/// Assign a level to every data object of the graph
pub fn assign_levels(graph: &LineageGraph) -> Levels {
    let node_count = graph.node_count();
    let mut full: DiGraph<(), usize> = DiGraph::with_capacity(node_count, graph.edge_count());
    let indices: Vec<NodeIndex> = (0..node_count).map(|_| full.add_node(())).collect();
    let mut ignored_edges = Vec::new();

    for (edge_index, edge) in graph.edges().iter().enumerate() {
        let (Some(source), Some(target)) = (
            graph.node_index(edge.source.as_str()),
            graph.node_index(edge.target.as_str()),
        ) else {
            continue;
        };
        if source == target {
            ignored_edges.push(edge_index);
            continue;
        }
        full.add_edge(indices[source], indices[target], edge_index);
    }

    let mut roots: Vec<NodeIndex> = indices
        .iter()
        .copied()
        .filter(|index| {
            full.neighbors_directed(*index, petgraph::Direction::Incoming)
                .next()
                .is_none()
        })
        .collect();
    roots.extend(indices.iter().copied());

    let mut back_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    depth_first_search(&full, roots, |event| {
        if let DfsEvent::BackEdge(from, to) = event {
            back_edges.insert((from, to));
        }
    });

    let mut acyclic: DiGraph<(), ()> = DiGraph::with_capacity(node_count, full.edge_count());
    for _ in 0..node_count {
        acyclic.add_node(());
    }
    for edge in full.raw_edges() {
        let endpoints = (edge.source(), edge.target());
        if back_edges.contains(&endpoints) {
            trace!(edge = edge.weight, "Ignoring back edge for level assignment");
            ignored_edges.push(edge.weight);
        } else {
            acyclic.add_edge(endpoints.0, endpoints.1, ());
        }
    }
    ignored_edges.sort_unstable();

    let order = match toposort(&acyclic, None) {
        Ok(order) => order,
        Err(cycle) => {
            // Unreachable once back edges are gone; fall back to configuration order
            warn!(node = cycle.node_id().index(), "Cycle left after removing back edges");
            indices.clone()
        }
    };

    let mut levels = vec![0u32; node_count];
    for node in order {
        let next = levels[node.index()] + 1;
        for successor in acyclic.neighbors(node) {
            if levels[successor.index()] < next {
                levels[successor.index()] = next;
            }
        }
    }

    let mut counts = Vec::new();
    let by_node: IndexMap<DataObjectId, u32> = graph
        .nodes()
        .zip(levels)
        .map(|(node, level)| {
            let slot = level as usize;
            if counts.len() <= slot {
                counts.resize(slot + 1, 0);
            }
            counts[slot] += 1;
            (node.id().clone(), level)
        })
        .collect();

    Levels {
        by_node,
        counts,
        ignored_edges,
    }
}
