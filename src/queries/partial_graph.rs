//! Partial graph extraction
//!
//! A partial graph is the lineage context of one element: everything upstream of it,
//! everything downstream of it, and the edges in between. Traversal is breadth-first
//! with a visited set, so cycles introduced by recursive inputs terminate.

use crate::aggregate::{ElementRef, LineageEdge, LineageGraph};
use crate::errors::{LineageError, LineageResult};
use crate::value_objects::{ActionId, DataObjectId, ElementType};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use tracing::debug;

/// Element a partial graph is centred on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum Focus {
    /// A data object, tagged as the center node
    DataObject(DataObjectId),
    /// An action, whose edges are tagged as central
    Action(ActionId),
}

impl Focus {
    /// The focused id
    pub fn id(&self) -> &str {
        match self {
            Focus::DataObject(id) => id.as_str(),
            Focus::Action(id) => id.as_str(),
        }
    }

    /// Element type of the focused element
    pub fn element_type(&self) -> ElementType {
        match self {
            Focus::DataObject(_) => ElementType::DataObject,
            Focus::Action(_) => ElementType::Action,
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element_type(), self.id())
    }
}

/// How far a traversal may go from its seed nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TraversalDepth {
    /// Follow edges until no new node is found
    Unbounded,
    /// Follow at most this many edges away from a seed node
    Limited(usize),
}

impl TraversalDepth {
    /// Whether a node at `distance` from the seeds is expanded further
    fn expands(&self, distance: usize) -> bool {
        match self {
            TraversalDepth::Unbounded => true,
            TraversalDepth::Limited(limit) => distance < *limit,
        }
    }
}

impl Default for TraversalDepth {
    fn default() -> Self {
        TraversalDepth::Unbounded
    }
}

/// Options for partial graph extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Depth of the producer traversal
    pub upstream: TraversalDepth,
    /// Depth of the consumer traversal
    pub downstream: TraversalDepth,
}

impl ExtractOptions {
    /// Transitive lineage in both directions
    pub fn transitive() -> Self {
        Self::default()
    }

    /// Direct producers and consumers only
    pub fn direct_neighbours() -> Self {
        Self {
            upstream: TraversalDepth::Limited(1),
            downstream: TraversalDepth::Limited(1),
        }
    }
}

/// Subset of a lineage graph around a focus
///
/// Node and edge order follows the order of the full graph, so extracting twice
/// yields identical results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialGraph {
    /// The element the graph is centred on
    pub focus: Focus,
    /// Included data objects
    pub nodes: IndexSet<DataObjectId>,
    /// Indices of included edges in the full graph, ascending
    pub edges: Vec<usize>,
}

impl PartialGraph {
    /// Whether the node is the focused data object
    pub fn is_center_node(&self, id: &str) -> bool {
        matches!(&self.focus, Focus::DataObject(focus) if focus.as_str() == id)
    }

    /// Whether the edge belongs to the focused action
    pub fn is_central_edge(&self, graph: &LineageGraph, index: usize) -> bool {
        match (&self.focus, graph.edge(index)) {
            (Focus::Action(focus), Some(edge)) => edge.action_id == *focus,
            _ => false,
        }
    }

    /// Check if a data object is part of the partial graph
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    /// Check if an edge is part of the partial graph
    pub fn contains_edge(&self, index: usize) -> bool {
        self.edges.binary_search(&index).is_ok()
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Included edges resolved against the full graph
    pub fn edges<'g>(&'g self, graph: &'g LineageGraph) -> impl Iterator<Item = &'g LineageEdge> {
        self.edges.iter().filter_map(|index| graph.edge(*index))
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Upstream,
    Downstream,
}

impl LineageGraph {
    /// Extract the lineage context of a focus
    pub fn partial_graph(
        &self,
        focus: &Focus,
        options: &ExtractOptions,
    ) -> LineageResult<PartialGraph> {
        let mut edges: BTreeSet<usize> = BTreeSet::new();
        // Upstream from everything the focus touches, downstream from what it produces
        let (upstream_seeds, downstream_seeds): (Vec<&DataObjectId>, Vec<&DataObjectId>) =
            match focus {
                Focus::DataObject(id) => {
                    let node = self
                        .node(id.as_str())
                        .ok_or_else(|| LineageError::UnknownElement(id.to_string()))?;
                    (vec![node.id()], vec![node.id()])
                }
                Focus::Action(id) => {
                    let action = self
                        .action(id.as_str())
                        .ok_or_else(|| LineageError::UnknownElement(id.to_string()))?;
                    edges.extend(self.edges_of_action(id.as_str()).iter().copied());
                    let outputs: IndexSet<&DataObjectId> = action
                        .outputs()
                        .ids()
                        .filter(|id| self.contains_node(id.as_str()))
                        .collect();
                    let mut seeds: IndexSet<&DataObjectId> = action
                        .inputs()
                        .ids()
                        .filter(|id| self.contains_node(id.as_str()))
                        .collect();
                    seeds.extend(outputs.iter().copied());
                    (seeds.into_iter().collect(), outputs.into_iter().collect())
                }
            };

        let mut visited: HashSet<&DataObjectId> = upstream_seeds.iter().copied().collect();
        let upstream = self.traverse(
            &upstream_seeds,
            Direction::Upstream,
            options.upstream,
            &mut edges,
        );
        let downstream = self.traverse(
            &downstream_seeds,
            Direction::Downstream,
            options.downstream,
            &mut edges,
        );
        visited.extend(upstream);
        visited.extend(downstream);

        let nodes: IndexSet<DataObjectId> = self
            .nodes()
            .map(|node| node.id())
            .filter(|id| visited.contains(id))
            .cloned()
            .collect();

        debug!(
            %focus,
            nodes = nodes.len(),
            edges = edges.len(),
            "Extracted partial graph"
        );

        Ok(PartialGraph {
            focus: focus.clone(),
            nodes,
            edges: edges.into_iter().collect(),
        })
    }

    /// Extract the lineage context of an id, resolved as data object first and action second
    pub fn partial_graph_for(
        &self,
        id: &str,
        options: &ExtractOptions,
    ) -> LineageResult<PartialGraph> {
        let focus = match self.resolve(id) {
            Some(ElementRef::DataObject(node)) => Focus::DataObject(node.id().clone()),
            Some(ElementRef::Action(action)) => Focus::Action(action.id().clone()),
            None => return Err(LineageError::UnknownElement(id.to_string())),
        };
        self.partial_graph(&focus, options)
    }

    /// Transitive upstream and downstream lineage of an id
    pub fn lineage(&self, id: &str) -> LineageResult<PartialGraph> {
        self.partial_graph_for(id, &ExtractOptions::transitive())
    }

    /// Direct producers and consumers of an id
    pub fn direct_neighbours(&self, id: &str) -> LineageResult<PartialGraph> {
        self.partial_graph_for(id, &ExtractOptions::direct_neighbours())
    }

    /// Breadth-first traversal from all seeds; returns every node reached
    fn traverse<'a>(
        &'a self,
        seeds: &[&'a DataObjectId],
        direction: Direction,
        depth: TraversalDepth,
        edges: &mut BTreeSet<usize>,
    ) -> HashSet<&'a DataObjectId> {
        let mut visited: HashSet<&DataObjectId> = seeds.iter().copied().collect();
        let mut queue: VecDeque<(&DataObjectId, usize)> =
            seeds.iter().map(|seed| (*seed, 0)).collect();

        while let Some((current, distance)) = queue.pop_front() {
            if !depth.expands(distance) {
                continue;
            }
            let adjacent = match direction {
                Direction::Upstream => self.incoming_edges(current.as_str()),
                Direction::Downstream => self.outgoing_edges(current.as_str()),
            };
            for &index in adjacent {
                let Some(edge) = self.edge(index) else {
                    continue;
                };
                edges.insert(index);
                let next = match direction {
                    Direction::Upstream => &edge.source,
                    Direction::Downstream => &edge.target,
                };
                if visited.insert(next) {
                    queue.push_back((next, distance + 1));
                }
            }
        }

        visited
    }
}
