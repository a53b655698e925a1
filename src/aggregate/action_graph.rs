//! Action-centric view of a lineage graph
//!
//! Actions become the nodes; two actions are linked when a data object written by
//! the first is read by the second.

use super::lineage_graph::LineageGraph;
use crate::value_objects::{ActionId, DataObjectId, EdgeKind};
use indexmap::IndexSet;
use serde::Serialize;

/// Link between two actions through a shared data object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActionLink {
    /// Action producing the data object
    pub from: ActionId,
    /// Action consuming the data object
    pub to: ActionId,
    /// The data object in between
    pub via: DataObjectId,
}

/// Graph whose nodes are actions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionGraph {
    /// Actions in configuration order
    pub actions: Vec<ActionId>,
    /// Producer/consumer links, each (from, to, via) once
    pub links: Vec<ActionLink>,
}

impl ActionGraph {
    /// Actions that consume something `id` produces
    pub fn successors(&self, id: &str) -> Vec<&ActionId> {
        let mut successors: IndexSet<&ActionId> = IndexSet::new();
        for link in self.links.iter().filter(|link| link.from.as_str() == id) {
            successors.insert(&link.to);
        }
        successors.into_iter().collect()
    }

    /// Actions that produce something `id` consumes
    pub fn predecessors(&self, id: &str) -> Vec<&ActionId> {
        let mut predecessors: IndexSet<&ActionId> = IndexSet::new();
        for link in self.links.iter().filter(|link| link.to.as_str() == id) {
            predecessors.insert(&link.from);
        }
        predecessors.into_iter().collect()
    }
}

impl LineageGraph {
    /// Derive the action graph
    ///
    /// Recursive edges and an action reading its own output do not create links.
    pub fn action_graph(&self) -> ActionGraph {
        let mut links: IndexSet<ActionLink> = IndexSet::new();

        for node in self.nodes() {
            let id = node.id().as_str();
            let producers = self.distinct_actions(self.incoming_edges(id));
            let consumers = self.distinct_actions(self.outgoing_edges(id));

            for producer in &producers {
                for consumer in consumers.iter().filter(|consumer| *consumer != producer) {
                    links.insert(ActionLink {
                        from: (*producer).clone(),
                        to: (*consumer).clone(),
                        via: node.id().clone(),
                    });
                }
            }
        }

        ActionGraph {
            actions: self.actions().map(|action| action.id().clone()).collect(),
            links: links.into_iter().collect(),
        }
    }

    fn distinct_actions(&self, edge_indices: &[usize]) -> IndexSet<&ActionId> {
        edge_indices
            .iter()
            .filter_map(|index| self.edge(*index))
            .filter(|edge| edge.kind == EdgeKind::Transform)
            .map(|edge| &edge.action_id)
            .collect()
    }
}
