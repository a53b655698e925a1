//! Graph construction from a configuration
//!
//! Turns the `dataObjects` and `actions` sections into a [`LineageGraph`]. Broken
//! actions never abort the build: every problem is collected and returned next to
//! the best-effort graph.

use super::lineage_graph::{Action, DataObject, LineageEdge, LineageGraph};
use crate::config::ConfigData;
use crate::errors::{BuildErrors, LineageError, ReferenceRole};
use crate::layout::assign_levels;
use crate::value_objects::{DataObjectId, EdgeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Options for graph construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
    /// Emit an edge for every `recursiveInputIds` entry
    pub include_recursive_edges: bool,
    /// Run level assignment and store the level on each data object
    pub assign_levels: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_recursive_edges: false,
            assign_levels: true,
        }
    }
}

/// Result of a graph build: the graph plus every error encountered
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Graph without the edges that could not be resolved
    pub graph: LineageGraph,
    /// Errors in configuration order
    pub errors: Vec<LineageError>,
}

impl BuildOutcome {
    /// Whether the configuration built without any error
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn any collected error into a failure
    pub fn into_result(self) -> Result<LineageGraph, BuildErrors> {
        if self.errors.is_empty() {
            Ok(self.graph)
        } else {
            Err(BuildErrors(self.errors))
        }
    }
}

/// Builds lineage graphs from configurations
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    options: BuildOptions,
}

impl GraphBuilder {
    /// Create a builder with the given options
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Get the builder options
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the lineage graph of a configuration
    pub fn build(&self, config: &ConfigData) -> BuildOutcome {
        let mut graph = LineageGraph::default();
        let mut errors = Vec::new();

        for (id, raw_config) in &config.data_objects {
            graph.insert_node(DataObject::new(DataObjectId::from(id.as_str()), raw_config.clone()));
        }

        for (id, raw_config) in &config.actions {
            let action = match Action::from_config(id, raw_config) {
                Ok(action) => action,
                Err(error) => {
                    warn!(%error, "Skipping action");
                    errors.push(error);
                    continue;
                }
            };

            self.add_action_edges(&mut graph, &action, &mut errors);
            graph.insert_action(action);
        }

        if self.options.assign_levels {
            let levels = assign_levels(&graph);
            graph.apply_levels(&levels);
        }

        debug!(
            nodes = graph.node_count(),
            actions = graph.action_count(),
            edges = graph.edge_count(),
            errors = errors.len(),
            "Built lineage graph"
        );

        BuildOutcome { graph, errors }
    }

    fn add_action_edges(
        &self,
        graph: &mut LineageGraph,
        action: &Action,
        errors: &mut Vec<LineageError>,
    ) {
        let mut reported: HashSet<(DataObjectId, ReferenceRole)> = HashSet::new();
        let mut report = |id: &DataObjectId, role: ReferenceRole| {
            if graph.contains_node(id.as_str()) {
                return true;
            }
            if reported.insert((id.clone(), role)) {
                let error = LineageError::DanglingReference {
                    action_id: action.id().clone(),
                    data_object_id: id.clone(),
                    role,
                };
                warn!(%error, "Omitting edges of dangling reference");
                errors.push(error);
            }
            false
        };

        let inputs: Vec<&DataObjectId> = action
            .inputs()
            .ids()
            .filter(|id| report(*id, ReferenceRole::Input))
            .collect();
        let outputs: Vec<&DataObjectId> = action
            .outputs()
            .ids()
            .filter(|id| report(*id, ReferenceRole::Output))
            .collect();
        let recursive_inputs: Vec<&DataObjectId> = if self.options.include_recursive_edges {
            action
                .recursive_inputs()
                .iter()
                .filter(|id| report(*id, ReferenceRole::RecursiveInput))
                .collect()
        } else {
            Vec::new()
        };

        let mut emitted: HashSet<(&DataObjectId, &DataObjectId, EdgeKind)> = HashSet::new();
        let pairs = inputs
            .iter()
            .map(|input| (*input, EdgeKind::Transform))
            .chain(
                recursive_inputs
                    .iter()
                    .map(|input| (*input, EdgeKind::Recursive)),
            );

        for (source, kind) in pairs {
            for &target in &outputs {
                if emitted.insert((source, target, kind)) {
                    graph.push_edge(LineageEdge {
                        action_id: action.id().clone(),
                        source: source.clone(),
                        target: target.clone(),
                        kind,
                    });
                }
            }
        }
    }
}

impl LineageGraph {
    /// Build a graph with default options
    pub fn from_config(config: &ConfigData) -> BuildOutcome {
        GraphBuilder::default().build(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ConfigData {
        ConfigData::from_value(value).unwrap()
    }

    #[test]
    fn test_nodes_match_data_objects() {
        let outcome = LineageGraph::from_config(&config(json!({
            "dataObjects": {"a": {}, "b": {}, "orphan": {}},
            "actions": {"t1": {"inputId": "a", "outputId": "b"}},
        })));

        assert!(outcome.is_clean());
        assert_eq!(outcome.graph.node_count(), 3);
        assert_eq!(outcome.graph.edge_count(), 1);
        assert_eq!(outcome.graph.action_count(), 1);
    }

    #[test]
    fn test_multi_io_action_expands_to_cross_product() {
        let outcome = LineageGraph::from_config(&config(json!({
            "dataObjects": {"a": {}, "b": {}, "c": {}, "x": {}, "y": {}},
            "actions": {"join": {"inputIds": ["a", "b", "c"], "outputIds": ["x", "y"]}},
        })));

        let graph = outcome.graph;
        assert_eq!(graph.edge_count(), 6);
        assert!(graph.edges().iter().all(|edge| edge.action_id.as_str() == "join"));
        assert_eq!(graph.edges_of_action("join").len(), 6);
    }

    #[test]
    fn test_duplicate_references_emit_one_edge() {
        let outcome = LineageGraph::from_config(&config(json!({
            "dataObjects": {"a": {}, "b": {}},
            "actions": {"t1": {"inputIds": ["a", "a"], "outputId": "b"}},
        })));
        assert_eq!(outcome.graph.edge_count(), 1);
    }

    #[test]
    fn test_dangling_reference_is_reported_and_edge_omitted() {
        let outcome = LineageGraph::from_config(&config(json!({
            "dataObjects": {"a": {}, "b": {}},
            "actions": {"t1": {"inputIds": ["a", "z"], "outputId": "b"}},
        })));

        assert_eq!(
            outcome.errors,
            vec![LineageError::DanglingReference {
                action_id: "t1".into(),
                data_object_id: "z".into(),
                role: ReferenceRole::Input,
            }]
        );
        assert_eq!(outcome.graph.edge_count(), 1);
        assert_eq!(outcome.graph.edges()[0].source.as_str(), "a");
        assert!(outcome.graph.contains_action("t1"));
    }

    #[test]
    fn test_malformed_action_does_not_abort_build() {
        let outcome = LineageGraph::from_config(&config(json!({
            "dataObjects": {"a": {}, "b": {}},
            "actions": {
                "broken": {"type": "CopyAction"},
                "t1": {"inputId": "a", "outputId": "b"},
            },
        })));

        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(
            &outcome.errors[0],
            LineageError::MalformedAction { action_id, .. } if action_id.as_str() == "broken"
        ));
        assert!(!outcome.graph.contains_action("broken"));
        assert_eq!(outcome.graph.edge_count(), 1);
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_recursive_edges_are_opt_in() {
        let config = config(json!({
            "dataObjects": {"stg": {}, "int": {}},
            "actions": {"hist": {"inputId": "stg", "outputId": "int", "recursiveInputIds": ["int"]}},
        }));

        let default = GraphBuilder::default().build(&config);
        assert_eq!(default.graph.edge_count(), 1);

        let with_recursive = GraphBuilder::new(BuildOptions {
            include_recursive_edges: true,
            ..BuildOptions::default()
        })
        .build(&config);
        assert!(with_recursive.is_clean());
        assert_eq!(with_recursive.graph.edge_count(), 2);
        let recursive = &with_recursive.graph.edges()[1];
        assert_eq!(recursive.kind, EdgeKind::Recursive);
        assert_eq!(recursive.source, recursive.target);
    }

    #[test]
    fn test_levels_are_assigned_during_build() {
        let outcome = LineageGraph::from_config(&config(json!({
            "dataObjects": {"a": {}, "b": {}, "c": {}},
            "actions": {
                "t1": {"inputId": "a", "outputId": "b"},
                "t2": {"inputId": "b", "outputId": "c"},
            },
        })));
        let levels: Vec<Option<u32>> = outcome.graph.nodes().map(DataObject::level).collect();
        assert_eq!(levels, vec![Some(0), Some(1), Some(2)]);

        let unlevelled = GraphBuilder::new(BuildOptions {
            assign_levels: false,
            ..BuildOptions::default()
        })
        .build(&ConfigData::from_value(json!({"dataObjects": {"a": {}}})).unwrap());
        assert_eq!(unlevelled.graph.node("a").and_then(DataObject::level), None);
    }
}
