//! Property tests for graph construction and extraction

use proptest::collection::vec;
use proptest::prelude::*;
use sdl_lineage_graph::{
    BuildOptions, ConfigData, ExtractOptions, GraphBuilder, LineageGraph, TraversalDepth,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

/// Actions as (inputs, outputs, recursive inputs), each a set of data object indices
type ActionShape = (BTreeSet<usize>, BTreeSet<usize>, BTreeSet<usize>);

fn arb_pipeline() -> impl Strategy<Value = (usize, Vec<ActionShape>)> {
    (1usize..10).prop_flat_map(|node_count| {
        // Set sizes never exceed the number of distinct ids available
        let ids = move || proptest::collection::btree_set(0..node_count, 1..=node_count.min(3));
        let recursive = proptest::collection::btree_set(0..node_count, 0..=1);
        (Just(node_count), vec((ids(), ids(), recursive), 0..8))
    })
}

fn build_config(node_count: usize, actions: &[ActionShape]) -> ConfigData {
    let mut data_objects = Map::new();
    for index in 0..node_count {
        data_objects.insert(format!("do-{index}"), json!({"type": "CsvFileDataObject"}));
    }

    let names = |indices: &BTreeSet<usize>| -> Vec<Value> {
        indices.iter().map(|index| json!(format!("do-{index}"))).collect()
    };
    let mut action_map = Map::new();
    for (index, (inputs, outputs, recursive)) in actions.iter().enumerate() {
        action_map.insert(
            format!("action-{index}"),
            json!({
                "type": "CopyAction",
                "inputIds": names(inputs),
                "outputIds": names(outputs),
                "recursiveInputIds": names(recursive),
            }),
        );
    }

    ConfigData::from_value(json!({
        "dataObjects": data_objects,
        "actions": action_map,
    }))
    .unwrap()
}

fn build(node_count: usize, actions: &[ActionShape]) -> LineageGraph {
    let outcome = GraphBuilder::new(BuildOptions {
        include_recursive_edges: true,
        ..BuildOptions::default()
    })
    .build(&build_config(node_count, actions));
    assert!(outcome.is_clean());
    outcome.graph
}

proptest! {
    #[test]
    fn test_nodes_match_data_objects((node_count, actions) in arb_pipeline()) {
        let graph = build(node_count, &actions);
        prop_assert_eq!(graph.node_count(), node_count);
        prop_assert_eq!(graph.action_count(), actions.len());
    }

    #[test]
    fn test_action_contributes_cross_product((node_count, actions) in arb_pipeline()) {
        let graph = build(node_count, &actions);
        let mut expected = 0;
        for (index, (inputs, outputs, recursive)) in actions.iter().enumerate() {
            let transform = inputs.len() * outputs.len();
            let recursive_only = recursive.len() * outputs.len();
            let action_id = format!("action-{}", index);
            let edges = graph.edges_of_action(&action_id).len();
            prop_assert!(edges <= transform + recursive_only);
            prop_assert!(edges >= transform);
            expected += transform + recursive_only;
        }
        prop_assert_eq!(graph.edge_count(), expected);
    }

    #[test]
    fn test_partial_graph_contains_focus((node_count, actions) in arb_pipeline(), pick in any::<prop::sample::Index>()) {
        let graph = build(node_count, &actions);
        let focus = format!("do-{}", pick.index(node_count));

        let partial = graph.lineage(&focus).unwrap();
        prop_assert!(partial.contains_node(&focus));
        prop_assert!(partial.is_center_node(&focus));
        for edge in partial.edges(&graph) {
            prop_assert!(partial.contains_node(edge.source.as_str()));
            prop_assert!(partial.contains_node(edge.target.as_str()));
        }
    }

    #[test]
    fn test_extraction_is_idempotent((node_count, actions) in arb_pipeline(), pick in any::<prop::sample::Index>()) {
        let graph = build(node_count, &actions);
        let focus = format!("do-{}", pick.index(node_count));

        let first = graph.lineage(&focus).unwrap();
        let second = graph.lineage(&focus).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_direct_neighbours_are_within_lineage((node_count, actions) in arb_pipeline(), pick in any::<prop::sample::Index>()) {
        let graph = build(node_count, &actions);
        let focus = format!("do-{}", pick.index(node_count));

        let lineage = graph.lineage(&focus).unwrap();
        let direct = graph.direct_neighbours(&focus).unwrap();
        for id in &direct.nodes {
            prop_assert!(lineage.contains_node(id.as_str()));
        }
        for index in &direct.edges {
            prop_assert!(lineage.contains_edge(*index));
        }

        let zero = ExtractOptions {
            upstream: TraversalDepth::Limited(0),
            downstream: TraversalDepth::Limited(0),
        };
        let alone = graph.partial_graph_for(&focus, &zero).unwrap();
        prop_assert_eq!(alone.node_count(), 1);
        prop_assert_eq!(alone.edge_count(), 0);
    }

    #[test]
    fn test_levels_respect_kept_edges((node_count, actions) in arb_pipeline()) {
        let graph = build(node_count, &actions);
        let levels = sdl_lineage_graph::assign_levels(&graph);

        prop_assert_eq!(levels.by_node.len(), node_count);
        prop_assert_eq!(levels.counts.iter().sum::<usize>(), node_count);
        for (index, edge) in graph.edges().iter().enumerate() {
            if levels.ignored_edges.contains(&index) {
                continue;
            }
            let source = levels.level(edge.source.as_str()).unwrap();
            let target = levels.level(edge.target.as_str()).unwrap();
            prop_assert!(target > source);
        }
        for id in graph.source_nodes() {
            prop_assert_eq!(levels.level(id.as_str()), Some(0));
        }
    }
}
