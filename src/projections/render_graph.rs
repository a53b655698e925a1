//! Render-ready projection of a lineage graph
//!
//! Flattens a full or partial lineage graph into the node and edge lists a drawing
//! layer consumes, and exports the same lists as Mermaid or GraphViz DOT text.

use crate::aggregate::LineageGraph;
use crate::queries::PartialGraph;
use crate::value_objects::{EdgeKind, LayoutDirection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A node handed to the drawing layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    /// Data object id
    pub id: String,
    /// Whether this is the focused data object
    pub is_center_node: bool,
    /// Layout level, if levels were assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Value of the data object's `type` attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// An edge handed to the drawing layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    /// Unique edge id, `source->action->target`
    ///
    /// Several edges share an action, so the action id itself is carried in
    /// [`RenderEdge::action_id`].
    pub id: String,
    /// Source data object id
    pub source: String,
    /// Target data object id
    pub target: String,
    /// Action the edge belongs to
    pub action_id: String,
    /// Whether the edge belongs to the focused action
    pub is_central: bool,
    /// Regular or recursive edge
    pub kind: EdgeKind,
}

/// Node and edge lists ready for an external layout engine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderGraph {
    /// Nodes in graph order
    pub nodes: Vec<RenderNode>,
    /// Edges in graph order
    pub edges: Vec<RenderEdge>,
    /// Direction the layout should flow in
    pub direction: LayoutDirection,
}

impl RenderGraph {
    /// Project the whole lineage graph
    pub fn full(graph: &LineageGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| RenderNode {
                id: node.id().to_string(),
                is_center_node: false,
                level: node.level(),
                type_name: node.type_name().map(str::to_string),
            })
            .collect();
        let edges = (0..graph.edge_count())
            .filter_map(|index| render_edge(graph, index, false))
            .collect();

        Self {
            nodes,
            edges,
            direction: LayoutDirection::default(),
        }
    }

    /// Project a partial graph, tagging the center node and central edges
    pub fn partial(graph: &LineageGraph, partial: &PartialGraph) -> Self {
        let nodes = partial
            .nodes
            .iter()
            .filter_map(|id| graph.node(id.as_str()))
            .map(|node| RenderNode {
                id: node.id().to_string(),
                is_center_node: partial.is_center_node(node.id().as_str()),
                level: node.level(),
                type_name: node.type_name().map(str::to_string),
            })
            .collect();
        let edges = partial
            .edges
            .iter()
            .filter_map(|&index| {
                render_edge(graph, index, partial.is_central_edge(graph, index))
            })
            .collect();

        Self {
            nodes,
            edges,
            direction: LayoutDirection::default(),
        }
    }

    /// Set the layout direction
    pub fn with_direction(mut self, direction: LayoutDirection) -> Self {
        self.direction = direction;
        self
    }

    /// The focused data object, if any
    pub fn center_node(&self) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.is_center_node)
    }

    /// Generate Mermaid diagram
    pub fn to_mermaid(&self) -> String {
        Mermaid(self).to_string()
    }

    /// Generate GraphViz DOT format
    pub fn to_dot(&self) -> String {
        Dot(self).to_string()
    }

    /// Position of a node id in the node list, used for generated identifiers
    fn node_position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }
}

fn render_edge(graph: &LineageGraph, index: usize, is_central: bool) -> Option<RenderEdge> {
    let edge = graph.edge(index)?;
    let mut id = format!("{}->{}->{}", edge.source, edge.action_id, edge.target);
    if edge.kind == EdgeKind::Recursive {
        id.push_str("#recursive");
    }
    Some(RenderEdge {
        id,
        source: edge.source.to_string(),
        target: edge.target.to_string(),
        action_id: edge.action_id.to_string(),
        is_central,
        kind: edge.kind,
    })
}

struct Mermaid<'a>(&'a RenderGraph);

impl fmt::Display for Mermaid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        writeln!(f, "graph {}", graph.direction)?;
        writeln!(f, "    classDef center fill:#f9f,stroke:#333,stroke-width:4px;")?;
        writeln!(f)?;

        // Ids are arbitrary strings, so nodes get positional identifiers
        for (position, node) in graph.nodes.iter().enumerate() {
            writeln!(f, "    n{}[\"{}\"]", position, mermaid_label(&node.id))?;
        }
        writeln!(f)?;

        let mut central_links = Vec::new();
        let mut link = 0;
        for edge in &graph.edges {
            let (Some(source), Some(target)) = (
                graph.node_position(&edge.source),
                graph.node_position(&edge.target),
            ) else {
                continue;
            };
            let arrow = match edge.kind {
                EdgeKind::Transform => "-->",
                EdgeKind::Recursive => "-.->",
            };
            writeln!(
                f,
                "    n{} {}|{}| n{}",
                source,
                arrow,
                mermaid_label(&edge.action_id),
                target
            )?;
            if edge.is_central {
                central_links.push(link);
            }
            link += 1;
        }

        if let Some(center) = graph.nodes.iter().position(|node| node.is_center_node) {
            writeln!(f)?;
            writeln!(f, "    class n{} center;", center)?;
        }
        for link in central_links {
            writeln!(f, "    linkStyle {} stroke:#e33,stroke-width:3px;", link)?;
        }

        Ok(())
    }
}

fn mermaid_label(text: &str) -> String {
    text.replace('"', "#quot;")
}

struct Dot<'a>(&'a RenderGraph);

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        writeln!(f, "digraph Lineage {{")?;
        writeln!(f, "    rankdir={};", graph.direction)?;
        writeln!(f, "    node [shape=box];")?;
        writeln!(f)?;

        let mut ranks: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for node in &graph.nodes {
            if node.is_center_node {
                writeln!(
                    f,
                    "    \"{}\" [style=filled fillcolor=lightpink penwidth=2];",
                    dot_escape(&node.id)
                )?;
            } else {
                writeln!(f, "    \"{}\";", dot_escape(&node.id))?;
            }
            if let Some(level) = node.level {
                ranks.entry(level).or_default().push(&node.id);
            }
        }

        for nodes in ranks.values().filter(|nodes| nodes.len() > 1) {
            let members: Vec<String> = nodes
                .iter()
                .map(|id| format!("\"{}\"", dot_escape(id)))
                .collect();
            writeln!(f, "    {{ rank=same; {} }}", members.join("; "))?;
        }
        writeln!(f)?;

        for edge in &graph.edges {
            let mut style = Vec::new();
            if edge.kind == EdgeKind::Recursive {
                style.push("style=dashed");
            }
            if edge.is_central {
                style.push("color=red penwidth=2");
            }
            let style = if style.is_empty() {
                String::new()
            } else {
                format!(" {}", style.join(" "))
            };
            writeln!(
                f,
                "    \"{}\" -> \"{}\" [label=\"{}\"{}];",
                dot_escape(&edge.source),
                dot_escape(&edge.target),
                dot_escape(&edge.action_id),
                style
            )?;
        }

        writeln!(f, "}}")
    }
}

fn dot_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
