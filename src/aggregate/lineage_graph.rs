//! Lineage Graph Aggregate
//!
//! Data objects are the nodes of the lineage graph and actions are its edges. An
//! action with several inputs or outputs contributes one edge per (input, output)
//! pair, every one of them tagged with the action id.

use crate::errors::{LineageError, LineageResult};
use crate::layout::Levels;
use crate::value_objects::{ActionId, ActionIo, DataObjectId, EdgeKind, ElementType};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

const MLFLOW_PREDICT_ACTION: &str = "MLflowPredictAction";
const MLFLOW_TRAIN_ACTION: &str = "MLflowTrainAction";

/// A data asset declared under `dataObjects`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataObject {
    id: DataObjectId,
    raw_config: Value,
    level: Option<u32>,
}

impl DataObject {
    pub(crate) fn new(id: DataObjectId, raw_config: Value) -> Self {
        Self {
            id,
            raw_config,
            level: None,
        }
    }

    /// Configuration key of the data object
    pub fn id(&self) -> &DataObjectId {
        &self.id
    }

    /// Attributes as written in the configuration
    pub fn raw_config(&self) -> &Value {
        &self.raw_config
    }

    /// Layout level, set when levels were assigned during the build
    pub fn level(&self) -> Option<u32> {
        self.level
    }

    /// Value of the `type` attribute
    pub fn type_name(&self) -> Option<&str> {
        self.raw_config.get("type").and_then(Value::as_str)
    }
}

/// A transformation declared under `actions`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    id: ActionId,
    inputs: ActionIo,
    outputs: ActionIo,
    recursive_inputs: Vec<DataObjectId>,
    action_type: Option<String>,
    raw_config: Value,
}

impl Action {
    /// Resolve an action from its configuration entry
    ///
    /// Inputs are the union of `inputIds` and `inputId`, outputs the union of
    /// `outputIds` and `outputId`. MLflow actions declare their model through
    /// `mlflowId`, which is an input for prediction and an output for training.
    pub fn from_config(id: &str, raw_config: &Value) -> LineageResult<Self> {
        let action_id = ActionId::from(id);
        let Some(attributes) = raw_config.as_object() else {
            return Err(malformed(&action_id, "action attributes must be an object"));
        };

        let action_type = attributes
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut inputs = read_io(&action_id, attributes, "inputIds", "inputId")?;
        let mut outputs = read_io(&action_id, attributes, "outputIds", "outputId")?;

        match action_type.as_deref() {
            Some(MLFLOW_PREDICT_ACTION) => {
                append_mlflow_id(&action_id, attributes, &mut inputs)?;
            }
            Some(MLFLOW_TRAIN_ACTION) => {
                append_mlflow_id(&action_id, attributes, &mut outputs)?;
            }
            _ => {}
        }

        let inputs = inputs.ok_or_else(|| {
            malformed(&action_id, "declares neither inputId nor inputIds")
        })?;
        let outputs = outputs.ok_or_else(|| {
            malformed(&action_id, "declares neither outputId nor outputIds")
        })?;
        let recursive_inputs = match attributes.get("recursiveInputIds") {
            Some(value) => read_id_list(&action_id, "recursiveInputIds", value)?,
            None => Vec::new(),
        };

        Ok(Self {
            id: action_id,
            inputs,
            outputs,
            recursive_inputs,
            action_type,
            raw_config: raw_config.clone(),
        })
    }

    /// Configuration key of the action
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    /// Data objects read by the action
    pub fn inputs(&self) -> &ActionIo {
        &self.inputs
    }

    /// Data objects written by the action
    pub fn outputs(&self) -> &ActionIo {
        &self.outputs
    }

    /// Outputs the action reads back from a previous run
    pub fn recursive_inputs(&self) -> &[DataObjectId] {
        &self.recursive_inputs
    }

    /// Value of the `type` attribute
    pub fn action_type(&self) -> Option<&str> {
        self.action_type.as_deref()
    }

    /// Attributes as written in the configuration
    pub fn raw_config(&self) -> &Value {
        &self.raw_config
    }
}

fn malformed(action_id: &ActionId, reason: &str) -> LineageError {
    LineageError::MalformedAction {
        action_id: action_id.clone(),
        reason: reason.to_string(),
    }
}

fn read_io(
    action_id: &ActionId,
    attributes: &Map<String, Value>,
    plural: &str,
    singular: &str,
) -> LineageResult<Option<ActionIo>> {
    let many = attributes
        .get(plural)
        .map(|value| read_id_list(action_id, plural, value))
        .transpose()?;
    let one = attributes
        .get(singular)
        .map(|value| read_id(action_id, singular, value))
        .transpose()?;

    Ok(match (many, one) {
        (Some(ids), Some(id)) => {
            let mut io = ActionIo::Multiple { ids };
            io.push(id);
            Some(io)
        }
        (Some(ids), None) => Some(ActionIo::Multiple { ids }),
        (None, Some(id)) => Some(ActionIo::Single { id }),
        (None, None) => None,
    })
}

fn read_id(action_id: &ActionId, field: &str, value: &Value) -> LineageResult<DataObjectId> {
    value
        .as_str()
        .map(DataObjectId::from)
        .ok_or_else(|| malformed(action_id, &format!("{field} must be a string")))
}

fn read_id_list(
    action_id: &ActionId,
    field: &str,
    value: &Value,
) -> LineageResult<Vec<DataObjectId>> {
    let Some(items) = value.as_array() else {
        return Err(malformed(action_id, &format!("{field} must be a list of ids")));
    };
    items
        .iter()
        .map(|item| read_id(action_id, field, item))
        .collect()
}

fn append_mlflow_id(
    action_id: &ActionId,
    attributes: &Map<String, Value>,
    io: &mut Option<ActionIo>,
) -> LineageResult<()> {
    let Some(value) = attributes.get("mlflowId") else {
        return Ok(());
    };
    let id = read_id(action_id, "mlflowId", value)?;
    match io {
        Some(existing) => existing.push(id),
        None => *io = Some(ActionIo::Single { id }),
    }
    Ok(())
}

/// One (input, output) pair of an action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEdge {
    /// Action the edge belongs to; not unique across edges
    pub action_id: ActionId,
    /// Data object read by the action
    pub source: DataObjectId,
    /// Data object written by the action
    pub target: DataObjectId,
    /// Whether the edge comes from a regular or a recursive input
    pub kind: EdgeKind,
}

/// Reference to a graph element resolved from a plain id
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementRef<'a> {
    DataObject(&'a DataObject),
    Action(&'a Action),
}

impl ElementRef<'_> {
    /// Element type of the referenced element
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementRef::DataObject(_) => ElementType::DataObject,
            ElementRef::Action(_) => ElementType::Action,
        }
    }
}

/// The lineage graph of a configuration
///
/// Built once by [`crate::GraphBuilder`] and read-only afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LineageGraph {
    nodes: IndexMap<DataObjectId, DataObject>,
    actions: IndexMap<ActionId, Action>,
    edges: Vec<LineageEdge>,
    #[serde(skip)]
    incoming: HashMap<DataObjectId, Vec<usize>>,
    #[serde(skip)]
    outgoing: HashMap<DataObjectId, Vec<usize>>,
    #[serde(skip)]
    edges_by_action: HashMap<ActionId, Vec<usize>>,
}

impl LineageGraph {
    pub(crate) fn insert_node(&mut self, node: DataObject) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn insert_action(&mut self, action: Action) {
        self.actions.insert(action.id.clone(), action);
    }

    /// Add an edge; both endpoints must already be nodes
    pub(crate) fn push_edge(&mut self, edge: LineageEdge) {
        debug_assert!(self.nodes.contains_key(&edge.source));
        debug_assert!(self.nodes.contains_key(&edge.target));

        let index = self.edges.len();
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(index);
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(index);
        self.edges_by_action
            .entry(edge.action_id.clone())
            .or_default()
            .push(index);
        self.edges.push(edge);
    }

    pub(crate) fn apply_levels(&mut self, levels: &Levels) {
        for (id, node) in self.nodes.iter_mut() {
            node.level = levels.level(id.as_str());
        }
    }

    /// Get a data object by id
    pub fn node(&self, id: &str) -> Option<&DataObject> {
        self.nodes.get(id)
    }

    /// Get an action by id
    pub fn action(&self, id: &str) -> Option<&Action> {
        self.actions.get(id)
    }

    /// Resolve an id, trying data objects first and actions second
    pub fn resolve(&self, id: &str) -> Option<ElementRef<'_>> {
        self.node(id)
            .map(ElementRef::DataObject)
            .or_else(|| self.action(id).map(ElementRef::Action))
    }

    /// All data objects in configuration order
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &DataObject> {
        self.nodes.values()
    }

    /// All actions that could be resolved, in configuration order
    pub fn actions(&self) -> impl ExactSizeIterator<Item = &Action> {
        self.actions.values()
    }

    /// All edges
    pub fn edges(&self) -> &[LineageEdge] {
        &self.edges
    }

    /// Get an edge by index
    pub fn edge(&self, index: usize) -> Option<&LineageEdge> {
        self.edges.get(index)
    }

    /// Position of a data object in configuration order
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Indices of edges ending at a data object
    pub fn incoming_edges(&self, id: &str) -> &[usize] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Indices of edges starting at a data object
    pub fn outgoing_edges(&self, id: &str) -> &[usize] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Indices of all edges tagged with an action id
    pub fn edges_of_action(&self, id: &str) -> &[usize] {
        self.edges_by_action
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check if a data object exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Check if an action exists
    pub fn contains_action(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get action count
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Get source nodes (nodes with no incoming edges)
    pub fn source_nodes(&self) -> Vec<&DataObjectId> {
        self.nodes
            .keys()
            .filter(|id| self.incoming_edges(id.as_str()).is_empty())
            .collect()
    }

    /// Get sink nodes (nodes with no outgoing edges)
    pub fn sink_nodes(&self) -> Vec<&DataObjectId> {
        self.nodes
            .keys()
            .filter(|id| self.outgoing_edges(id.as_str()).is_empty())
            .collect()
    }
}
