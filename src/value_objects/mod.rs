//! Lineage value objects
//!
//! Value objects are immutable types that represent concepts in the lineage domain.
//! They are compared by value rather than identity and encapsulate domain validation.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Identifier of a data object, the key under `dataObjects` in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataObjectId(String);

impl DataObjectId {
    /// Create a new data object id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of an action, the key under `actions` in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Create a new action id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_id_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id_impls!(DataObjectId);
string_id_impls!(ActionId);

/// Kinds of elements found in a pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementType {
    /// A named data asset, rendered as a graph node
    DataObject,
    /// A transformation with declared inputs and outputs, rendered as edges
    Action,
    /// Connection settings shared by data objects
    Connection,
    /// Options from the `global` section
    GlobalOption,
}

impl ElementType {
    /// All element types in configuration order
    pub const ALL: [ElementType; 4] = [
        ElementType::DataObject,
        ElementType::Action,
        ElementType::Connection,
        ElementType::GlobalOption,
    ];

    /// Top-level configuration key holding elements of this type
    pub fn config_key(&self) -> &'static str {
        match self {
            ElementType::DataObject => "dataObjects",
            ElementType::Action => "actions",
            ElementType::Connection => "connections",
            ElementType::GlobalOption => "global",
        }
    }

    /// Whether elements of this type take part in the lineage graph
    pub fn is_lineage_element(&self) -> bool {
        match self {
            ElementType::DataObject | ElementType::Action => true,
            ElementType::Connection | ElementType::GlobalOption => false,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Error returned when parsing an unknown element type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown element type: {0}")]
pub struct UnknownElementType(pub String);

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dataObjects" | "dataObject" => Ok(ElementType::DataObject),
            "actions" | "action" => Ok(ElementType::Action),
            "connections" | "connection" => Ok(ElementType::Connection),
            "global" | "globalOptions" => Ok(ElementType::GlobalOption),
            other => Err(UnknownElementType(other.to_string())),
        }
    }
}

/// Inputs or outputs declared by an action
///
/// Resolved once from the `inputId`/`inputIds` (or `outputId`/`outputIds`) attributes
/// when the action is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActionIo {
    /// Exactly one data object
    Single {
        /// The referenced data object
        id: DataObjectId,
    },
    /// Any number of data objects
    Multiple {
        /// The referenced data objects in declaration order
        ids: Vec<DataObjectId>,
    },
}

impl ActionIo {
    /// Create a single reference
    pub fn single(id: impl Into<DataObjectId>) -> Self {
        ActionIo::Single { id: id.into() }
    }

    /// Create a list of references
    pub fn multiple<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DataObjectId>,
    {
        ActionIo::Multiple {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Iterate over the referenced ids
    pub fn ids(&self) -> impl Iterator<Item = &DataObjectId> {
        let slice: &[DataObjectId] = match self {
            ActionIo::Single { id } => std::slice::from_ref(id),
            ActionIo::Multiple { ids } => ids,
        };
        slice.iter()
    }

    /// Number of referenced ids
    pub fn len(&self) -> usize {
        match self {
            ActionIo::Single { .. } => 1,
            ActionIo::Multiple { ids } => ids.len(),
        }
    }

    /// Whether no id is referenced
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the given id is referenced
    pub fn contains(&self, id: &str) -> bool {
        self.ids().any(|candidate| candidate.as_str() == id)
    }

    /// Append a reference, turning a single reference into a list
    pub fn push(&mut self, extra: DataObjectId) {
        match self {
            ActionIo::Single { id } => {
                let first = id.clone();
                *self = ActionIo::Multiple {
                    ids: vec![first, extra],
                };
            }
            ActionIo::Multiple { ids } => ids.push(extra),
        }
    }
}

/// Origin of a lineage edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Input to output of an action
    Transform,
    /// Output read back by the same action through `recursiveInputIds`
    Recursive,
}

impl Default for EdgeKind {
    fn default() -> Self {
        EdgeKind::Transform
    }
}

/// Direction in which a rendered graph flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutDirection {
    /// Sources at the top
    #[serde(rename = "TB")]
    TopBottom,
    /// Sources on the left
    #[serde(rename = "LR")]
    LeftRight,
}

impl LayoutDirection {
    /// Get the short form used by layout engines
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutDirection::TopBottom => "TB",
            LayoutDirection::LeftRight => "LR",
        }
    }
}

impl Default for LayoutDirection {
    fn default() -> Self {
        LayoutDirection::TopBottom
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TB" => Ok(LayoutDirection::TopBottom),
            "LR" => Ok(LayoutDirection::LeftRight),
            _ => Err(format!("layout {s} is not supported, use 'TB' or 'LR'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_round_trips_config_key() {
        for element_type in ElementType::ALL {
            let parsed: ElementType = element_type.config_key().parse().unwrap();
            assert_eq!(parsed, element_type);
        }
        assert!("workflows".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_only_data_objects_and_actions_are_lineage_elements() {
        assert!(ElementType::DataObject.is_lineage_element());
        assert!(ElementType::Action.is_lineage_element());
        assert!(!ElementType::Connection.is_lineage_element());
        assert!(!ElementType::GlobalOption.is_lineage_element());
    }

    #[test]
    fn test_action_io_push_grows_single_into_multiple() {
        let mut io = ActionIo::single("a");
        assert_eq!(io.len(), 1);

        io.push(DataObjectId::from("b"));
        assert_eq!(io, ActionIo::multiple(["a", "b"]));
        assert!(io.contains("b"));
        assert!(!io.contains("c"));
    }

    #[test]
    fn test_action_io_serializes_as_tagged_union() {
        let single = serde_json::to_value(ActionIo::single("a")).unwrap();
        assert_eq!(single, serde_json::json!({"kind": "single", "id": "a"}));

        let multiple = serde_json::to_value(ActionIo::multiple(["a", "b"])).unwrap();
        assert_eq!(
            multiple,
            serde_json::json!({"kind": "multiple", "ids": ["a", "b"]})
        );
    }

    #[test]
    fn test_layout_direction_parsing() {
        assert_eq!("lr".parse::<LayoutDirection>(), Ok(LayoutDirection::LeftRight));
        assert_eq!("TB".parse::<LayoutDirection>(), Ok(LayoutDirection::TopBottom));
        assert!("RL".parse::<LayoutDirection>().is_err());
    }
}
