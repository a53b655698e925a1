//! Lineage errors
//!
//! Graph construction accumulates these instead of failing on the first broken
//! entity, so callers can render a best-effort graph next to the diagnostics.

use crate::value_objects::{ActionId, DataObjectId};
use serde::Serialize;
use std::fmt;

/// Which side of an action a reference was declared on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceRole {
    /// Declared through `inputId`, `inputIds` or `mlflowId`
    Input,
    /// Declared through `outputId`, `outputIds` or `mlflowId`
    Output,
    /// Declared through `recursiveInputIds`
    RecursiveInput,
}

impl fmt::Display for ReferenceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceRole::Input => f.write_str("input"),
            ReferenceRole::Output => f.write_str("output"),
            ReferenceRole::RecursiveInput => f.write_str("recursive input"),
        }
    }
}

/// Errors raised while building or querying a lineage graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineageError {
    #[error("Action {action_id} references unknown data object {data_object_id} as {role}")]
    DanglingReference {
        action_id: ActionId,
        data_object_id: DataObjectId,
        role: ReferenceRole,
    },

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Malformed action {action_id}: {reason}")]
    MalformedAction { action_id: ActionId, reason: String },
}

impl LineageError {
    /// Action the error belongs to, if any
    pub fn action_id(&self) -> Option<&ActionId> {
        match self {
            LineageError::DanglingReference { action_id, .. }
            | LineageError::MalformedAction { action_id, .. } => Some(action_id),
            LineageError::UnknownElement(_) => None,
        }
    }
}

/// Result type for lineage operations
pub type LineageResult<T> = Result<T, LineageError>;

/// All errors collected during a graph build, returned by strict callers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} configuration error(s), first: {}", .0.len(), first_message(.0))]
pub struct BuildErrors(pub Vec<LineageError>);

fn first_message(errors: &[LineageError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

impl BuildErrors {
    /// Iterate over the collected errors
    pub fn iter(&self) -> impl Iterator<Item = &LineageError> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_reference_message() {
        let error = LineageError::DanglingReference {
            action_id: ActionId::from("t1"),
            data_object_id: DataObjectId::from("z"),
            role: ReferenceRole::Output,
        };
        assert_eq!(
            error.to_string(),
            "Action t1 references unknown data object z as output"
        );
        assert_eq!(error.action_id(), Some(&ActionId::from("t1")));
    }

    #[test]
    fn test_build_errors_summarizes_first_error() {
        let errors = BuildErrors(vec![
            LineageError::UnknownElement("x".to_string()),
            LineageError::UnknownElement("y".to_string()),
        ]);
        assert_eq!(
            errors.to_string(),
            "2 configuration error(s), first: Unknown element: x"
        );
    }
}
