//! Pipeline configuration
//!
//! The configuration arrives already converted to JSON. Only the four top-level
//! sections are interpreted here; element attributes stay opaque `serde_json` values.

pub mod element_lists;
pub mod normalize;

pub use element_lists::{ElementEntry, ElementLists};
pub use normalize::normalize_keys;

use crate::value_objects::ElementType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors that can occur while loading or querying a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration root must be an object, found {0}")]
    NotAnObject(&'static str),

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Options controlling how raw configuration text is turned into [`ConfigData`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderOptions {
    /// Convert kebab-case attribute names to camelCase
    pub normalize_keys: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            normalize_keys: true,
        }
    }
}

/// The sections of a pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigData {
    /// Data objects by id
    pub data_objects: Map<String, Value>,
    /// Actions by id
    pub actions: Map<String, Value>,
    /// Connections by id
    pub connections: Map<String, Value>,
    /// Global options
    pub global: Map<String, Value>,
}

impl ConfigData {
    /// Build from an already parsed configuration value
    ///
    /// Missing sections, or sections that are not objects, are treated as empty.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        let mut root = match value {
            Value::Object(root) => root,
            other => return Err(ConfigError::NotAnObject(json_type_name(&other))),
        };

        let mut take = |key: &str| match root.remove(key) {
            Some(Value::Object(section)) => section,
            _ => Map::new(),
        };

        Ok(Self {
            data_objects: take(ElementType::DataObject.config_key()),
            actions: take(ElementType::Action.config_key()),
            connections: take(ElementType::Connection.config_key()),
            global: take(ElementType::GlobalOption.config_key()),
        })
    }

    /// Parse JSON text with default loader options
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        Self::from_json_str_with(text, &LoaderOptions::default())
    }

    /// Parse JSON text
    pub fn from_json_str_with(text: &str, options: &LoaderOptions) -> ConfigResult<Self> {
        let mut value: Value = serde_json::from_str(text)?;
        if options.normalize_keys {
            value = normalize_keys(value);
        }
        Self::from_value(value)
    }

    /// Read and parse a JSON configuration file
    pub fn load(path: impl AsRef<Path>, options: &LoaderOptions) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str_with(&text, options)?;
        info!(
            path = %path.display(),
            data_objects = config.data_objects.len(),
            actions = config.actions.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Read several configuration files and merge them in order
    pub fn load_all<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
        options: &LoaderOptions,
    ) -> ConfigResult<Self> {
        let mut merged = ConfigData::default();
        for path in paths {
            merged.merge(Self::load(path, options)?);
        }
        Ok(merged)
    }

    /// Merge another configuration into this one
    ///
    /// Objects are merged recursively; for any other value the later one wins.
    pub fn merge(&mut self, other: ConfigData) {
        merge_maps(&mut self.data_objects, other.data_objects);
        merge_maps(&mut self.actions, other.actions);
        merge_maps(&mut self.connections, other.connections);
        merge_maps(&mut self.global, other.global);
    }

    /// Get the section holding elements of the given type
    pub fn section(&self, element_type: ElementType) -> &Map<String, Value> {
        match element_type {
            ElementType::DataObject => &self.data_objects,
            ElementType::Action => &self.actions,
            ElementType::Connection => &self.connections,
            ElementType::GlobalOption => &self.global,
        }
    }

    /// Get a single element's attributes
    pub fn element(&self, element_type: ElementType, id: &str) -> Option<&Value> {
        self.section(element_type).get(id)
    }

    /// Look up an attribute of an element using dot notation, e.g. `metadata.feed`
    pub fn element_attribute(
        &self,
        element_type: ElementType,
        id: &str,
        attribute_path: &str,
    ) -> Option<&Value> {
        let element = self.element(element_type, id)?;
        attribute_at(element, attribute_path)
    }

    /// Whether the configuration declares no elements at all
    pub fn is_empty(&self) -> bool {
        ElementType::ALL
            .iter()
            .all(|element_type| self.section(*element_type).is_empty())
    }
}

/// Follow a dotted attribute path inside a value
pub fn attribute_at<'a>(value: &'a Value, attribute_path: &str) -> Option<&'a Value> {
    attribute_path
        .split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(Value::Object(existing)) if value.is_object() => {
                if let Value::Object(incoming) = value {
                    merge_maps(existing, incoming);
                }
            }
            Some(slot) => {
                debug!(key = %key, "Overriding configuration value");
                *slot = value;
            }
            None => {
                target.insert(key, value);
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
