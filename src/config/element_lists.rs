//! Sorted element lists with filters
//!
//! Provides the browsable lists of data objects, actions and connections that a
//! configuration explorer shows, and the filters applied to them.

use super::{ConfigData, ConfigResult};
use crate::value_objects::ElementType;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// A single configuration element with its id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementEntry {
    /// Key of the element in its section
    pub id: String,
    /// Section the element came from
    pub element_type: ElementType,
    /// Raw attributes
    pub attributes: Value,
}

impl ElementEntry {
    /// Value of the `type` attribute
    pub fn type_name(&self) -> Option<&str> {
        self.attributes.get("type").and_then(Value::as_str)
    }

    /// Values of `metadata.tags`
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .pointer("/metadata/tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}

/// Data objects, actions and connections, each sorted by id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementLists {
    pub data_objects: Vec<ElementEntry>,
    pub actions: Vec<ElementEntry>,
    pub connections: Vec<ElementEntry>,
}

impl ElementLists {
    /// Build the lists from a configuration
    pub fn from_config(config: &ConfigData) -> Self {
        Self {
            data_objects: sorted_entries(&config.data_objects, ElementType::DataObject),
            actions: sorted_entries(&config.actions, ElementType::Action),
            connections: sorted_entries(&config.connections, ElementType::Connection),
        }
    }

    /// Keep elements whose id contains `needle`, ignoring case
    pub fn filter_by_name(&self, needle: &str) -> Self {
        let needle = needle.to_lowercase();
        self.filter(|entry| entry.id.to_lowercase().contains(&needle))
    }

    /// Keep elements whose id matches a regular expression
    pub fn filter_by_regex(&self, pattern: &str) -> ConfigResult<Self> {
        let regex = Regex::new(pattern)?;
        Ok(self.filter(|entry| regex.is_match(&entry.id)))
    }

    /// Keep elements tagged with `tag` in `metadata.tags`
    pub fn filter_by_tag(&self, tag: &str) -> Self {
        self.filter(|entry| entry.tags().any(|candidate| candidate == tag))
    }

    /// Keep elements whose `type` attribute equals `type_name`
    pub fn filter_by_type(&self, type_name: &str) -> Self {
        self.filter(|entry| entry.type_name() == Some(type_name))
    }

    /// Get the list for an element type; global options are not listed
    pub fn list(&self, element_type: ElementType) -> &[ElementEntry] {
        match element_type {
            ElementType::DataObject => &self.data_objects,
            ElementType::Action => &self.actions,
            ElementType::Connection => &self.connections,
            ElementType::GlobalOption => &[],
        }
    }

    /// Total number of listed elements
    pub fn len(&self) -> usize {
        self.data_objects.len() + self.actions.len() + self.connections.len()
    }

    /// Whether all lists are empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filter(&self, predicate: impl Fn(&ElementEntry) -> bool) -> Self {
        let keep = |entries: &[ElementEntry]| {
            entries
                .iter()
                .filter(|entry| predicate(entry))
                .cloned()
                .collect::<Vec<_>>()
        };
        Self {
            data_objects: keep(&self.data_objects),
            actions: keep(&self.actions),
            connections: keep(&self.connections),
        }
    }
}

fn sorted_entries(section: &Map<String, Value>, element_type: ElementType) -> Vec<ElementEntry> {
    let mut entries: Vec<ElementEntry> = section
        .iter()
        .map(|(id, attributes)| ElementEntry {
            id: id.clone(),
            element_type,
            attributes: attributes.clone(),
        })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lists() -> ElementLists {
        let config = ConfigData::from_value(json!({
            "dataObjects": {
                "int-departures": {"type": "DeltaLakeTableDataObject", "metadata": {"tags": ["flights"]}},
                "ext-airports": {"type": "WebserviceFileDataObject"},
                "btl-distances": {"type": "CsvFileDataObject", "metadata": {"tags": ["report", "flights"]}},
            },
            "actions": {
                "join-departures-airports": {"type": "CustomDataFrameAction", "metadata": {"tags": ["flights"]}},
                "download-airports": {"type": "FileTransferAction"},
            },
            "connections": {
                "localSql": {"type": "JdbcTableConnection"},
            },
        }))
        .unwrap();
        ElementLists::from_config(&config)
    }

    fn ids(entries: &[ElementEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn test_entries_are_sorted_by_id() {
        let lists = lists();
        assert_eq!(
            ids(&lists.data_objects),
            vec!["btl-distances", "ext-airports", "int-departures"]
        );
        assert_eq!(
            ids(&lists.actions),
            vec!["download-airports", "join-departures-airports"]
        );
        assert_eq!(lists.len(), 6);
        assert!(lists.list(ElementType::GlobalOption).is_empty());
    }

    #[test]
    fn test_filter_by_name_ignores_case() {
        let filtered = lists().filter_by_name("AIRPORTS");
        assert_eq!(ids(&filtered.data_objects), vec!["ext-airports"]);
        assert_eq!(
            ids(&filtered.actions),
            vec!["download-airports", "join-departures-airports"]
        );
        assert!(filtered.connections.is_empty());
    }

    #[test]
    fn test_filter_by_regex() {
        let filtered = lists().filter_by_regex("^(int|btl)-").unwrap();
        assert_eq!(
            ids(&filtered.data_objects),
            vec!["btl-distances", "int-departures"]
        );
        assert!(filtered.actions.is_empty());

        assert!(lists().filter_by_regex("(unclosed").is_err());
    }

    #[test]
    fn test_filter_by_tag_and_type() {
        let tagged = lists().filter_by_tag("flights");
        assert_eq!(tagged.len(), 3);

        let typed = lists().filter_by_type("JdbcTableConnection");
        assert_eq!(ids(&typed.connections), vec!["localSql"]);
        assert_eq!(typed.len(), 1);

        assert!(lists().filter_by_type("Nope").is_empty());
    }
}
