//! Element descriptions
//!
//! Long-form descriptions live next to the configuration as Markdown files under
//! `description/<configKey>/<id>.md`. Fetched texts are memoised in a
//! [`DescriptionCache`] that the caller owns and resets at session start.

use crate::value_objects::ElementType;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Prefix of the fallback page some static servers return instead of a 404
const HTML_FALLBACK_PREFIX: &str = "<!DOCTYPE html>";

/// Text shown when an element has no description file
pub const MISSING_DESCRIPTION: &str = "### Detailed description \n\
There is no detailed description for this element. Please provide a Markdown file in the \
description/<elementType> folder of the project and use the [Commonmark Standard](https://commonmark.org/). \n \n\
The file should be named as <dataObjectId>.md, <actionId>.md or <connectionId>.md.";

/// Errors raised while fetching descriptions
#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("Failed to read description {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid description path: {0}")]
    InvalidPath(String),
}

/// Result type for description lookups
pub type DescriptionResult<T> = Result<T, DescriptionError>;

/// Somewhere description texts can be fetched from
#[async_trait]
pub trait DescriptionSource: Send + Sync {
    /// Fetch the text at a request path; `None` when nothing is there
    async fn fetch_text(&self, path: &str) -> DescriptionResult<Option<String>>;
}

/// Reads descriptions from a directory on disk
#[derive(Debug, Clone)]
pub struct FsDescriptionSource {
    root: PathBuf,
}

impl FsDescriptionSource {
    /// Create a source rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> DescriptionResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes_root = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes_root {
            return Err(DescriptionError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DescriptionSource for FsDescriptionSource {
    async fn fetch_text(&self, path: &str) -> DescriptionResult<Option<String>> {
        let file = self.resolve(path)?;
        match tokio::fs::read_to_string(&file).await {
            Ok(text) if text.starts_with(HTML_FALLBACK_PREFIX) => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DescriptionError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

/// Memoised description texts keyed by request path
///
/// Hits and misses are both remembered; failed fetches are not.
#[derive(Debug, Default)]
pub struct DescriptionCache {
    entries: Mutex<HashMap<String, Option<String>>>,
}

impl DescriptionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a text through the cache
    pub async fn fetch<S>(&self, source: &S, path: &str) -> DescriptionResult<Option<String>>
    where
        S: DescriptionSource + ?Sized,
    {
        let cached = self.entries.lock().get(path).cloned();
        if let Some(cached) = cached {
            trace!(path, "Description cache hit");
            return Ok(cached);
        }

        let text = source.fetch_text(path).await?;
        debug!(path, found = text.is_some(), "Fetched description");
        self.entries.lock().insert(path.to_string(), text.clone());
        Ok(text)
    }

    /// Fetch and compose the description of an element
    pub async fn describe<S>(
        &self,
        source: &S,
        element_type: ElementType,
        id: &str,
        raw_config: &Value,
    ) -> DescriptionResult<String>
    where
        S: DescriptionSource + ?Sized,
    {
        let path = description_path(element_type, id);
        let detail = self.fetch(source, &path).await?;
        Ok(compose_description(raw_config, detail.as_deref()))
    }

    /// Forget everything, called when a new session starts
    pub fn invalidate(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached paths
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Request path of an element's description file
pub fn description_path(element_type: ElementType, id: &str) -> String {
    format!("description/{}/{}.md", element_type.config_key(), id)
}

/// Combine the short `metadata.description` with the detailed text
pub fn compose_description(raw_config: &Value, detail: Option<&str>) -> String {
    let detail = detail.unwrap_or(MISSING_DESCRIPTION);
    let short = raw_config
        .pointer("/metadata/description")
        .filter(|value| !value.is_null());

    match short {
        Some(Value::String(text)) if text.is_empty() => detail.to_string(),
        Some(Value::String(text)) => format!("### Short description \n{}\n{}", text, detail),
        Some(other) => format!("### Short description \n{}\n{}", other, detail),
        None => detail.to_string(),
    }
}
