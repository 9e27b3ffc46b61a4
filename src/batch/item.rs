//! Work items and manifest loading.

use crate::error::{GenBatchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One named prompt to be turned into one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique name, used as the output filename stem.
    pub name: String,
    /// Free-text prompt handed to the generator.
    pub prompt: String,
}

impl WorkItem {
    /// Creates a work item.
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
        }
    }

    /// Returns the output filename for this item with the given extension.
    pub fn filename(&self, extension: &str) -> String {
        format!("{}.{}", self.name, extension)
    }
}

/// Checks that every name is usable as a filename stem and is unique.
pub fn validate_items(items: &[WorkItem]) -> Result<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        let name = item.name.as_str();
        if name.trim().is_empty() {
            return Err(GenBatchError::InvalidRequest(
                "work item name must not be empty".into(),
            ));
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(GenBatchError::InvalidRequest(format!(
                "work item name '{name}' is not a plain file name"
            )));
        }
        if !seen.insert(name) {
            return Err(GenBatchError::InvalidRequest(format!(
                "duplicate work item name '{name}'"
            )));
        }
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    List(Vec<WorkItem>),
    Wrapped { items: Vec<WorkItem> },
}

/// Parses a JSON manifest: either `[{"name", "prompt"}, ...]` or
/// `{"items": [...]}`.
pub fn parse_manifest(json: &str) -> Result<Vec<WorkItem>> {
    let items = match serde_json::from_str(json)? {
        Manifest::List(items) | Manifest::Wrapped { items } => items,
    };
    validate_items(&items)?;
    Ok(items)
}

/// Reads and validates a JSON manifest file.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<WorkItem>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_manifest(&text)
}
