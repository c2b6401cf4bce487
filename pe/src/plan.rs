//! Plan and Record types
//!
//! A Plan groups extracted records by category. Both the category map and
//! the fields inside a record keep insertion order, so the exported JSON
//! reads the same way the records were discovered.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A flat, insertion-ordered mapping of field name to value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    /// Iterate fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Accumulated extraction output, grouped by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    categories: IndexMap<String, Vec<Record>>,
}

impl Plan {
    /// Create an empty plan with no categories
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plan with the given categories present and empty
    pub fn with_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(|c| (c.into(), Vec::new())).collect(),
        }
    }

    /// Records of a category, in first-seen order
    pub fn records(&self, category: &str) -> &[Record] {
        self.categories.get(category).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Iterate categories and their records
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Whether the category holds no records (absent categories are empty)
    pub fn category_is_empty(&self, category: &str) -> bool {
        self.records(category).is_empty()
    }

    /// Append a record, creating the category if needed
    pub(crate) fn push(&mut self, category: &str, record: Record) {
        self.categories.entry(category.to_string()).or_default().push(record);
    }

    /// Total number of records across all categories
    pub fn len(&self) -> usize {
        self.categories.values().map(|v| v.len()).sum()
    }

    /// True when no category holds a record
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
