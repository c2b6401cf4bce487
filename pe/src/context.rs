//! Session context values available to record templates

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Contextual values such as the participant's declared name.
///
/// Keys are dotted (`user.name`, `user.role`) and are referenced from record
/// templates as `{user.name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContext {
    values: IndexMap<String, String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying only the participant's name
    pub fn for_user(name: impl Into<String>) -> Self {
        Self::new().with("user.name", name)
    }

    /// Builder-style insertion
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Owned lookup, the shape record templates expect
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}
