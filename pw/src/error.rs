//! Session error types

use thiserror::Error;

/// Errors raised while setting up or exporting a planning session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Missing required participant field: {field}")]
    MissingField { field: &'static str },

    #[error("Unknown rule set: {name} (available: {available})")]
    UnknownRuleSet { name: String, available: String },

    #[error("No assessment data to export yet: the agent has not replied")]
    NothingToExport,
}
