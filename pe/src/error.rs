//! Rule set error types

use thiserror::Error;

/// Errors raised while parsing or validating a rule set
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Failed to parse rule set {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Rule set has no name")]
    MissingName,

    #[error("Rule '{rule}' has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule '{rule}' targets undeclared category '{category}'")]
    UnknownCategory { rule: String, category: String },

    #[error("Category '{category}' is declared more than once")]
    DuplicateCategory { category: String },

    #[error("Rule id '{id}' is used more than once")]
    DuplicateRuleId { id: String },

    #[error("Rule '{rule}' has no trigger keywords")]
    MissingTriggers { rule: String },

    #[error("Rule '{rule}' builds an empty record")]
    EmptyRecord { rule: String },

    #[error("Rule '{rule}' identity field '{field}' is not part of its record")]
    UnknownIdentityField { rule: String, field: String },

    #[error("Rule '{rule}' references capture {{{group}}} but only {available} groups exist")]
    CaptureOutOfRange { rule: String, group: usize, available: usize },
}
