//! planextract - rule-driven plan extraction from planning conversations
//!
//! A planning conversation alternates between a participant and an agent.
//! After each agent reply the latest user/agent turn pair is scanned by a
//! domain [`RuleSet`] and any new facts are appended to a [`Plan`]: a set of
//! named categories holding flat string records.
//!
//! # Modules
//!
//! - [`turn`] - Conversation turns and user/agent pairing
//! - [`plan`] - Plan and record types
//! - [`rule`] - Rule set definitions, templates and compilation
//! - [`engine`] - The extraction engine
//! - [`catalog`] - Builtin and on-disk rule set loading
//! - [`profile`] - Participant profile inference and question progress
//! - [`context`] - Session context values for record templates

pub mod catalog;
pub mod context;
pub mod engine;
pub mod error;
pub mod plan;
pub mod profile;
pub mod rule;
pub mod turn;

pub use catalog::{RuleCatalog, RulesConfig};
pub use context::SessionContext;
pub use engine::{extract, extract_pair};
pub use error::RuleError;
pub use plan::{Plan, Record};
pub use profile::{ParticipantProfile, RoleFamily, current_question_id, infer_profile, next_question_id};
pub use rule::{AgentSpec, CategoryLabel, DisplaySpec, ExportSpec, KeySpec, Rule, RuleSet, RuleSetDef};
pub use turn::{Speaker, Turn, TurnPair, turn_pairs};
