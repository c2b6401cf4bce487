//! Planwizard - conversational planning wizard
//!
//! The caller side of plan extraction: a [`session::PlanningSession`] feeds
//! completed turn pairs to the extraction engine, keeps the plan, and
//! produces the export payload. Terminal views show plans and rendered agent
//! markup.
//!
//! # Modules
//!
//! - [`session`] - Planning session, participant details and export
//! - [`display`] - Panel labels and badge color lookups
//! - [`view`] - Terminal rendering of plans, documents and profiles
//! - [`transcript`] - Transcript file loading
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod session;
pub mod transcript;
pub mod view;

pub use config::Config;
pub use display::{BadgeColor, badge_color, category_title, empty_text};
pub use error::SessionError;
pub use session::{ParticipantInfo, PlanningSession, SessionExport, select_rules};
pub use transcript::{load_transcript, parse_transcript};
