//! Participant profile inference and question progress
//!
//! The agent walks the participant through a numbered questionnaire and
//! tags each question it asks with an `ID[n]` marker. Separately, a few
//! facts about the participant (campus, delivery areas, experience, role)
//! can be read straight from their answers to tailor later questions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::turn::Turn;

const CAMPUSES: &[&str] = &[
    "bankstown",
    "campbelltown",
    "granville",
    "liverpool",
    "macquarie fields",
    "miller",
    "padstow",
    "wetherill park",
];

const DELIVERY_AREAS: &[&str] = &[
    "nursing",
    "aboriginal health",
    "health",
    "dental",
    "pathology",
    "childrens services",
    "children services",
    "allied health",
    "fitness",
    "sport",
    "recreation",
    "early childhood",
    "ageing",
    "disability",
    "community services",
    "counselling",
    "mental health",
    "health services",
    "youth work",
    "alcohol",
    "drugs",
];

const OTHER_AREA_PHRASES: &[&str] = &["other tafe", "other area", "other nsw"];
const OTHER_AREA: &str = "Other TAFE NSW area";

const TEACHING_ROLES: &[&str] = &["teacher", "lecturer", "instructor", "educator"];
const ADMIN_ROLES: &[&str] = &["manager", "coordinator", "administrator", "head"];
const SUPPORT_ROLES: &[&str] = &["support", "assistant", "technician"];

/// Experience bands, checked in order; the first matching phrase wins
const EXPERIENCE_BANDS: &[(&[&str], &str)] = &[
    (&["less than 1", "< 1"], "Less than 1 year"),
    (&["1-3", "1 - 3"], "1-3 years"),
    (&["4-6", "4 - 6"], "4-6 years"),
    (&["7-10", "7 - 10"], "7-10 years"),
    (&["more than 10", "> 10"], "More than 10 years"),
];

static QUESTION_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ID\[(\d+)\]").expect("valid question id regex"));

/// Broad role family of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleFamily {
    Teacher,
    Admin,
    Support,
}

impl std::fmt::Display for RoleFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Teacher => write!(f, "teacher"),
            Self::Admin => write!(f, "admin"),
            Self::Support => write!(f, "support"),
        }
    }
}

/// What the participant's answers reveal about them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub campus: Option<String>,
    pub delivery_areas: Vec<String>,
    pub role: Option<RoleFamily>,
    pub experience_years: Option<String>,
    /// False once the participant says they work outside the teaching areas
    pub is_teacher: bool,
    pub selected_other_area: bool,
}

impl Default for ParticipantProfile {
    fn default() -> Self {
        Self {
            campus: None,
            delivery_areas: Vec::new(),
            role: None,
            experience_years: None,
            is_teacher: true,
            selected_other_area: false,
        }
    }
}

impl ParticipantProfile {
    fn add_area(&mut self, area: String) {
        if !self.delivery_areas.contains(&area) {
            self.delivery_areas.push(area);
        }
    }
}

/// Infer a participant profile from the user turns of a transcript
pub fn infer_profile(transcript: &[Turn]) -> ParticipantProfile {
    debug!(turn_count = transcript.len(), "infer_profile: called");
    let mut profile = ParticipantProfile::default();

    for turn in transcript.iter().filter(|t| t.is_user()) {
        let answer = turn.text.to_lowercase();

        if let Some(campus) = CAMPUSES.iter().find(|c| answer.contains(*c)) {
            debug!(%campus, "infer_profile: campus found");
            profile.campus = Some(title_case(campus));
        }

        if OTHER_AREA_PHRASES.iter().any(|p| answer.contains(p)) {
            debug!("infer_profile: other area selected");
            profile.selected_other_area = true;
            profile.is_teacher = false;
            profile.add_area(OTHER_AREA.to_string());
        } else {
            for area in DELIVERY_AREAS.iter().filter(|a| answer.contains(*a)) {
                profile.add_area(title_case(area));
            }
        }

        if answer.contains("year")
            && let Some((_, band)) = EXPERIENCE_BANDS
                .iter()
                .find(|(phrases, _)| phrases.iter().any(|p| answer.contains(p)))
        {
            debug!(%band, "infer_profile: experience band found");
            profile.experience_years = Some(band.to_string());
        }

        if TEACHING_ROLES.iter().any(|r| answer.contains(r)) {
            profile.role = Some(RoleFamily::Teacher);
        } else if ADMIN_ROLES.iter().any(|r| answer.contains(r)) {
            profile.role = Some(RoleFamily::Admin);
        } else if SUPPORT_ROLES.iter().any(|r| answer.contains(r)) {
            profile.role = Some(RoleFamily::Support);
        }
    }

    debug!(?profile, "infer_profile: complete");
    profile
}

/// The question id carried by a message: the first `ID[n]` marker in it
pub fn current_question_id(text: &str) -> Option<u32> {
    QUESTION_ID.captures(text)?.get(1)?.as_str().parse().ok()
}

/// The id of the next question to ask.
///
/// One past the marker of the latest agent turn carrying one, or 1 when the
/// agent has not asked a numbered question yet.
pub fn next_question_id(transcript: &[Turn]) -> u32 {
    let next = transcript
        .iter()
        .rev()
        .filter(|t| t.is_agent())
        .find_map(|t| current_question_id(&t.text))
        .map(|id| id.saturating_add(1))
        .unwrap_or(1);
    debug!(next, "next_question_id: returning");
    next
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
