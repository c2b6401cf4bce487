//! Display lookups: panel labels and badge colors
//!
//! Both come from the `display` section of a rule set, so a new domain only
//! needs new data, not new code.

use std::str::FromStr;

use planextract::RuleSet;
use tracing::debug;

/// Badge color tokens usable in rule set display tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BadgeColor {
    Green,
    Blue,
    Yellow,
    #[default]
    Gray,
    Red,
    Purple,
}

impl FromStr for BadgeColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "yellow" => Ok(Self::Yellow),
            "gray" | "grey" => Ok(Self::Gray),
            "red" => Ok(Self::Red),
            "purple" => Ok(Self::Purple),
            _ => Err(format!(
                "Unknown color: {}. Use: green, blue, yellow, gray, red, or purple",
                s
            )),
        }
    }
}

impl std::fmt::Display for BadgeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
            Self::Yellow => write!(f, "yellow"),
            Self::Gray => write!(f, "gray"),
            Self::Red => write!(f, "red"),
            Self::Purple => write!(f, "purple"),
        }
    }
}

impl From<BadgeColor> for colored::Color {
    fn from(color: BadgeColor) -> Self {
        match color {
            BadgeColor::Green => colored::Color::Green,
            BadgeColor::Blue => colored::Color::Blue,
            BadgeColor::Yellow => colored::Color::Yellow,
            BadgeColor::Gray => colored::Color::BrightBlack,
            BadgeColor::Red => colored::Color::Red,
            BadgeColor::Purple => colored::Color::Magenta,
        }
    }
}

/// Badge color for a record field value.
///
/// None when the field has no badge table. Values missing from the table,
/// and tokens that are not colors, fall back to gray.
pub fn badge_color(rules: &RuleSet, field: &str, value: &str) -> Option<BadgeColor> {
    let table = rules.display().badges.get(field)?;
    let color = match table.get(&value.trim().to_lowercase()) {
        Some(token) => token.parse().unwrap_or_else(|e: String| {
            debug!(%field, %value, error = %e, "badge_color: bad token, using default");
            BadgeColor::default()
        }),
        None => BadgeColor::default(),
    };
    Some(color)
}

/// Panel title of a category
pub fn category_title(rules: &RuleSet, category: &str) -> String {
    match rules.display().categories.get(category) {
        Some(label) if !label.title.is_empty() => label.title.clone(),
        _ => capitalize(category),
    }
}

/// Placeholder shown while a category holds no records
pub fn empty_text(rules: &RuleSet, category: &str) -> String {
    match rules.display().categories.get(category) {
        Some(label) if !label.empty.is_empty() => label.empty.clone(),
        _ => format!("No {} yet.", category),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
