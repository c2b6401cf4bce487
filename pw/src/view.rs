//! Terminal views of plans, documents and profiles

use std::fmt::Write;

use colored::{ColoredString, Colorize};
use markrender::{Block, Document, Span};
use planextract::{ParticipantProfile, Plan, Record, RuleSet};

use crate::display::{badge_color, category_title, empty_text};

/// Side-panel view of a plan: one section per declared category
pub fn plan_view(plan: &Plan, rules: &RuleSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rules.title().to_uppercase().bold());

    for category in rules.categories() {
        let records = plan.records(category);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} {}",
            category_title(rules, category).cyan().bold(),
            format!("({})", records.len()).dimmed()
        );
        if records.is_empty() {
            let _ = writeln!(out, "  {}", empty_text(rules, category).dimmed());
            continue;
        }
        for record in records {
            record_view(&mut out, record, rules);
        }
    }
    out
}

fn record_view(out: &mut String, record: &Record, rules: &RuleSet) {
    let mut fields = record.fields();
    if let Some((_, headline)) = fields.next() {
        let _ = writeln!(out, "  - {}", headline.bold());
    }
    for (field, value) in fields {
        let value: ColoredString = match badge_color(rules, field, value) {
            Some(color) => value.color(colored::Color::from(color)),
            None => value.normal(),
        };
        let _ = writeln!(out, "      {}: {}", field.dimmed(), value);
    }
}

/// Terminal view of a rendered message
pub fn document_view(doc: &Document) -> String {
    let blocks: Vec<String> = doc
        .iter()
        .map(|block| match block {
            Block::Heading { number, title, bullets } => {
                let mut text = format!("{}", format!("{}. {}", number, spans_view(title)).bold());
                for bullet in bullets {
                    text.push_str(&format!("\n    • {}", spans_view(bullet)));
                }
                text
            }
            Block::BulletList { items } => items
                .iter()
                .map(|item| format!("  • {}", spans_view(item)))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Paragraph { content } => spans_view(content),
        })
        .collect();
    blocks.join("\n\n")
}

fn spans_view(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Plain(text) => text.normal().to_string(),
            Span::Bold(text) => text.bold().to_string(),
            Span::Italic(text) => text.italic().to_string(),
        })
        .collect()
}

/// Terminal view of an inferred profile and questionnaire progress
pub fn profile_view(profile: &ParticipantProfile, next_question: u32) -> String {
    let unknown = || "unknown".dimmed().to_string();
    let mut out = String::new();
    let _ = writeln!(out, "{}", "PARTICIPANT PROFILE".bold());
    let _ = writeln!(out, "  campus:      {}", profile.campus.clone().unwrap_or_else(unknown));
    let areas = if profile.delivery_areas.is_empty() {
        unknown()
    } else {
        profile.delivery_areas.join(", ")
    };
    let _ = writeln!(out, "  areas:       {}", areas);
    let _ = writeln!(
        out,
        "  role:        {}",
        profile.role.map(|r| r.to_string()).unwrap_or_else(unknown)
    );
    let _ = writeln!(
        out,
        "  experience:  {}",
        profile.experience_years.clone().unwrap_or_else(unknown)
    );
    let _ = writeln!(out, "  teacher:     {}", if profile.is_teacher { "yes" } else { "no" });
    let _ = writeln!(out, "  next question: ID[{}]", next_question);
    out
}
