//! Extraction engine
//!
//! Scans conversation turn pairs with a [`RuleSet`] and grows a [`Plan`].
//! The engine keeps no state between calls: the transcript, the rule set,
//! the session context and the plan accumulated so far are all passed in,
//! and a new plan is returned.
//!
//! # Evaluation order
//!
//! For each turn pair, every non-fallback rule runs first, in declaration
//! order. Fallback rules run afterwards and only fire when their category is
//! still empty, so a generic record never shadows a specific one.
//!
//! # Equivalence of strategies
//!
//! Records are only ever appended and duplicates are dropped by identity
//! key, so folding [`extract_pair`] over new pairs one at a time and
//! re-running [`extract`] over the whole transcript produce the same plan.

use tracing::debug;

use crate::context::SessionContext;
use crate::plan::{Plan, Record};
use crate::rule::{Matcher, Rule, RuleSet};
use crate::turn::{Turn, TurnPair, turn_pairs};

/// Extract from every complete turn pair of a transcript, starting at `prior`
pub fn extract(transcript: &[Turn], rules: &RuleSet, context: &SessionContext, prior: &Plan) -> Plan {
    debug!(turn_count = transcript.len(), rule_set = %rules.name(), "extract: called");
    let plan = turn_pairs(transcript)
        .iter()
        .fold(prior.clone(), |plan, pair| extract_pair(pair, rules, context, &plan));
    debug!(record_count = plan.len(), "extract: complete");
    plan
}

/// Extract from a single turn pair
pub fn extract_pair(pair: &TurnPair<'_>, rules: &RuleSet, context: &SessionContext, prior: &Plan) -> Plan {
    let buffer = pair.buffer();
    let lowered = buffer.to_lowercase();
    debug!(buffer_len = buffer.len(), "extract_pair: called");

    let mut plan = prior.clone();
    let mut added = 0usize;

    for rule in rules.primary_rules() {
        added += apply_rule(rule, &buffer, &lowered, context, &mut plan);
    }

    for rule in rules.fallback_rules() {
        if plan.category_is_empty(&rule.category) {
            debug!(rule = %rule.id, "extract_pair: category empty, evaluating fallback");
            added += apply_rule(rule, &buffer, &lowered, context, &mut plan);
        } else {
            debug!(rule = %rule.id, "extract_pair: category populated, skipping fallback");
        }
    }

    debug!(added, record_count = plan.len(), "extract_pair: complete");
    plan
}

/// Evaluate one rule and append its new records; returns how many were added
fn apply_rule(rule: &Rule, buffer: &str, lowered: &str, context: &SessionContext, plan: &mut Plan) -> usize {
    if !rule.is_armed(lowered) {
        return 0;
    }
    debug!(rule = %rule.id, "apply_rule: armed");

    let mut added = 0;
    for candidate in candidates(rule, buffer, context) {
        if is_duplicate(rule, &candidate, plan.records(&rule.category)) {
            debug!(rule = %rule.id, "apply_rule: duplicate identity, discarding");
            continue;
        }
        debug!(rule = %rule.id, category = %rule.category, "apply_rule: appending record");
        plan.push(&rule.category, candidate);
        added += 1;
    }
    added
}

/// Build the candidate records of an armed rule
fn candidates(rule: &Rule, buffer: &str, context: &SessionContext) -> Vec<Record> {
    let lookup = |key: &str| context.lookup(key);

    match &rule.matcher {
        Matcher::KeywordPresence => vec![rule.build_record(&[], &lookup)],
        Matcher::RegexCapture { regex, min_capture_len } => regex
            .captures_iter(buffer)
            .filter_map(|caps| {
                let captures: Vec<&str> = caps
                    .iter()
                    .map(|m| m.map(|m| m.as_str().trim()).unwrap_or(""))
                    .collect();
                let significant = captures.get(1).or(captures.first()).copied().unwrap_or("");
                let len = significant.chars().count();
                if len == 0 || len < *min_capture_len {
                    debug!(rule = %rule.id, len, "candidates: capture too short, discarding");
                    return None;
                }
                Some(rule.build_record(&captures, &lookup))
            })
            .collect(),
    }
}

/// First write wins: a candidate is dropped when an existing record of the
/// category has the same identity key under the candidate rule's key spec
fn is_duplicate(rule: &Rule, candidate: &Record, existing: &[Record]) -> bool {
    let key = rule.identity.key(candidate);
    existing.iter().any(|record| match &key {
        Some(key) => rule.identity.key(record).as_ref() == Some(key),
        None => record == candidate,
    })
}
