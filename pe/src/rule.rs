//! Rule set schema
//!
//! A rule set describes one planning domain declaratively. It is written in
//! YAML and compiled once into a [`RuleSet`] whose regexes and record
//! templates are ready for matching:
//!
//! ```yaml
//! name: delivery
//! title: delivery staff planning
//! categories: [projects, timeline]
//! rules:
//!   - id: project-named
//!     category: projects
//!     triggers: [project, initiative]
//!     matcher:
//!       kind: regex-capture
//!       pattern: 'project\s+(?:called|named)?\s+([A-Za-z0-9\s]+)'
//!       min-capture-len: 4
//!     record:
//!       name: "{1}"
//!       lead: "{user.name}"
//!     identity:
//!       field: name
//! ```
//!
//! Record templates substitute `{0}` (whole match), `{1}`.. (capture
//! groups) and dotted context keys such as `{user.name}`. Anything else in
//! braces is kept literally.

use std::collections::HashSet;

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RuleError;
use crate::plan::{Plan, Record};

// =============================================================================
// Serialized definitions
// =============================================================================

/// A rule set as written in YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSetDef {
    /// Unique name used to select the rule set (e.g. "delivery")
    #[serde(default)]
    pub name: String,

    /// Human-readable activity name used in opening messages
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Plan categories in output order
    pub categories: Vec<String>,

    #[serde(default)]
    pub rules: Vec<RuleDef>,

    /// The conversational agent behind this domain
    #[serde(default)]
    pub agent: AgentSpec,

    /// Labels and badge colors for the plan panel
    #[serde(default)]
    pub display: DisplaySpec,

    /// Export payload naming
    #[serde(default)]
    pub export: ExportSpec,
}

/// A single extraction rule as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    pub id: String,

    pub category: String,

    /// Any one of these keywords arms the rule
    #[serde(default)]
    pub triggers: Vec<String>,

    /// Every one of these keywords must also be present
    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub matcher: MatcherDef,

    /// Only fire when the category is still empty after all other rules ran
    #[serde(default)]
    pub fallback: bool,

    /// Field name -> template
    pub record: IndexMap<String, String>,

    pub identity: KeySpec,
}

/// How a rule finds matches in the scanning buffer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MatcherDef {
    /// One candidate whenever the rule is armed
    #[default]
    KeywordPresence,
    /// One candidate per non-overlapping, case-insensitive match
    RegexCapture {
        pattern: String,
        /// Captures shorter than this many characters are discarded as noise
        #[serde(rename = "min-capture-len", default = "default_min_capture_len")]
        min_capture_len: usize,
    },
}

fn default_min_capture_len() -> usize {
    1
}

/// Identity key derivation for deduplication
///
/// Without a token the key is the trimmed, lowercased field value. With a
/// token the key is the token itself whenever the lowercased field contains
/// it, so any record mentioning the token counts as the same fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl KeySpec {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            token: None,
        }
    }

    pub fn marker(field: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            token: Some(token.into().to_lowercase()),
        }
    }

    /// Compute the identity key of a record, or None if the field is absent
    pub fn key(&self, record: &Record) -> Option<String> {
        let value = record.get(&self.field)?.trim().to_lowercase();
        match &self.token {
            Some(token) if value.contains(token.as_str()) => Some(token.clone()),
            _ => Some(value),
        }
    }
}

/// The agent persona and its offline greeting template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSpec {
    #[serde(default)]
    pub name: String,
    /// Shown when the agent cannot be reached; supports `{user.*}` placeholders
    #[serde(default)]
    pub greeting: String,
}

/// Panel labels and badge colors for a domain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySpec {
    /// Category -> panel title and empty-state text
    #[serde(default)]
    pub categories: IndexMap<String, CategoryLabel>,

    /// Field -> lowercased value -> color token
    #[serde(default)]
    pub badges: IndexMap<String, IndexMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub title: String,
    #[serde(default)]
    pub empty: String,
}

/// Naming of the export payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSpec {
    /// Key holding the participant profile
    #[serde(rename = "profile-key")]
    pub profile_key: String,

    /// Key holding the plan
    #[serde(rename = "plan-key")]
    pub plan_key: String,

    #[serde(rename = "consultation-type")]
    pub consultation_type: String,

    #[serde(rename = "agent-type")]
    pub agent_type: String,

    /// Export file name prefix
    #[serde(rename = "file-prefix")]
    pub file_prefix: String,
}

impl Default for ExportSpec {
    fn default() -> Self {
        Self {
            profile_key: "participant".to_string(),
            plan_key: "plan".to_string(),
            consultation_type: "planning".to_string(),
            agent_type: "planning_agent".to_string(),
            file_prefix: "plan".to_string(),
        }
    }
}

// =============================================================================
// Compiled form
// =============================================================================

/// One piece of a record template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Capture(usize),
    Context(String),
}

/// A compiled record field template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    /// Parse a template string; never fails, unknown placeholders stay literal
    pub fn parse(source: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                literal.push_str(&rest[open..]);
                rest = "";
                break;
            };
            let name = &after[..close];
            let part = if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
                name.parse::<usize>().ok().map(Part::Capture)
            } else if is_context_key(name) {
                Some(Part::Context(name.to_string()))
            } else {
                None
            };
            match part {
                Some(part) => {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(part);
                }
                None => literal.push_str(&rest[open..open + close + 2]),
            }
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Self { parts }
    }

    /// Highest capture group referenced, if any
    fn max_capture(&self) -> Option<usize> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Capture(n) => Some(*n),
                _ => None,
            })
            .max()
    }

    /// Render with the given captures and context lookup
    pub fn render(&self, captures: &[&str], context: &dyn Fn(&str) -> Option<String>) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Capture(n) => out.push_str(captures.get(*n).copied().unwrap_or("")),
                Part::Context(key) => out.push_str(&context(key).unwrap_or_default()),
            }
        }
        out
    }
}

fn is_context_key(name: &str) -> bool {
    name.contains('.')
        && name
            .split('.')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

/// Compiled matcher
#[derive(Debug, Clone)]
pub enum Matcher {
    KeywordPresence,
    RegexCapture { regex: Regex, min_capture_len: usize },
}

/// A compiled extraction rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub category: String,
    /// Lowercased trigger keywords (any one arms the rule)
    pub triggers: Vec<String>,
    /// Lowercased required keywords (all must be present)
    pub requires: Vec<String>,
    pub matcher: Matcher,
    pub fallback: bool,
    pub identity: KeySpec,
    fields: Vec<(String, Template)>,
}

impl Rule {
    /// Compile a rule definition against the declared categories
    pub fn compile(def: &RuleDef, categories: &[String]) -> Result<Self, RuleError> {
        debug!(rule = %def.id, "Rule::compile: called");
        if !categories.iter().any(|c| c == &def.category) {
            debug!(rule = %def.id, "Rule::compile: undeclared category branch");
            return Err(RuleError::UnknownCategory {
                rule: def.id.clone(),
                category: def.category.clone(),
            });
        }

        if def.record.is_empty() {
            return Err(RuleError::EmptyRecord { rule: def.id.clone() });
        }

        if !def.record.contains_key(&def.identity.field) {
            return Err(RuleError::UnknownIdentityField {
                rule: def.id.clone(),
                field: def.identity.field.clone(),
            });
        }

        let (matcher, available) = match &def.matcher {
            MatcherDef::KeywordPresence => {
                debug!(rule = %def.id, "Rule::compile: keyword-presence branch");
                if def.triggers.is_empty() {
                    return Err(RuleError::MissingTriggers { rule: def.id.clone() });
                }
                (Matcher::KeywordPresence, None)
            }
            MatcherDef::RegexCapture {
                pattern,
                min_capture_len,
            } => {
                debug!(rule = %def.id, %pattern, "Rule::compile: regex-capture branch");
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| RuleError::InvalidPattern {
                        rule: def.id.clone(),
                        source,
                    })?;
                let groups = regex.captures_len() - 1;
                (
                    Matcher::RegexCapture {
                        regex,
                        min_capture_len: *min_capture_len,
                    },
                    Some(groups),
                )
            }
        };

        let fields: Vec<(String, Template)> = def
            .record
            .iter()
            .map(|(field, source)| (field.clone(), Template::parse(source)))
            .collect();

        for (_, template) in &fields {
            if let Some(group) = template.max_capture() {
                match available {
                    Some(groups) if group <= groups => {}
                    _ => {
                        return Err(RuleError::CaptureOutOfRange {
                            rule: def.id.clone(),
                            group,
                            available: available.unwrap_or(0),
                        });
                    }
                }
            }
        }

        Ok(Self {
            id: def.id.clone(),
            category: def.category.clone(),
            triggers: def.triggers.iter().map(|k| k.to_lowercase()).collect(),
            requires: def.requires.iter().map(|k| k.to_lowercase()).collect(),
            matcher,
            fallback: def.fallback,
            identity: match &def.identity.token {
                Some(token) => KeySpec::marker(def.identity.field.as_str(), token.as_str()),
                None => KeySpec::field(def.identity.field.as_str()),
            },
            fields,
        })
    }

    /// Whether the rule's keywords are present in a lowercased buffer.
    ///
    /// A rule without triggers (only possible for regex rules) is armed by
    /// its required keywords alone.
    pub fn is_armed(&self, lowered: &str) -> bool {
        let triggered = self.triggers.is_empty() || self.triggers.iter().any(|k| lowered.contains(k.as_str()));
        triggered && self.requires.iter().all(|k| lowered.contains(k.as_str()))
    }

    /// Build a record from captures and context
    pub fn build_record(&self, captures: &[&str], context: &dyn Fn(&str) -> Option<String>) -> Record {
        self.fields
            .iter()
            .map(|(field, template)| (field.clone(), template.render(captures, context)))
            .collect()
    }
}

/// A compiled, validated rule set for one domain
#[derive(Debug, Clone)]
pub struct RuleSet {
    def: RuleSetDef,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse and compile a rule set from YAML.
    ///
    /// `fallback_name` is used when the document does not name itself.
    pub fn from_yaml(fallback_name: &str, yaml: &str) -> Result<Self, RuleError> {
        debug!(%fallback_name, yaml_len = yaml.len(), "RuleSet::from_yaml: called");
        let mut def: RuleSetDef = serde_yaml::from_str(yaml).map_err(|source| RuleError::Parse {
            name: fallback_name.to_string(),
            source,
        })?;
        if def.name.is_empty() {
            debug!(%fallback_name, "RuleSet::from_yaml: using fallback name");
            def.name = fallback_name.to_string();
        }
        Self::compile(def)
    }

    /// Compile a rule set definition
    pub fn compile(def: RuleSetDef) -> Result<Self, RuleError> {
        debug!(name = %def.name, rule_count = def.rules.len(), "RuleSet::compile: called");
        if def.name.trim().is_empty() {
            return Err(RuleError::MissingName);
        }

        let mut seen = HashSet::new();
        for category in &def.categories {
            if !seen.insert(category.as_str()) {
                return Err(RuleError::DuplicateCategory {
                    category: category.clone(),
                });
            }
        }

        let mut ids = HashSet::new();
        let mut rules = Vec::with_capacity(def.rules.len());
        for rule_def in &def.rules {
            if !ids.insert(rule_def.id.as_str()) {
                return Err(RuleError::DuplicateRuleId { id: rule_def.id.clone() });
            }
            rules.push(Rule::compile(rule_def, &def.categories)?);
        }

        debug!(name = %def.name, rule_count = rules.len(), "RuleSet::compile: complete");
        Ok(Self { def, rules })
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn title(&self) -> &str {
        if self.def.title.is_empty() { &self.def.name } else { &self.def.title }
    }

    pub fn description(&self) -> &str {
        &self.def.description
    }

    /// Declared categories, in output order
    pub fn categories(&self) -> &[String] {
        &self.def.categories
    }

    /// All rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules evaluated in the first pass
    pub fn primary_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| !r.fallback)
    }

    /// Rules evaluated after every primary rule has run
    pub fn fallback_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.fallback)
    }

    pub fn agent(&self) -> &AgentSpec {
        &self.def.agent
    }

    /// Render the offline greeting, if the rule set defines one
    pub fn greeting(&self, context: &dyn Fn(&str) -> Option<String>) -> Option<String> {
        if self.def.agent.greeting.trim().is_empty() {
            return None;
        }
        Some(Template::parse(&self.def.agent.greeting).render(&[], context))
    }

    pub fn display(&self) -> &DisplaySpec {
        &self.def.display
    }

    pub fn export(&self) -> &ExportSpec {
        &self.def.export
    }

    /// The definition this rule set was compiled from
    pub fn definition(&self) -> &RuleSetDef {
        &self.def
    }

    /// A plan with every declared category present and empty
    pub fn empty_plan(&self) -> Plan {
        Plan::with_categories(self.def.categories.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_context(_: &str) -> Option<String> {
        None
    }

    const MINIMAL: &str = r#"
name: sample
categories: [projects, resources]
rules:
  - id: project-named
    category: projects
    triggers: [project]
    matcher:
      kind: regex-capture
      pattern: 'project\s+named\s+(\w+)'
      min-capture-len: 4
    record:
      name: "{1}"
      lead: "{user.name}"
    identity:
      field: name
  - id: budget
    category: resources
    triggers: [budget, funding]
    record:
      type: Budget
    identity:
      field: type
"#;

    #[test]
    fn test_minimal_rule_set_compiles() {
        let rules = RuleSet::from_yaml("fallback", MINIMAL).unwrap();
        assert_eq!(rules.name(), "sample");
        assert_eq!(rules.title(), "sample");
        assert_eq!(rules.rules().len(), 2);
        assert!(matches!(rules.rules()[1].matcher, Matcher::KeywordPresence));
        match &rules.rules()[0].matcher {
            Matcher::RegexCapture { min_capture_len, .. } => assert_eq!(*min_capture_len, 4),
            other => panic!("unexpected matcher {:?}", other),
        }
    }

    #[test]
    fn test_template_parse_and_render() {
        let template = Template::parse("Complete phase by {0} for {user.name} {not a key} {");
        let rendered = template.render(&["March 2025"], &|key| (key == "user.name").then(|| "Jo".to_string()));
        assert_eq!(rendered, "Complete phase by March 2025 for Jo {not a key} {");
    }

    #[test]
    fn test_template_missing_values_render_empty() {
        let template = Template::parse("{2}-{user.email}");
        assert_eq!(template.render(&["x"], &no_context), "-");
    }

    #[test]
    fn test_key_spec_field_is_case_insensitive() {
        let spec = KeySpec::field("name");
        let a = Record::new().with("name", " Apollo ");
        let b = Record::new().with("name", "APOLLO");
        assert_eq!(spec.key(&a), spec.key(&b));
        assert_eq!(spec.key(&Record::new()), None);
    }

    #[test]
    fn test_key_spec_marker() {
        let spec = KeySpec::marker("description", "Staff");
        let mentions = Record::new().with("description", "Not enough staff available");
        let other = Record::new().with("description", "Timeline delays");
        assert_eq!(spec.key(&mentions), Some("staff".to_string()));
        assert_eq!(spec.key(&other), Some("timeline delays".to_string()));
    }

    #[test]
    fn test_rejects_unknown_category() {
        let yaml = r#"
name: bad
categories: [projects]
rules:
  - id: r1
    category: risks
    triggers: [risk]
    record: { category: Resource }
    identity: { field: category }
"#;
        let err = RuleSet::from_yaml("bad", yaml).unwrap_err();
        assert!(matches!(err, RuleError::UnknownCategory { .. }));
    }

    #[test]
    fn test_rejects_capture_out_of_range() {
        let yaml = r#"
name: bad
categories: [timeline]
rules:
  - id: dated
    category: timeline
    triggers: [schedule]
    matcher: { kind: regex-capture, pattern: 'march \d{4}' }
    record: { milestone: "{1}" }
    identity: { field: milestone }
"#;
        let err = RuleSet::from_yaml("bad", yaml).unwrap_err();
        assert!(matches!(
            err,
            RuleError::CaptureOutOfRange {
                group: 1,
                available: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_captures_on_keyword_rule() {
        let yaml = r#"
name: bad
categories: [resources]
rules:
  - id: staff
    category: resources
    triggers: [staff]
    record: { type: "{0}" }
    identity: { field: type }
"#;
        assert!(matches!(
            RuleSet::from_yaml("bad", yaml).unwrap_err(),
            RuleError::CaptureOutOfRange { .. }
        ));
    }

    #[test]
    fn test_rejects_invalid_pattern_and_duplicates() {
        let yaml = r#"
name: bad
categories: [projects]
rules:
  - id: broken
    category: projects
    matcher: { kind: regex-capture, pattern: '(unclosed' }
    record: { name: x }
    identity: { field: name }
"#;
        assert!(matches!(
            RuleSet::from_yaml("bad", yaml).unwrap_err(),
            RuleError::InvalidPattern { .. }
        ));

        let yaml = r#"
name: bad
categories: [projects, projects]
"#;
        assert!(matches!(
            RuleSet::from_yaml("bad", yaml).unwrap_err(),
            RuleError::DuplicateCategory { .. }
        ));
    }

    #[test]
    fn test_rejects_identity_outside_record_and_missing_triggers() {
        let yaml = r#"
name: bad
categories: [resources]
rules:
  - id: staff
    category: resources
    triggers: [staff]
    record: { type: Staff }
    identity: { field: name }
"#;
        assert!(matches!(
            RuleSet::from_yaml("bad", yaml).unwrap_err(),
            RuleError::UnknownIdentityField { .. }
        ));

        let yaml = r#"
name: bad
categories: [resources]
rules:
  - id: staff
    category: resources
    record: { type: Staff }
    identity: { field: type }
"#;
        assert!(matches!(
            RuleSet::from_yaml("bad", yaml).unwrap_err(),
            RuleError::MissingTriggers { .. }
        ));
    }

    #[test]
    fn test_name_falls_back_and_parse_error_is_typed() {
        let rules = RuleSet::from_yaml("from-file", "categories: [a]").unwrap();
        assert_eq!(rules.name(), "from-file");
        assert!(rules.empty_plan().records("a").is_empty());

        assert!(matches!(
            RuleSet::from_yaml("junk", "categories: 12").unwrap_err(),
            RuleError::Parse { .. }
        ));
    }

    #[test]
    fn test_is_armed_requires_all_required_keywords() {
        let yaml = r#"
name: risks
categories: [risks]
rules:
  - id: staff-risk
    category: risks
    triggers: [risk, challenge, Issue]
    requires: [staff]
    record: { description: Insufficient staff }
    identity: { field: description, token: staff }
"#;
        let rules = RuleSet::from_yaml("risks", yaml).unwrap();
        let rule = &rules.rules()[0];
        assert!(rule.is_armed("a big issue with staff"));
        assert!(!rule.is_armed("a big issue with budget"));
        assert!(!rule.is_armed("we have staff"));
    }

    #[test]
    fn test_compiled_identity_lowercases_token() {
        let yaml = r#"
name: risks
categories: [risks]
rules:
  - id: staff-risk
    category: risks
    triggers: [risk]
    record: { description: Insufficient staff }
    identity: { field: description, token: Staff }
  - id: any-risk
    category: risks
    triggers: [risk]
    record: { description: General risk }
    identity: { field: description }
"#;
        let rules = RuleSet::from_yaml("risks", yaml).unwrap();
        assert_eq!(rules.rules()[0].identity, KeySpec::marker("description", "staff"));
        assert_eq!(rules.rules()[0].identity.token.as_deref(), Some("staff"));
        assert_eq!(rules.rules()[1].identity, KeySpec::field("description"));
    }
}
