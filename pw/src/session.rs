//! Planning session
//!
//! A [`PlanningSession`] owns one conversation: the participant, the domain
//! rule set, the transcript and the plan extracted from it so far. Each agent
//! reply that answers a user turn completes a pair and the plan is advanced
//! by exactly that pair.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use planextract::{ExportSpec, Plan, RuleCatalog, RuleSet, SessionContext, Turn, TurnPair, extract_pair};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SessionError;

/// Who the participant says they are
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub name: String,
    pub role: String,
    pub department: String,
    #[serde(default)]
    pub email: String,
}

impl ParticipantInfo {
    pub fn new(name: impl Into<String>, role: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            department: department.into(),
            email: String::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Name, role and department are required; email is optional
    pub fn validate(&self) -> Result<(), SessionError> {
        for (field, value) in [("name", &self.name), ("role", &self.role), ("department", &self.department)] {
            if value.trim().is_empty() {
                return Err(SessionError::MissingField { field });
            }
        }
        Ok(())
    }

    /// Email when given, otherwise the lowercased name with whitespace runs as `_`
    pub fn user_id(&self) -> String {
        let email = self.email.trim();
        if !email.is_empty() {
            return email.to_string();
        }
        self.name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_")
    }

    /// Template context for record building and greetings
    pub fn context(&self) -> SessionContext {
        let mut context = SessionContext::for_user(self.name.trim())
            .with("user.role", self.role.trim())
            .with("user.department", self.department.trim())
            .with("user.id", self.user_id());
        if !self.email.trim().is_empty() {
            context.set("user.email", self.email.trim());
        }
        context
    }
}

/// Look up the rule set for a domain
pub fn select_rules<'a>(catalog: &'a RuleCatalog, name: &str) -> Result<&'a RuleSet, SessionError> {
    catalog.get(name).ok_or_else(|| SessionError::UnknownRuleSet {
        name: name.to_string(),
        available: catalog.names().collect::<Vec<_>>().join(", "),
    })
}

/// One planning conversation and the plan extracted from it
#[derive(Debug, Clone)]
pub struct PlanningSession {
    id: Uuid,
    participant: ParticipantInfo,
    rules: RuleSet,
    context: SessionContext,
    transcript: Vec<Turn>,
    plan: Plan,
}

impl PlanningSession {
    /// Start a session; fails when a required participant field is blank
    pub fn new(participant: ParticipantInfo, rules: RuleSet) -> Result<Self, SessionError> {
        participant.validate()?;
        let id = Uuid::now_v7();
        info!(%id, rule_set = %rules.name(), user_id = %participant.user_id(), "Starting planning session");
        Ok(Self {
            id,
            context: participant.context(),
            plan: rules.empty_plan(),
            participant,
            rules,
            transcript: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn participant(&self) -> &ParticipantInfo {
        &self.participant
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// The first message sent to the agent on the participant's behalf
    pub fn opening_message(&self) -> String {
        format!(
            "Hello, I'm {}, {} from {}. I'd like to start {}.",
            self.participant.name.trim(),
            self.participant.role.trim(),
            self.participant.department.trim(),
            self.rules.title()
        )
    }

    /// Greeting to show when the agent cannot be reached at session start
    pub fn offline_greeting(&self) -> String {
        self.rules
            .greeting(&|key| self.context.lookup(key))
            .unwrap_or_else(|| format!("G'day {}! Let's start {}.", self.participant.name.trim(), self.rules.title()))
    }

    /// Append a participant turn; nothing is extracted until the agent answers
    pub fn push_user(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!(len = text.len(), "PlanningSession::push_user: called");
        self.transcript.push(Turn::user(text));
    }

    /// Append an agent turn, extracting from the pair it completes.
    ///
    /// Returns the number of records the pair added.
    pub fn push_agent(&mut self, text: impl Into<String>) -> usize {
        let text = text.into();
        debug!(len = text.len(), "PlanningSession::push_agent: called");

        let next = match self.transcript.last() {
            Some(last) if last.is_user() => Some(extract_pair(
                &TurnPair::new(&last.text, &text),
                &self.rules,
                &self.context,
                &self.plan,
            )),
            _ => {
                debug!("PlanningSession::push_agent: no pending user turn, nothing to extract");
                None
            }
        };

        self.transcript.push(Turn::agent(text));

        match next {
            Some(next) => {
                let added = next.len() - self.plan.len();
                self.plan = next;
                debug!(added, "PlanningSession::push_agent: plan advanced");
                added
            }
            None => 0,
        }
    }

    /// Append turns in order as if they arrived live
    pub fn replay(&mut self, turns: impl IntoIterator<Item = Turn>) {
        for turn in turns {
            if turn.is_user() {
                self.push_user(turn.text);
            } else {
                self.push_agent(turn.text);
            }
        }
        info!(turn_count = self.transcript.len(), record_count = self.plan.len(), "Replayed transcript");
    }

    /// Snapshot the session for export, stamped now
    pub fn export(&self) -> Result<SessionExport, SessionError> {
        self.export_at(Utc::now())
    }

    /// Snapshot the session for export with an explicit timestamp
    pub fn export_at(&self, export_date: DateTime<Utc>) -> Result<SessionExport, SessionError> {
        if !self.transcript.iter().any(Turn::is_agent) {
            return Err(SessionError::NothingToExport);
        }
        Ok(SessionExport {
            keys: self.rules.export().clone(),
            participant: self.participant.clone(),
            conversation: self.transcript.clone(),
            plan: self.plan.clone(),
            session_id: self.id,
            export_date,
        })
    }
}

/// The exported record of a session.
///
/// The participant and plan keys and the type labels come from the rule
/// set's export section, so each domain keeps its own payload shape.
#[derive(Debug, Clone)]
pub struct SessionExport {
    keys: ExportSpec,
    pub participant: ParticipantInfo,
    pub conversation: Vec<Turn>,
    pub plan: Plan,
    pub session_id: Uuid,
    pub export_date: DateTime<Utc>,
}

impl SessionExport {
    /// `{prefix}-{name}-{YYYY-MM-DD}.json`, whitespace and path separators in the name as `-`
    pub fn file_name(&self) -> String {
        export_file_name(&self.keys.file_prefix, &self.participant.name, self.export_date.date_naive())
    }
}

impl Serialize for SessionExport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        map.serialize_entry(&self.keys.profile_key, &self.participant)?;
        map.serialize_entry("consultation_type", &self.keys.consultation_type)?;
        let conversation: Vec<ExportTurn<'_>> = self.conversation.iter().map(ExportTurn::from).collect();
        map.serialize_entry("conversation", &conversation)?;
        map.serialize_entry(&self.keys.plan_key, &self.plan)?;
        map.serialize_entry("session_id", &self.session_id)?;
        map.serialize_entry("agent_type", &self.keys.agent_type)?;
        map.serialize_entry("export_date", &self.export_date.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        map.end()
    }
}

/// A conversation entry as exported: `ai` or `user` with the message text
#[derive(Serialize)]
struct ExportTurn<'a> {
    sender: &'a str,
    message: &'a str,
}

impl<'a> From<&'a Turn> for ExportTurn<'a> {
    fn from(turn: &'a Turn) -> Self {
        Self {
            sender: if turn.is_user() { "user" } else { "ai" },
            message: &turn.text,
        }
    }
}

fn export_file_name(prefix: &str, name: &str, date: NaiveDate) -> String {
    let name = name
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect::<Vec<_>>()
        .join("-");
    let name = if name.is_empty() { "participant".to_string() } else { name };
    format!("{}-{}-{}.json", prefix, name, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn delivery() -> RuleSet {
        RuleCatalog::builtin().unwrap().get("delivery").unwrap().clone()
    }

    fn participant() -> ParticipantInfo {
        ParticipantInfo::new("Jordan Lee", "Head Teacher", "Nursing")
    }

    #[test]
    fn test_validate_requires_name_role_department() {
        assert!(participant().validate().is_ok());

        let mut info = participant();
        info.role = "  ".to_string();
        assert!(matches!(info.validate(), Err(SessionError::MissingField { field: "role" })));
        assert!(PlanningSession::new(info, delivery()).is_err());
    }

    #[test]
    fn test_user_id() {
        assert_eq!(ParticipantInfo::new("Jordan  Lee", "r", "d").user_id(), "jordan_lee");
        assert_eq!(participant().with_email("jl@example.edu").user_id(), "jl@example.edu");
    }

    #[test]
    fn test_opening_message_and_greeting() {
        let session = PlanningSession::new(participant(), delivery()).unwrap();
        assert_eq!(
            session.opening_message(),
            "Hello, I'm Jordan Lee, Head Teacher from Nursing. I'd like to start delivery staff planning."
        );
        assert!(session.offline_greeting().starts_with("G'day Jordan Lee! I'm Riva"));
    }

    #[test]
    fn test_push_agent_extracts_completed_pair_only() {
        let mut session = PlanningSession::new(participant(), delivery()).unwrap();
        assert_eq!(session.push_agent("Tell me about staff and budget"), 0);

        session.push_user("We need more staff.");
        assert!(session.plan().category_is_empty("resources"));

        assert_eq!(session.push_agent("Understood."), 1);
        let resource = &session.plan().records("resources")[0];
        assert_eq!(resource.get("type"), Some("Staff"));
        assert_eq!(session.transcript().len(), 3);
    }

    #[test]
    fn test_replay_matches_batch_extraction() {
        let turns = vec![
            Turn::agent("Welcome"),
            Turn::user("Our project named Campus Connect has a staffing risk."),
            Turn::agent("Let's look at the timeline."),
            Turn::user("We want it done by October 2025."),
            Turn::agent("Noted, I'll add that to the schedule."),
        ];
        let mut session = PlanningSession::new(participant(), delivery()).unwrap();
        session.replay(turns.clone());

        let batch = planextract::extract(&turns, &delivery(), &participant().context(), &delivery().empty_plan());
        assert_eq!(session.plan(), &batch);
        assert_eq!(session.plan().records("projects")[0].get("lead"), Some("Jordan Lee"));
    }

    #[test]
    fn test_export_payload_keys() {
        let mut session = PlanningSession::new(participant(), delivery()).unwrap();
        assert!(matches!(session.export(), Err(SessionError::NothingToExport)));

        session.push_agent("Welcome");
        let date = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let export = session.export_at(date).unwrap();
        let json = serde_json::to_value(&export).unwrap();

        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(keys.contains(&"staff"));
        assert!(keys.contains(&"delivery_plan"));
        assert_eq!(json["consultation_type"], "delivery_staff");
        assert_eq!(json["agent_type"], "riva_delivery_specialist");
        assert_eq!(json["staff"]["name"], "Jordan Lee");
        assert_eq!(json["session_id"], session.id().to_string());
        assert!(json["delivery_plan"]["risks"].as_array().unwrap().is_empty());
        assert_eq!(json["conversation"][0]["sender"], "ai");
        assert_eq!(json["conversation"][0]["message"], "Welcome");
        assert_eq!(json["export_date"], "2025-03-14T09:30:00.000Z");

        assert_eq!(export.file_name(), "delivery-plan-Jordan-Lee-2025-03-14.json");
    }

    #[test]
    fn test_export_conversation_senders() {
        let mut session = PlanningSession::new(participant(), delivery()).unwrap();
        session.push_user("Hi there");
        session.push_agent("Hello Jordan");
        let json = serde_json::to_value(session.export().unwrap()).unwrap();
        let senders: Vec<&str> = json["conversation"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["sender"].as_str().unwrap())
            .collect();
        assert_eq!(senders, vec!["user", "ai"]);
        assert!(json["conversation"][0].get("speaker").is_none());
    }

    #[test]
    fn test_export_file_name_strips_path_separators() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let name = export_file_name("delivery-plan", "Jordan/Lee ..\\x", date);
        assert_eq!(name, "delivery-plan-Jordan-Lee-x-2025-03-14.json");
        assert!(!name.contains('/') && !name.contains('\\'));
        assert_eq!(
            export_file_name("delivery-plan", " / ", date),
            "delivery-plan-participant-2025-03-14.json"
        );
    }

    #[test]
    fn test_select_rules() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert_eq!(select_rules(&catalog, "stakeholder").unwrap().name(), "stakeholder");
        let err = select_rules(&catalog, "sales").unwrap_err();
        assert!(err.to_string().contains("delivery, stakeholder"));
    }
}
