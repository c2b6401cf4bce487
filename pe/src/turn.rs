//! Conversation turns and turn-pair grouping

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    #[serde(alias = "ai", alias = "assistant")]
    Agent,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(alias = "sender")]
    pub speaker: Speaker,
    #[serde(alias = "message", default)]
    pub text: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    /// Create an agent turn
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.speaker == Speaker::User
    }

    pub fn is_agent(&self) -> bool {
        self.speaker == Speaker::Agent
    }
}

/// A user turn and the agent turn that answered it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPair<'a> {
    pub user: &'a str,
    pub agent: &'a str,
}

impl<'a> TurnPair<'a> {
    pub fn new(user: &'a str, agent: &'a str) -> Self {
        Self { user, agent }
    }

    /// The text scanned for this pair: user text, one space, agent text
    pub fn buffer(&self) -> String {
        let mut buffer = String::with_capacity(self.user.len() + self.agent.len() + 1);
        buffer.push_str(self.user);
        buffer.push(' ');
        buffer.push_str(self.agent);
        buffer
    }
}

/// Group a transcript into complete turn pairs, in transcript order.
///
/// Each agent turn is paired with the user turn immediately before it. Agent
/// turns with no preceding user turn (the opening greeting) and a trailing
/// user turn still waiting for its answer are not part of any pair.
pub fn turn_pairs(transcript: &[Turn]) -> Vec<TurnPair<'_>> {
    debug!(turn_count = transcript.len(), "turn_pairs: called");
    let pairs: Vec<TurnPair<'_>> = transcript
        .windows(2)
        .filter(|w| w[0].is_user() && w[1].is_agent())
        .map(|w| TurnPair::new(&w[0].text, &w[1].text))
        .collect();
    debug!(pair_count = pairs.len(), "turn_pairs: complete");
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_pairs_skips_greeting_and_pending_user_turn() {
        let transcript = vec![
            Turn::agent("G'day! Tell me about your projects."),
            Turn::user("We run a project named Apollo"),
            Turn::agent("Great, tell me more."),
            Turn::user("Still waiting"),
        ];

        let pairs = turn_pairs(&transcript);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].user, "We run a project named Apollo");
        assert_eq!(pairs[0].agent, "Great, tell me more.");
    }

    #[test]
    fn test_consecutive_user_turns_pair_with_latest() {
        let transcript = vec![Turn::user("first"), Turn::user("second"), Turn::agent("reply")];
        let pairs = turn_pairs(&transcript);
        assert_eq!(pairs, vec![TurnPair::new("second", "reply")]);
    }

    #[test]
    fn test_buffer_joins_with_space() {
        let pair = TurnPair::new("budget", "funding");
        assert_eq!(pair.buffer(), "budget funding");
    }

    #[test]
    fn test_turn_accepts_original_wire_shape() {
        let turn: Turn = serde_json::from_str(r#"{"sender": "ai", "message": "hello"}"#).unwrap();
        assert_eq!(turn, Turn::agent("hello"));

        let json = serde_json::to_string(&Turn::user("hi")).unwrap();
        assert_eq!(json, r#"{"speaker":"user","text":"hi"}"#);
    }
}
