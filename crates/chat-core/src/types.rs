use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Model identifier used when an export does not say which model answered.
pub const UNKNOWN_MODEL: &str = "unknown";

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    /// `None` when the export had no usable timestamp for this message.
    pub timestamp: Option<DateTime<Utc>>,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, timestamp: Option<DateTime<Utc>>, content: impl Into<String>) -> Self {
        Self {
            role,
            timestamp,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Other,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Assistant, Role::System, Role::Other];

    /// Map an export role tag onto a known role. Anything unrecognised
    /// (including `tool`) becomes [`Role::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            _ => Role::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Other => "other",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chat session from the export, read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    /// `None` when the creation time was absent or malformed.
    pub created_at: Option<DateTime<Utc>>,
    /// Model identifier, [`UNKNOWN_MODEL`] when the export has none.
    pub model: String,
    /// Messages in chronological order; untimestamped messages come first.
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn has_known_model(&self) -> bool {
        self.model != UNKNOWN_MODEL
    }

    /// Iterator over valid message timestamps.
    pub fn message_times(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.messages.iter().filter_map(|m| m.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_tag() {
        assert_eq!(Role::from_tag("user"), Role::User);
        assert_eq!(Role::from_tag("Assistant"), Role::Assistant);
        assert_eq!(Role::from_tag(" system "), Role::System);
        assert_eq!(Role::from_tag("tool"), Role::Other);
        assert_eq!(Role::from_tag(""), Role::Other);
    }

    #[test]
    fn test_role_ordering_matches_all() {
        let mut sorted = Role::ALL;
        sorted.sort();
        assert_eq!(sorted, Role::ALL);
    }

    #[test]
    fn test_message_times_skip_missing() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let conv = Conversation {
            id: "c1".into(),
            title: "t".into(),
            created_at: None,
            model: UNKNOWN_MODEL.into(),
            messages: vec![
                Message::new(Role::User, None, "a"),
                Message::new(Role::Assistant, Some(ts), "b"),
            ],
        };
        assert_eq!(conv.message_times().collect::<Vec<_>>(), vec![ts]);
        assert!(!conv.has_known_model());
    }
}
