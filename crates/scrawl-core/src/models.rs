//! Data model types for the shared note and chat transcripts.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Wire-format name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    /// Build a user-authored message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Build an assistant-authored message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A stored conversation with the model backend.
///
/// `messages` is append-only and chronological: each completed exchange adds
/// one user message followed by one assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTranscript {
    /// Store-assigned identifier.
    pub id: i64,
    /// Display title; starts as a placeholder until summarized.
    pub title: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// True while the title is still the creation placeholder.
    pub fn is_untitled(&self) -> bool {
        self.title == defaults::NEW_CHAT_TITLE
    }
}

/// Listing row for a chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: i64,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_serializes_lowercase() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);

        let msg = ChatMessage::assistant("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
    }

    #[test]
    fn test_message_roundtrip() {
        let json = r#"[{"role":"user","content":"a"},{"role":"assistant","content":"b"}]"#;
        let messages: Vec<ChatMessage> = serde_json::from_str(json).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(serde_json::to_string(&messages).unwrap(), json);
    }

    #[test]
    fn test_transcript_is_untitled() {
        let transcript = ChatTranscript {
            id: 1,
            title: defaults::NEW_CHAT_TITLE.to_string(),
            messages: vec![],
        };
        assert!(transcript.is_untitled());

        let titled = ChatTranscript {
            title: "Rust lifetimes".to_string(),
            ..transcript
        };
        assert!(!titled.is_untitled());
    }
}
