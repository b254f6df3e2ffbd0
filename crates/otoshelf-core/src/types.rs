//! Core data types shared across the bookshelf and interview flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Speaker role for a transcript message.
///
/// Serialized as `user` / `model` so persisted records keep the same shape
/// the service wire uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    /// User-authored message.
    #[serde(rename = "user")]
    User,
    /// Assistant-authored message.
    #[serde(rename = "model")]
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a role from a lowercase string.
    pub fn parse(value: &str) -> Self {
        if value == "model" || value == "assistant" {
            Role::Assistant
        } else {
            Role::User
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(value))
    }
}

/// One turn in an interview transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "ChatMessageRepr")]
pub struct ChatMessage {
    /// Role that produced the message.
    pub role: Role,
    /// Message text. Empty only while an assistant reply is streaming.
    pub text: String,
}

impl ChatMessage {
    /// Build a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Build an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Accepts both the current shape (`text`) and the legacy persisted shape
/// (`parts: [{ text }]`) when decoding a transcript message.
#[derive(Deserialize)]
struct ChatMessageRepr {
    role: Role,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    parts: Option<Vec<LegacyPart>>,
}

#[derive(Deserialize)]
struct LegacyPart {
    #[serde(default)]
    text: String,
}

impl From<ChatMessageRepr> for ChatMessage {
    fn from(repr: ChatMessageRepr) -> Self {
        let text = match (repr.text, repr.parts) {
            (Some(text), _) => text,
            (None, Some(parts)) => parts
                .into_iter()
                .map(|part| part.text)
                .collect::<Vec<_>>()
                .join(""),
            (None, None) => String::new(),
        };
        Self {
            role: repr.role,
            text,
        }
    }
}

/// A persisted song-memory entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    /// Unique identifier, assigned at creation and immutable afterwards.
    pub id: Uuid,
    /// Song title.
    pub title: String,
    /// Artist name.
    pub artist: String,
    /// Optional release year, free text.
    #[serde(default)]
    pub release_year: String,
    /// Placeholder cover-art URL derived from the title.
    pub cover_art_url: String,
    /// AI-authored narrative summary, user-editable after generation.
    pub summary: String,
    /// Full interview transcript.
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    /// Emotion tags in generation order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// First-save timestamp; never changes afterwards.
    pub created_at: DateTime<Utc>,
}

/// Song details collected before the interview starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongDetails {
    /// Song title; required.
    pub title: String,
    /// Artist name; required.
    pub artist: String,
    /// Optional release year, free text.
    pub release_year: String,
}

/// Record payload before identity and creation time are assigned.
///
/// The bookshelf fills in `id` and `created_at` when absent; an edit flow
/// carries both forward so they survive the re-save.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRecord {
    /// Existing id on the edit path, `None` for a new record.
    pub id: Option<Uuid>,
    pub title: String,
    pub artist: String,
    pub release_year: String,
    pub cover_art_url: String,
    pub summary: String,
    pub chat_history: Vec<ChatMessage>,
    pub tags: Vec<String>,
    /// Existing creation time on the edit path, `None` for a new record.
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn role_parses_and_formats() {
        assert_eq!(Role::parse("model"), Role::Assistant);
        assert_eq!(Role::parse("assistant"), Role::Assistant);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn chat_message_round_trips_with_text_field() {
        let message = ChatMessage::assistant("hello");
        let raw = serde_json::to_string(&message).expect("encode");
        assert_eq!(raw, r#"{"role":"model","text":"hello"}"#);
        let decoded: ChatMessage = serde_json::from_str(&raw).expect("decode");
        assert_eq!(decoded, message);
    }

    #[test]
    fn chat_message_decodes_legacy_parts_shape() {
        let raw = r#"{ "role": "model", "parts": [ { "text": "old " }, { "text": "shape" } ] }"#;
        let decoded: ChatMessage = serde_json::from_str(raw).expect("decode");
        assert_eq!(decoded, ChatMessage::assistant("old shape"));
    }

    #[test]
    fn song_record_uses_camel_case_field_names() {
        let record = SongRecord {
            id: Uuid::new_v4(),
            title: "Imagine".to_string(),
            artist: "John Lennon".to_string(),
            release_year: "1971".to_string(),
            cover_art_url: "https://example.com/cover".to_string(),
            summary: "a memory".to_string(),
            chat_history: vec![ChatMessage::user("hi")],
            tags: vec!["nostalgic".to_string()],
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&record).expect("encode");
        assert!(value.get("releaseYear").is_some());
        assert!(value.get("coverArtUrl").is_some());
        assert!(value.get("chatHistory").is_some());
        assert!(value.get("createdAt").is_some());
    }
}
