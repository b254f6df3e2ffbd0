//! Request and wire types shared across providers.

use serde::{Deserialize, Serialize};

/// Speaker role on the service wire (`user` / `model`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    /// User-authored turn.
    User,
    /// Model-authored turn.
    Model,
}

/// One text fragment inside a content turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    /// Text payload.
    pub text: String,
}

/// One conversational turn as the service expects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// Role that produced the turn.
    pub role: ContentRole,
    /// Text parts; always a one-element list for this application.
    pub parts: Vec<Part>,
}

impl Content {
    /// Build a user turn from plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Build a model turn from plain text.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::Model,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A single generation request, streamed or one-shot.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Model name, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// Optional system persona text.
    pub system_instruction: Option<String>,
    /// Ordered conversation turns; the last one is the pending user turn.
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    /// Build a one-shot prompt request with a single user turn.
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            contents: vec![Content::user(prompt)],
        }
    }
}

/// Generation response payload returned by the service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    pub(crate) candidates: Option<Vec<Candidate>>,
    pub(crate) error: Option<ErrorInfo>,
}

/// One response candidate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub(crate) content: Option<CandidateContent>,
}

/// Candidate content holding text parts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CandidateContent {
    pub(crate) parts: Option<Vec<CandidatePart>>,
}

/// One part of a candidate's content.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CandidatePart {
    pub(crate) text: Option<String>,
}

/// Error payload reported inside a response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorInfo {
    pub(crate) message: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of every candidate part, in order.
    pub(crate) fn text(&self) -> String {
        let mut text = String::new();
        for candidate in self.candidates.iter().flatten() {
            if let Some(content) = &candidate.content {
                for part in content.parts.iter().flatten() {
                    if let Some(fragment) = &part.text {
                        text.push_str(fragment);
                    }
                }
            }
        }
        text
    }
}
