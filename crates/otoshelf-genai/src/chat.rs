//! Stateful chat session scoped to one interview.

use crate::provider::{GenerativeProvider, ReplyStream};
use crate::types::{Content, GenerateRequest};
use log::debug;
use std::sync::Arc;

/// Conversational context holding persona configuration and turn history.
///
/// At most one exchange may be outstanding: callers must fully consume the
/// stream returned by [`ChatSession::send_stream`] and close the exchange
/// with [`ChatSession::record_reply`] before sending again.
pub struct ChatSession {
    provider: Arc<dyn GenerativeProvider>,
    model: String,
    system_instruction: String,
    history: Vec<Content>,
}

impl ChatSession {
    /// Open a session with the given persona instruction.
    pub fn new(
        provider: Arc<dyn GenerativeProvider>,
        model: impl Into<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_instruction: system_instruction.into(),
            history: Vec::new(),
        }
    }

    /// Send a user message and stream the assistant reply.
    ///
    /// The user turn is recorded immediately; the assistant turn is recorded
    /// by `record_reply` once the caller has consumed the stream, so that a
    /// partial reply can still be kept on mid-stream failure.
    pub fn send_stream(&mut self, text: &str) -> ReplyStream {
        self.history.push(Content::user(text));
        debug!(
            "sending chat turn (model={}, history_len={})",
            self.model,
            self.history.len()
        );
        self.provider.stream_generate(GenerateRequest {
            model: self.model.clone(),
            system_instruction: Some(self.system_instruction.clone()),
            contents: self.history.clone(),
        })
    }

    /// Close the outstanding exchange with the assistant's full reply text.
    pub fn record_reply(&mut self, text: &str) {
        self.history.push(Content::model(text));
    }

    /// Persona instruction configured at session creation.
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Ordered turn history recorded so far.
    pub fn history(&self) -> &[Content] {
        &self.history
    }
}
