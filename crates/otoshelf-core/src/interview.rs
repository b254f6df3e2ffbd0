//! Interview flow state machine: detail entry, chat, summarization, save.

use crate::error::InterviewError;
use crate::links;
use crate::summary::{self, MemorySummary};
use crate::types::{ChatMessage, DraftRecord, SongDetails, SongRecord};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::{debug, info, warn};
use otoshelf_config::ShelfConfig;
use otoshelf_genai::{ChatSession, GenerativeProvider, ReplyStream};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Fixed message sent to elicit the assistant's opening question.
const TRIGGER_MESSAGE: &str = "お願いします。";
/// User-visible text substituted when a reply stream fails before any chunk.
pub const REPLY_FAILURE_TEXT: &str =
    "申し訳ありません、応答を取得できませんでした。もう一度お試しください。";

/// Persona instruction for the interview session, scoped to one song.
fn persona_instruction(title: &str, artist: &str) -> String {
    format!(
        "あなたは「オト」という名前の、共感的で好奇心旺盛なインタビュアーです。\
         あなたの目的は、ユーザーが{artist}の「{title}」という曲にまつわる個人的な思い出や感情を深く探求する手助けをすることです。\
         自由回答形式の、掘り下げるような質問を投げかけ、ユーザーが自分の物語を言葉にできるよう優しく導いてください。\
         会話の始めに、その曲との最初の出会いについて尋ねてください。\
         返答は簡潔で、会話のような口調を保ってください。"
    )
}

/// Steps of the interview flow. Transitions are linear; there is no way
/// back to an earlier step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    /// Collecting song details.
    Details,
    /// Conversational interview in progress.
    Chat,
    /// Summary generated; narrative editable, tags fixed.
    Summary,
}

impl FlowStep {
    /// Return the step as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Details => "details",
            FlowStep::Chat => "chat",
            FlowStep::Summary => "summary",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller for one interview, from detail entry to the finished record.
///
/// At most one exchange may be outstanding; a new send is rejected until the
/// previous reply stream has been fully consumed. There is no cancellation
/// primitive for an exchange; dropping the whole flow discards the
/// in-progress record.
pub struct InterviewFlow {
    provider: Arc<dyn GenerativeProvider>,
    chat_model: String,
    summary_model: String,
    step: FlowStep,
    details: SongDetails,
    session: Option<ChatSession>,
    transcript: Vec<ChatMessage>,
    exchange_in_flight: bool,
    summary: String,
    tags: Vec<String>,
    /// Existing record identity on the edit path.
    record_id: Option<Uuid>,
    created_at: Option<DateTime<Utc>>,
}

impl InterviewFlow {
    /// Start a flow for a new record.
    pub fn new(provider: Arc<dyn GenerativeProvider>, config: &ShelfConfig) -> Self {
        Self {
            provider,
            chat_model: config.chat_model.clone(),
            summary_model: config.summary_model.clone(),
            step: FlowStep::Details,
            details: SongDetails::default(),
            session: None,
            transcript: Vec::new(),
            exchange_in_flight: false,
            summary: String::new(),
            tags: Vec::new(),
            record_id: None,
            created_at: None,
        }
    }

    /// Start a flow that re-interviews an existing record, keeping its
    /// identity and creation time for the eventual save.
    pub fn resume_record(
        provider: Arc<dyn GenerativeProvider>,
        config: &ShelfConfig,
        record: &SongRecord,
    ) -> Self {
        let mut flow = Self::new(provider, config);
        flow.details = SongDetails {
            title: record.title.clone(),
            artist: record.artist.clone(),
            release_year: record.release_year.clone(),
        };
        flow.record_id = Some(record.id);
        flow.created_at = Some(record.created_at);
        flow
    }

    /// Current flow step.
    pub fn step(&self) -> FlowStep {
        self.step
    }

    /// Song details collected so far.
    pub fn details(&self) -> &SongDetails {
        &self.details
    }

    /// Interview transcript in chronological order.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Whether a reply stream is currently outstanding.
    pub fn exchange_in_flight(&self) -> bool {
        self.exchange_in_flight
    }

    /// Whether the flow may advance to summarization.
    pub fn can_request_summary(&self) -> bool {
        self.step == FlowStep::Chat && !self.exchange_in_flight && self.transcript.len() >= 2
    }

    /// Generated narrative summary, editable in the summary step.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Generated emotion tags, read-only.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Validate the details and open the interview session.
    ///
    /// Moves to the chat step and returns the reply stream carrying the
    /// assistant's opening question; the caller drives it with
    /// [`InterviewFlow::stream_reply`]. The trigger message goes only to the
    /// session, so the opening question is the first transcript entry.
    pub fn begin_interview(&mut self, details: SongDetails) -> Result<ReplyStream, InterviewError> {
        if self.step != FlowStep::Details {
            return Err(InterviewError::WrongStep(self.step));
        }
        if details.title.trim().is_empty() || details.artist.trim().is_empty() {
            return Err(InterviewError::MissingDetails);
        }

        info!(
            "starting interview (title={}, artist={})",
            details.title, details.artist
        );
        let mut session = ChatSession::new(
            self.provider.clone(),
            self.chat_model.clone(),
            persona_instruction(&details.title, &details.artist),
        );
        let stream = session.send_stream(TRIGGER_MESSAGE);

        self.details = details;
        self.session = Some(session);
        self.step = FlowStep::Chat;
        self.transcript.push(ChatMessage::assistant(""));
        self.exchange_in_flight = true;
        Ok(stream)
    }

    /// Send a user message and open the reply stream for it.
    ///
    /// Appends the user turn plus an empty assistant placeholder; the
    /// placeholder grows as the caller drives the stream.
    pub fn begin_exchange(&mut self, text: &str) -> Result<ReplyStream, InterviewError> {
        if self.step != FlowStep::Chat {
            return Err(InterviewError::WrongStep(self.step));
        }
        if self.exchange_in_flight {
            return Err(InterviewError::ExchangeInFlight);
        }
        let Some(session) = self.session.as_mut() else {
            return Err(InterviewError::WrongStep(self.step));
        };

        let stream = session.send_stream(text);
        self.transcript.push(ChatMessage::user(text));
        self.transcript.push(ChatMessage::assistant(""));
        self.exchange_in_flight = true;
        Ok(stream)
    }

    /// Drive a reply stream to completion, updating the transcript in order.
    ///
    /// `on_update` receives the accumulated reply text after each chunk.
    /// Returns the final assistant text: the full reply, a kept partial
    /// reply on mid-stream failure, or the fixed apology sentence when the
    /// stream failed before producing anything.
    pub async fn stream_reply<F>(&mut self, mut stream: ReplyStream, mut on_update: F) -> String
    where
        F: FnMut(&str),
    {
        let mut accumulated = String::new();
        let mut failed = false;

        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    accumulated.push_str(&chunk);
                    self.apply_chunk(&accumulated);
                    on_update(&accumulated);
                }
                Err(err) => {
                    warn!("reply stream failed: {err}");
                    failed = true;
                    break;
                }
            }
        }

        let final_text = self.complete_exchange(&accumulated, failed);
        if failed {
            on_update(&final_text);
        }
        final_text
    }

    /// Replace the streaming placeholder with an updated copy.
    fn apply_chunk(&mut self, accumulated: &str) {
        if let Some(last) = self.transcript.last_mut() {
            *last = ChatMessage::assistant(accumulated);
        }
    }

    /// Close the outstanding exchange and record the assistant turn.
    fn complete_exchange(&mut self, accumulated: &str, failed: bool) -> String {
        let final_text = if failed && accumulated.is_empty() {
            REPLY_FAILURE_TEXT.to_string()
        } else {
            accumulated.to_string()
        };

        self.apply_chunk(&final_text);
        if let Some(session) = self.session.as_mut() {
            session.record_reply(&final_text);
        }
        self.exchange_in_flight = false;
        debug!(
            "exchange finished (failed={}, reply_len={})",
            failed,
            final_text.len()
        );
        final_text
    }

    /// Summarize the transcript and advance to the summary step.
    ///
    /// Requires at least one completed exchange. While the request is
    /// pending the flow stays in the chat step and accepts no input; a
    /// service failure still advances, substituting the fixed failure
    /// sentence so the user can edit or retry manually.
    pub async fn request_summary(&mut self) -> Result<(), InterviewError> {
        if self.step != FlowStep::Chat {
            return Err(InterviewError::WrongStep(self.step));
        }
        if self.exchange_in_flight {
            return Err(InterviewError::ExchangeInFlight);
        }
        if self.transcript.len() < 2 {
            return Err(InterviewError::NotEnoughExchanges);
        }

        let MemorySummary { summary, tags } = summary::summarize(
            &self.provider,
            &self.summary_model,
            &self.transcript,
            &self.details.title,
            &self.details.artist,
        )
        .await;
        self.summary = summary;
        self.tags = tags;
        self.step = FlowStep::Summary;
        Ok(())
    }

    /// Replace the narrative text with the user's edit.
    pub fn set_summary(&mut self, text: impl Into<String>) -> Result<(), InterviewError> {
        if self.step != FlowStep::Summary {
            return Err(InterviewError::WrongStep(self.step));
        }
        self.summary = text.into();
        Ok(())
    }

    /// Build the finished record draft for the bookshelf.
    ///
    /// The draft carries the existing id and creation time on the edit path;
    /// both stay unassigned for a new record.
    pub fn finish(&self) -> Result<DraftRecord, InterviewError> {
        if self.step != FlowStep::Summary {
            return Err(InterviewError::WrongStep(self.step));
        }
        Ok(DraftRecord {
            id: self.record_id,
            title: self.details.title.clone(),
            artist: self.details.artist.clone(),
            release_year: self.details.release_year.clone(),
            cover_art_url: links::cover_art_url(&self.details.title),
            summary: self.summary.clone(),
            chat_history: self.transcript.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
        })
    }
}
