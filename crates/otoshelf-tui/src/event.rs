//! TUI event types for input and controller messages.

use crossterm::event::KeyEvent;
use otoshelf_core::types::{ChatMessage, SongRecord};
use uuid::Uuid;

/// Application event emitted by input handlers or the shelf controller.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Periodic tick event; drives redraws while a reply is streaming.
    Tick,
    /// Event emitted by the embedded shelf controller.
    Controller(ControllerEvent),
}

/// State change emitted by the shelf controller task.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// The record collection changed.
    ShelfUpdated { records: Vec<SongRecord> },
    /// An interview session opened and the opening question is streaming.
    InterviewStarted,
    /// The interview transcript changed; `busy` while a reply is streaming.
    TranscriptUpdated {
        transcript: Vec<ChatMessage>,
        busy: bool,
    },
    /// Summarization request is pending; no input is accepted.
    Summarizing,
    /// Summary and tags are ready for review.
    SummaryReady { summary: String, tags: Vec<String> },
    /// The finished record was saved to the shelf.
    RecordSaved { id: Uuid },
    /// The interview was closed or cancelled.
    InterviewClosed,
    /// User-visible status message for a failed action.
    Status(String),
}
