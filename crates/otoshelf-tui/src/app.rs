//! Application state for the otoshelf TUI.

use crate::event::ControllerEvent;
use log::debug;
use otoshelf_core::shelf::{ShelfOrder, filter_records};
use otoshelf_core::types::{ChatMessage, SongDetails, SongRecord};
use uuid::Uuid;

/// Top-level views of the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Shelf listing of saved records.
    Bookshelf,
    /// Add-memory interview flow.
    Interview,
    /// Detail pane for one record.
    Detail,
}

/// Interview steps as the UI presents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStep {
    /// Entering song details.
    Details,
    /// Chatting with the interviewer.
    Chat,
    /// Waiting for the summary; no input accepted.
    Summarizing,
    /// Reviewing and editing the summary.
    Summary,
}

/// Active field in the details form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsField {
    Title,
    Artist,
    ReleaseYear,
}

impl DetailsField {
    /// Next field in tab order.
    pub fn next(self) -> Self {
        match self {
            DetailsField::Title => DetailsField::Artist,
            DetailsField::Artist => DetailsField::ReleaseYear,
            DetailsField::ReleaseYear => DetailsField::Title,
        }
    }
}

/// Top-level application state for the TUI.
pub struct App {
    /// Current view.
    pub view: View,
    /// Shelf records as last broadcast by the controller.
    pub records: Vec<SongRecord>,
    /// Search filter over title, artist, and tags.
    pub search: String,
    /// Whether keystrokes currently edit the search filter.
    pub searching: bool,
    /// Shelf ordering.
    pub order: ShelfOrder,
    /// Selected index into the visible records.
    pub selected: usize,
    /// Record shown in the detail view.
    pub detail_id: Option<Uuid>,
    /// Record pending delete confirmation.
    pub pending_delete: Option<Uuid>,
    /// Current interview step.
    pub interview_step: InterviewStep,
    /// Details form contents.
    pub details: SongDetails,
    /// Active details form field.
    pub details_field: DetailsField,
    /// Interview transcript as last broadcast.
    pub transcript: Vec<ChatMessage>,
    /// Whether an assistant reply is streaming.
    pub assistant_busy: bool,
    /// Chat input buffer.
    pub input: String,
    /// Summary text under review.
    pub summary: String,
    /// Generated tags, read-only.
    pub tags: Vec<String>,
    /// Status line text.
    pub status: String,
}

impl App {
    /// Create a new application state with defaults.
    pub fn new() -> Self {
        Self {
            view: View::Bookshelf,
            records: Vec::new(),
            search: String::new(),
            searching: false,
            order: ShelfOrder::default(),
            selected: 0,
            detail_id: None,
            pending_delete: None,
            interview_step: InterviewStep::Details,
            details: SongDetails::default(),
            details_field: DetailsField::Title,
            transcript: Vec::new(),
            assistant_busy: false,
            input: String::new(),
            summary: String::new(),
            tags: Vec::new(),
            status: String::new(),
        }
    }

    /// Records matching the current search and ordering.
    pub fn visible_records(&self) -> Vec<&SongRecord> {
        filter_records(&self.records, &self.search, self.order)
    }

    /// Currently selected record in the shelf view.
    pub fn selected_record(&self) -> Option<&SongRecord> {
        self.visible_records().get(self.selected).copied()
    }

    /// Record shown in the detail view.
    pub fn detail_record(&self) -> Option<&SongRecord> {
        let id = self.detail_id?;
        self.records.iter().find(|record| record.id == id)
    }

    /// Set the status line.
    pub fn push_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Cycle the shelf ordering.
    pub fn cycle_order(&mut self) {
        self.order = match self.order {
            ShelfOrder::CreatedAt => ShelfOrder::Title,
            ShelfOrder::Title => ShelfOrder::Artist,
            ShelfOrder::Artist => ShelfOrder::CreatedAt,
        };
        self.selected = 0;
    }

    /// Move the shelf selection, clamped to the visible records.
    pub fn move_selection(&mut self, delta: isize) {
        let visible = self.visible_records().len();
        if visible == 0 {
            self.selected = 0;
            return;
        }
        let current = self.selected as isize;
        self.selected = (current + delta).clamp(0, visible as isize - 1) as usize;
    }

    /// Open the interview view at the details step.
    pub fn open_interview(&mut self) {
        self.view = View::Interview;
        self.interview_step = InterviewStep::Details;
        self.details = SongDetails::default();
        self.details_field = DetailsField::Title;
        self.transcript.clear();
        self.assistant_busy = false;
        self.input.clear();
        self.summary.clear();
        self.tags.clear();
    }

    /// Mutable reference to the active details form field.
    pub fn active_details_field(&mut self) -> &mut String {
        match self.details_field {
            DetailsField::Title => &mut self.details.title,
            DetailsField::Artist => &mut self.details.artist,
            DetailsField::ReleaseYear => &mut self.details.release_year,
        }
    }

    /// Apply a controller event to the display state.
    pub fn apply_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::ShelfUpdated { records } => {
                debug!("shelf updated ({} records)", records.len());
                self.records = records;
                let visible = self.visible_records().len();
                if self.selected >= visible {
                    self.selected = visible.saturating_sub(1);
                }
            }
            ControllerEvent::InterviewStarted => {
                self.view = View::Interview;
                self.interview_step = InterviewStep::Chat;
                self.transcript.clear();
                self.assistant_busy = true;
            }
            ControllerEvent::TranscriptUpdated { transcript, busy } => {
                self.transcript = transcript;
                self.assistant_busy = busy;
            }
            ControllerEvent::Summarizing => {
                self.interview_step = InterviewStep::Summarizing;
            }
            ControllerEvent::SummaryReady { summary, tags } => {
                self.interview_step = InterviewStep::Summary;
                self.summary = summary;
                self.tags = tags;
            }
            ControllerEvent::RecordSaved { id } => {
                debug!("record saved (id={})", id);
            }
            ControllerEvent::InterviewClosed => {
                self.view = View::Bookshelf;
                self.interview_step = InterviewStep::Details;
                self.transcript.clear();
                self.assistant_busy = false;
                self.input.clear();
            }
            ControllerEvent::Status(status) => {
                self.push_status(status);
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn record(title: &str) -> SongRecord {
        SongRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            artist: "Artist".to_string(),
            release_year: String::new(),
            cover_art_url: String::new(),
            summary: String::new(),
            chat_history: Vec::new(),
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn selection_clamps_when_the_shelf_shrinks() {
        let mut app = App::new();
        app.apply_event(ControllerEvent::ShelfUpdated {
            records: vec![record("One"), record("Two")],
        });
        app.selected = 1;

        app.apply_event(ControllerEvent::ShelfUpdated {
            records: vec![record("One")],
        });
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn interview_events_drive_the_step_forward() {
        let mut app = App::new();
        app.open_interview();
        assert_eq!(app.interview_step, InterviewStep::Details);

        app.apply_event(ControllerEvent::InterviewStarted);
        assert_eq!(app.interview_step, InterviewStep::Chat);
        assert!(app.assistant_busy);

        app.apply_event(ControllerEvent::TranscriptUpdated {
            transcript: vec![ChatMessage::assistant("question")],
            busy: false,
        });
        assert!(!app.assistant_busy);

        app.apply_event(ControllerEvent::Summarizing);
        assert_eq!(app.interview_step, InterviewStep::Summarizing);

        app.apply_event(ControllerEvent::SummaryReady {
            summary: "narrative".to_string(),
            tags: vec!["warm".to_string()],
        });
        assert_eq!(app.interview_step, InterviewStep::Summary);
        assert_eq!(app.summary, "narrative");

        app.apply_event(ControllerEvent::InterviewClosed);
        assert_eq!(app.view, View::Bookshelf);
    }

    #[test]
    fn details_fields_cycle_in_tab_order() {
        let mut app = App::new();
        app.open_interview();
        app.active_details_field().push('a');
        assert_eq!(app.details.title, "a");

        app.details_field = app.details_field.next();
        app.active_details_field().push('b');
        assert_eq!(app.details.artist, "b");

        app.details_field = app.details_field.next();
        app.active_details_field().push('9');
        assert_eq!(app.details.release_year, "9");

        assert_eq!(app.details_field.next(), DetailsField::Title);
    }
}
