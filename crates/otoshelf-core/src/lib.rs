//! Core domain logic for otoshelf.
//!
//! This crate owns the song-record data model, the persisted bookshelf
//! collection, the interview flow state machine, and the summarization step
//! used by the TUI and SDK.

pub mod error;
pub mod interview;
pub mod links;
pub mod shelf;
pub mod store;
pub mod summary;
pub mod types;

pub use error::InterviewError;
pub use interview::{FlowStep, InterviewFlow};
pub use shelf::{Bookshelf, ShelfOrder};
pub use store::{JsonShelfStore, MemoryShelfStore, ShelfStore};
pub use summary::MemorySummary;
pub use types::{ChatMessage, DraftRecord, Role, SongDetails, SongRecord};
