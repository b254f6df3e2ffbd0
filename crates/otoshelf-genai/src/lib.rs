//! Client for the generative-language service.
//!
//! This crate owns the provider seam used by the interview flow: a trait for
//! streaming and one-shot text generation, the Gemini REST implementation,
//! and the stateful chat session scoped to one interview.

mod chat;
mod error;
mod gemini;
mod provider;
mod types;

pub use chat::ChatSession;
pub use error::GenAiError;
pub use gemini::GeminiProvider;
pub use provider::{GenerativeProvider, ReplyStream};
pub use types::{Content, ContentRole, GenerateRequest, Part};
