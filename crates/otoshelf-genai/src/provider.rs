//! Provider seam for text generation backends.

use crate::error::GenAiError;
use crate::types::GenerateRequest;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

/// Finite, in-order, non-restartable sequence of reply text fragments.
///
/// Concatenating every `Ok` item yields the full reply. The stream ends after
/// the first `Err` item; consumers must not poll it again.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, GenAiError>> + Send>>;

/// Backend capable of streaming and one-shot text generation.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Stream incremental reply text for a chat-style request.
    fn stream_generate(&self, request: GenerateRequest) -> ReplyStream;

    /// Issue a one-shot generation call and return the full reply text.
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenAiError>;
}
