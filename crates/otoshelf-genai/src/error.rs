//! Error types for the generative-language client.

use thiserror::Error;

/// Errors returned by generative-language requests.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// Transport-level failure before or during a request.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status from the service.
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },
    /// The service reported an error payload.
    #[error("service error: {0}")]
    Service(String),
    /// A response payload could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The response carried no text content.
    #[error("response contained no text")]
    EmptyResponse,
}
