//! Error types for the core interview flow.

use crate::interview::FlowStep;
use thiserror::Error;

/// Errors returned by interview flow operations.
#[derive(Debug, Error)]
pub enum InterviewError {
    /// Title or artist was missing when starting the interview.
    #[error("title and artist are required to start the interview")]
    MissingDetails,
    /// The operation is not valid in the current flow step.
    #[error("operation not allowed in the {0} step")]
    WrongStep(FlowStep),
    /// A previous exchange has not finished streaming yet.
    #[error("an exchange is already in flight")]
    ExchangeInFlight,
    /// Summarization requires at least one completed exchange.
    #[error("at least one completed exchange is required before summarizing")]
    NotEnoughExchanges,
}
