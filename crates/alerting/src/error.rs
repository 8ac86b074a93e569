//! Error types for lifecycle and pipeline operations.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while progressing a card or running an alert pass.
#[derive(Debug, Error)]
pub enum AlertingError {
    /// No card exists with the given id.
    #[error("no card exists with id '{0}'")]
    CardNotFound(String),

    /// A report was already received for the card.
    #[error("report already received for card '{0}'")]
    AlreadyReceived(String),

    /// The card has not received a report yet.
    #[error("report not yet received for card '{0}'")]
    NotReceived(String),

    /// The card's report already carries an image.
    #[error("image already attached for card '{0}'")]
    AlreadyAttached(String),

    /// Persistence failure.
    #[error("storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Downstream notification invocation failed.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// Result type for alerting operations.
pub type Result<T> = std::result::Result<T, AlertingError>;
