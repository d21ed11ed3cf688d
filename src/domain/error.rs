//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent rule violations caught locally,
/// before anything reaches a remote collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no location selected")]
    NoLocationSelected,

    #[error("justification is required")]
    EmptyJustification,

    #[error("justification exceeds {max} characters")]
    JustificationTooLong { max: usize },
}

/// A root or child list failed to load.
///
/// Carries a human-readable message; the loader never retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
