//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, FetchError};

/// Application errors wrap domain errors and add application-level context.
///
/// None of them is fatal: each leaves the picker in its last consistent state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("relocation failed: {message}")]
    Submission { message: String },

    #[error("a relocation is already in progress")]
    SubmissionInFlight,

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// True for errors caught before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
