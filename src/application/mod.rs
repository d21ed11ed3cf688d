//! Application layer: picker state machine and services
//!
//! This layer orchestrates domain logic and depends on the remote boundary traits.

pub mod error;
pub mod gate;
pub mod picker;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use gate::{SubmissionGate, DEFAULT_MAX_JUSTIFICATION_LEN};
pub use picker::{Completion, Effect, Intent, Msg, Notice, NoticeKind, Picker, Step, Ticket};
