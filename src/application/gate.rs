//! Submission gate
//!
//! Validates the relocation form and serialises relocation calls.

use tracing::debug;

use crate::domain::{AssetId, DomainError, LocationId, RelocationRequest};

/// Default upper bound for the justification text, in characters.
pub const DEFAULT_MAX_JUSTIFICATION_LEN: usize = 500;

/// Form state guarding the relocation call.
#[derive(Debug, Clone)]
pub struct SubmissionGate {
    justification: String,
    max_justification_len: usize,
    in_flight: bool,
}

impl Default for SubmissionGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_JUSTIFICATION_LEN)
    }
}

impl SubmissionGate {
    pub fn new(max_justification_len: usize) -> Self {
        Self {
            justification: String::new(),
            max_justification_len,
            in_flight: false,
        }
    }

    /// Raw text as typed, untrimmed.
    pub fn justification(&self) -> &str {
        &self.justification
    }

    pub fn set_justification(&mut self, text: impl Into<String>) {
        self.justification = text.into();
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Selected leaf, non-blank justification within bounds, nothing pending.
    pub fn can_submit(&self, selected: Option<&LocationId>) -> bool {
        !self.in_flight && self.validate_form(selected).is_ok()
    }

    fn validate_form(&self, selected: Option<&LocationId>) -> Result<(LocationId, String), DomainError> {
        let location = selected.cloned().ok_or(DomainError::NoLocationSelected)?;
        let trimmed = self.justification.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyJustification);
        }
        if trimmed.chars().count() > self.max_justification_len {
            return Err(DomainError::JustificationTooLong {
                max: self.max_justification_len,
            });
        }
        Ok((location, trimmed.to_string()))
    }

    /// Validate and mark a submission as in flight.
    ///
    /// Callers must check [`SubmissionGate::in_flight`] first; this only validates the form.
    pub fn begin(
        &mut self,
        asset: &AssetId,
        selected: Option<&LocationId>,
    ) -> Result<RelocationRequest, DomainError> {
        let (location, justification) = self.validate_form(selected)?;
        self.in_flight = true;
        debug!("submission started: {} -> {}", asset, location);
        Ok(RelocationRequest {
            asset: asset.clone(),
            location,
            justification,
        })
    }

    /// Release the in-flight flag; on success the form is cleared.
    pub fn settle(&mut self, success: bool) {
        self.in_flight = false;
        if success {
            self.justification.clear();
        }
    }
}
