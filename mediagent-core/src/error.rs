use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::PendingOperation;

/// Form field an intake or chat validation error is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntakeField {
    Symptoms,
    DoctorType,
    ReportUrl,
    Question,
}

/// A single inline error shown next to the offending field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{field:?}: {message}")]
pub struct FieldError {
    pub field: IntakeField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: IntakeField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("input failed validation ({} field error(s))", .errors.len())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn single(field: IntakeField, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Errors scoped to one field, in the order they were raised.
    pub fn for_field(&self, field: IntakeField) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |e| e.field == field)
    }
}

/// Failure of a call to the generation backend
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Generation backend request failed: {0}")]
    Backend(String),

    #[error("Generation backend returned no output")]
    EmptyOutput,

    #[error("Generation output did not match the expected schema: {0}")]
    MalformedOutput(String),

    #[error("Generation backend is not configured: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogLoadError {
    #[error("Doctor type catalog is empty")]
    Empty,

    #[error("Doctor type listed more than once: {0}")]
    Duplicate(String),

    #[error("Doctor type catalog unavailable: {0}")]
    Unavailable(String),
}

/// Rejected state transition. Mirrors a disabled control in the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Another {0} request is still in progress")]
    Busy(PendingOperation),

    #[error("Please generate precautions first.")]
    NoPrecautions,

    #[error("No {0} request is in progress")]
    NotPending(PendingOperation),
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Catalog(#[from] CatalogLoadError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
