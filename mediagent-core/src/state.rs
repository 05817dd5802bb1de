//! Per-session consultation state.
//!
//! Every change goes through [`ConsultationState::dispatch`], so the sequence of
//! actions applied to a session fully explains what the patient sees: the form
//! values, inline field errors, the precautions, the follow-up transcript, the
//! error banner and which control is currently disabled.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{FieldError, TransitionError},
    models::{ChatTranscript, DoctorType, IntakeForm, PrecautionResult, Speaker},
};

pub const CATALOG_LOAD_FAILED: &str = "Failed to load doctor types.";
pub const PRECAUTIONS_FAILED: &str = "Failed to generate precautions.";

/// The backend call currently in flight for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PendingOperation {
    Precautions,
    FollowUp,
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingOperation::Precautions => write!(f, "precautions"),
            PendingOperation::FollowUp => write!(f, "follow-up"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsultationAction {
    DoctorTypesLoaded(Vec<DoctorType>),
    DoctorTypesFailed(String),
    IntakeRejected {
        form: IntakeForm,
        errors: Vec<FieldError>,
    },
    PrecautionsRequested(IntakeForm),
    PrecautionsGenerated(PrecautionResult),
    PrecautionsFailed(String),
    QuestionAsked(String),
    AnswerReceived(String),
    FollowUpFailed(String),
    ErrorDismissed,
}

impl ConsultationAction {
    pub fn name(&self) -> &'static str {
        match self {
            ConsultationAction::DoctorTypesLoaded(_) => "doctor_types_loaded",
            ConsultationAction::DoctorTypesFailed(_) => "doctor_types_failed",
            ConsultationAction::IntakeRejected { .. } => "intake_rejected",
            ConsultationAction::PrecautionsRequested(_) => "precautions_requested",
            ConsultationAction::PrecautionsGenerated(_) => "precautions_generated",
            ConsultationAction::PrecautionsFailed(_) => "precautions_failed",
            ConsultationAction::QuestionAsked(_) => "question_asked",
            ConsultationAction::AnswerReceived(_) => "answer_received",
            ConsultationAction::FollowUpFailed(_) => "follow_up_failed",
            ConsultationAction::ErrorDismissed => "error_dismissed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationState {
    pub doctor_types: Vec<DoctorType>,
    pub form: IntakeForm,
    pub field_errors: Vec<FieldError>,
    pub precautions: Option<PrecautionResult>,
    pub transcript: ChatTranscript,
    /// Dismissible error banner
    pub error: Option<String>,
    pub pending: Option<PendingOperation>,
}

impl ConsultationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_submit(&self) -> bool {
        self.pending.is_none()
    }

    pub fn can_chat(&self) -> bool {
        self.precautions.is_some() && self.pending.is_none()
    }

    /// Apply one action. A rejected action leaves the state untouched.
    pub fn dispatch(&mut self, action: ConsultationAction) -> Result<(), TransitionError> {
        debug!(action = action.name(), pending = ?self.pending, "Applying consultation action");

        match action {
            ConsultationAction::DoctorTypesLoaded(doctor_types) => {
                self.doctor_types = doctor_types;
            }
            ConsultationAction::DoctorTypesFailed(message) => {
                debug!("Doctor type catalog failed: {}", message);
                self.doctor_types.clear();
                self.error = Some(CATALOG_LOAD_FAILED.to_string());
            }
            ConsultationAction::IntakeRejected { form, errors } => {
                self.ensure_can_submit()?;
                self.form = form;
                self.field_errors = errors;
            }
            ConsultationAction::PrecautionsRequested(form) => {
                self.ensure_can_submit()?;
                self.form = form;
                self.field_errors.clear();
                self.error = None;
                self.pending = Some(PendingOperation::Precautions);
            }
            ConsultationAction::PrecautionsGenerated(result) => {
                self.finish(PendingOperation::Precautions)?;
                self.precautions = Some(result);
                self.transcript.clear();
            }
            ConsultationAction::PrecautionsFailed(message) => {
                self.finish(PendingOperation::Precautions)?;
                self.error = Some(non_empty_or(message, PRECAUTIONS_FAILED));
            }
            ConsultationAction::QuestionAsked(question) => {
                self.ensure_can_ask()?;
                self.error = None;
                self.transcript.push(Speaker::User, question);
                self.pending = Some(PendingOperation::FollowUp);
            }
            ConsultationAction::AnswerReceived(answer) => {
                self.finish(PendingOperation::FollowUp)?;
                self.transcript.push(Speaker::Assistant, answer);
            }
            ConsultationAction::FollowUpFailed(message) => {
                self.finish(PendingOperation::FollowUp)?;
                self.error = Some(non_empty_or(message, "Failed to answer your question."));
            }
            ConsultationAction::ErrorDismissed => {
                self.error = None;
            }
        }

        Ok(())
    }

    /// The reason the intake form is disabled, if it is.
    pub fn ensure_can_submit(&self) -> Result<(), TransitionError> {
        match self.pending {
            Some(operation) => Err(TransitionError::Busy(operation)),
            None => Ok(()),
        }
    }

    /// The reason the chat input is disabled, if it is.
    pub fn ensure_can_ask(&self) -> Result<(), TransitionError> {
        if self.precautions.is_none() {
            return Err(TransitionError::NoPrecautions);
        }
        self.ensure_can_submit()
    }

    fn finish(&mut self, operation: PendingOperation) -> Result<(), TransitionError> {
        if self.pending != Some(operation) {
            return Err(TransitionError::NotPending(operation));
        }
        self.pending = None;
        Ok(())
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntakeField;

    fn form() -> IntakeForm {
        IntakeForm {
            symptoms: "I have a severe headache and nausea".to_string(),
            doctor_type: "Neurologist".to_string(),
            report_url: None,
        }
    }

    fn result(tag: &str) -> PrecautionResult {
        PrecautionResult {
            diet_precautions: format!("{tag} diet"),
            sleep_precautions: format!("{tag} sleep"),
            physical_precautions: format!("{tag} physical"),
            mental_precautions: format!("{tag} mental"),
            things_to_avoid: format!("{tag} avoid"),
        }
    }

    fn with_precautions() -> ConsultationState {
        let mut state = ConsultationState::new();
        state
            .dispatch(ConsultationAction::PrecautionsRequested(form()))
            .unwrap();
        state
            .dispatch(ConsultationAction::PrecautionsGenerated(result("first")))
            .unwrap();
        state
    }

    #[test]
    fn chat_is_enabled_only_after_precautions_exist() {
        let mut state = ConsultationState::new();
        assert!(!state.can_chat());
        assert_eq!(
            state.dispatch(ConsultationAction::QuestionAsked("hi".to_string())),
            Err(TransitionError::NoPrecautions)
        );

        state
            .dispatch(ConsultationAction::PrecautionsRequested(form()))
            .unwrap();
        assert!(!state.can_submit());
        assert!(!state.can_chat());

        state
            .dispatch(ConsultationAction::PrecautionsGenerated(result("first")))
            .unwrap();
        assert!(state.can_submit());
        assert!(state.can_chat());
    }

    #[test]
    fn question_is_appended_before_the_answer() {
        let mut state = with_precautions();

        state
            .dispatch(ConsultationAction::QuestionAsked("Can I drink coffee?".to_string()))
            .unwrap();
        assert_eq!(state.transcript.len(), 1);
        assert_eq!(state.transcript.entries()[0].speaker, Speaker::User);
        assert_eq!(state.pending, Some(PendingOperation::FollowUp));

        state
            .dispatch(ConsultationAction::AnswerReceived("Better not.".to_string()))
            .unwrap();
        assert_eq!(state.transcript.len(), 2);
        assert_eq!(state.transcript.entries()[1].speaker, Speaker::Assistant);
        assert_eq!(state.transcript.entries()[1].text, "Better not.");
    }

    #[test]
    fn failed_generation_keeps_previous_result_and_transcript() {
        let mut state = with_precautions();
        state
            .dispatch(ConsultationAction::QuestionAsked("Can I drink coffee?".to_string()))
            .unwrap();
        state
            .dispatch(ConsultationAction::AnswerReceived("Better not.".to_string()))
            .unwrap();
        let before = state.clone();

        state
            .dispatch(ConsultationAction::PrecautionsRequested(form()))
            .unwrap();
        state
            .dispatch(ConsultationAction::PrecautionsFailed("model unavailable".to_string()))
            .unwrap();

        assert_eq!(state.precautions, before.precautions);
        assert_eq!(state.transcript, before.transcript);
        assert_eq!(state.error.as_deref(), Some("model unavailable"));
        assert!(state.can_submit());
    }

    #[test]
    fn new_precautions_clear_the_transcript() {
        let mut state = with_precautions();
        state
            .dispatch(ConsultationAction::QuestionAsked("Can I drink coffee?".to_string()))
            .unwrap();
        state
            .dispatch(ConsultationAction::AnswerReceived("Better not.".to_string()))
            .unwrap();

        state
            .dispatch(ConsultationAction::PrecautionsRequested(form()))
            .unwrap();
        state
            .dispatch(ConsultationAction::PrecautionsGenerated(result("second")))
            .unwrap();

        assert!(state.transcript.is_empty());
        assert_eq!(
            state.precautions.as_ref().map(|p| p.diet_precautions.as_str()),
            Some("second diet")
        );
    }

    #[test]
    fn concurrent_operations_are_rejected() {
        let mut state = with_precautions();
        state
            .dispatch(ConsultationAction::QuestionAsked("first?".to_string()))
            .unwrap();

        assert_eq!(
            state.dispatch(ConsultationAction::QuestionAsked("second?".to_string())),
            Err(TransitionError::Busy(PendingOperation::FollowUp))
        );
        assert_eq!(
            state.dispatch(ConsultationAction::PrecautionsRequested(form())),
            Err(TransitionError::Busy(PendingOperation::FollowUp))
        );
        assert_eq!(state.transcript.len(), 1);
    }

    #[test]
    fn follow_up_failure_leaves_question_and_sets_banner() {
        let mut state = with_precautions();
        state
            .dispatch(ConsultationAction::QuestionAsked("Can I drink coffee?".to_string()))
            .unwrap();
        state
            .dispatch(ConsultationAction::FollowUpFailed(String::new()))
            .unwrap();

        assert_eq!(state.transcript.len(), 1);
        assert_eq!(state.error.as_deref(), Some("Failed to answer your question."));
        assert!(state.can_chat());

        state.dispatch(ConsultationAction::ErrorDismissed).unwrap();
        assert!(state.error.is_none());
    }

    #[test]
    fn stale_completion_is_rejected() {
        let mut state = ConsultationState::new();
        assert_eq!(
            state.dispatch(ConsultationAction::PrecautionsGenerated(result("late"))),
            Err(TransitionError::NotPending(PendingOperation::Precautions))
        );
        assert!(state.precautions.is_none());
    }

    #[test]
    fn rejected_intake_only_touches_form_fields() {
        let mut state = with_precautions();
        let errors = vec![FieldError::new(
            IntakeField::Symptoms,
            "Symptoms must be at least 2 characters.",
        )];
        state
            .dispatch(ConsultationAction::IntakeRejected {
                form: IntakeForm::default(),
                errors: errors.clone(),
            })
            .unwrap();

        assert_eq!(state.field_errors, errors);
        assert!(state.precautions.is_some());
        assert!(state.can_submit());
    }

    #[test]
    fn rejected_intake_while_generating_is_busy() {
        let mut state = with_precautions();
        let in_flight = form();
        state
            .dispatch(ConsultationAction::PrecautionsRequested(in_flight.clone()))
            .unwrap();

        assert_eq!(
            state.dispatch(ConsultationAction::IntakeRejected {
                form: IntakeForm::default(),
                errors: vec![FieldError::new(IntakeField::Symptoms, "too short")],
            }),
            Err(TransitionError::Busy(PendingOperation::Precautions))
        );
        assert_eq!(state.form, in_flight);
        assert!(state.field_errors.is_empty());
    }

    #[test]
    fn catalog_failure_sets_banner() {
        let mut state = ConsultationState::new();
        state
            .dispatch(ConsultationAction::DoctorTypesFailed("lookup down".to_string()))
            .unwrap();
        assert_eq!(state.error.as_deref(), Some(CATALOG_LOAD_FAILED));
        assert!(state.doctor_types.is_empty());
    }
}
