//! ConsultationRunner – drives one session through intake, precaution
//! generation and follow-up questions.
//!
//! Each operation follows the same shape: refuse if the control is disabled,
//! validate, mark the session busy, await the backend, then record the
//! outcome. State changes are applied
//! through [`SessionStorage::apply`], so an observer reading the session
//! mid-call sees the disabled control and, for questions, the user's entry
//! already in the transcript.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    advisor::InteractiveAdvisor,
    catalog::DoctorTypeCatalog,
    error::{FlowError, Result},
    generator::PrecautionGenerator,
    models::{InteractiveAnswer, InteractiveQuery, IntakeForm, PrecautionResult},
    state::ConsultationAction,
    storage::{Session, SessionStorage},
    validation::{validate_intake, validate_question},
};

#[derive(Clone)]
pub struct ConsultationRunner {
    generator: PrecautionGenerator,
    advisor: InteractiveAdvisor,
    catalog: Arc<dyn DoctorTypeCatalog>,
    storage: Arc<dyn SessionStorage>,
}

impl ConsultationRunner {
    pub fn new(
        generator: PrecautionGenerator,
        advisor: InteractiveAdvisor,
        catalog: Arc<dyn DoctorTypeCatalog>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        Self {
            generator,
            advisor,
            catalog,
            storage,
        }
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    pub fn catalog(&self) -> &Arc<dyn DoctorTypeCatalog> {
        &self.catalog
    }

    /// Start a session and load the selectable doctor types into it.
    /// A catalog failure is recorded on the session rather than returned.
    pub async fn open(&self) -> Result<Session> {
        let session = Session::new();
        let session_id = session.id.clone();
        self.storage.save(session).await?;

        let action = match self.catalog.doctor_types().await {
            Ok(doctor_types) => ConsultationAction::DoctorTypesLoaded(doctor_types),
            Err(e) => {
                error!(session_id = %session_id, "Failed to load doctor types: {}", e);
                ConsultationAction::DoctorTypesFailed(e.to_string())
            }
        };

        let session = self.storage.apply(&session_id, action).await?;
        info!(session_id = %session_id, "Consultation session opened");
        Ok(session)
    }

    pub async fn session(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))
    }

    pub async fn close(&self, session_id: &str) -> Result<()> {
        self.session(session_id).await?;
        self.storage.delete(session_id).await?;
        info!(session_id = %session_id, "Consultation session closed");
        Ok(())
    }

    pub async fn dismiss_error(&self, session_id: &str) -> Result<Session> {
        self.storage
            .apply(session_id, ConsultationAction::ErrorDismissed)
            .await
    }

    /// Validate the intake form and generate precautions for it.
    pub async fn submit(&self, session_id: &str, form: IntakeForm) -> Result<PrecautionResult> {
        info!(session_id = %session_id, doctor_type = %form.doctor_type, "Intake submitted");

        // a busy session reports Busy, whatever the form holds
        self.session(session_id).await?.state.ensure_can_submit()?;

        let request = match validate_intake(&form) {
            Ok(request) => request,
            Err(validation) => {
                warn!(
                    session_id = %session_id,
                    errors = validation.errors.len(),
                    "Intake rejected"
                );
                self.storage
                    .apply(
                        session_id,
                        ConsultationAction::IntakeRejected {
                            form,
                            errors: validation.errors.clone(),
                        },
                    )
                    .await?;
                return Err(validation.into());
            }
        };

        self.storage
            .apply(session_id, ConsultationAction::PrecautionsRequested(form))
            .await?;

        match self.generator.generate(&request).await {
            Ok(result) => {
                self.record(
                    session_id,
                    ConsultationAction::PrecautionsGenerated(result.clone()),
                )
                .await?;
                info!(session_id = %session_id, "Precautions ready");
                Ok(result)
            }
            Err(e) => {
                self.record(session_id, ConsultationAction::PrecautionsFailed(e.to_string()))
                    .await?;
                Err(e.into())
            }
        }
    }

    /// Answer a follow-up question against the session's current precautions.
    pub async fn ask(&self, session_id: &str, question: &str) -> Result<InteractiveAnswer> {
        self.session(session_id).await?.state.ensure_can_ask()?;
        let question = validate_question(question)?.to_string();

        let session = self
            .storage
            .apply(session_id, ConsultationAction::QuestionAsked(question.clone()))
            .await?;

        // QuestionAsked only succeeds once precautions exist
        let prior_advice_text = session
            .state
            .precautions
            .as_ref()
            .map(PrecautionResult::advice_text)
            .unwrap_or_default();

        info!(
            session_id = %session_id,
            turn = session.state.transcript.len(),
            "Follow-up question asked"
        );

        let query = InteractiveQuery {
            prior_advice_text,
            question,
        };

        match self.advisor.answer(&query).await {
            Ok(answer) => {
                self.record(
                    session_id,
                    ConsultationAction::AnswerReceived(answer.response_text.clone()),
                )
                .await?;
                Ok(answer)
            }
            Err(e) => {
                self.record(session_id, ConsultationAction::FollowUpFailed(e.to_string()))
                    .await?;
                Err(e.into())
            }
        }
    }

    /// Record the outcome of a backend call. If the session went away while
    /// the call was in flight, the outcome is dropped.
    async fn record(&self, session_id: &str, action: ConsultationAction) -> Result<()> {
        let name = action.name();
        match self.storage.apply(session_id, action).await {
            Ok(_) => Ok(()),
            Err(FlowError::SessionNotFound(_)) => {
                warn!(session_id = %session_id, action = name, "Session closed before result arrived; dropping it");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
