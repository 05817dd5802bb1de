use chrono::{DateTime, Utc};
use mediagent_core::{
    ChatEntry, DoctorType, FieldError, IntakeForm, PendingOperation, PrecautionResult, Session,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub session_id: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecautionsResponse {
    pub session_id: String,
    pub precautions: PrecautionResult,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationResponse {
    pub session_id: String,
    pub narration: String,
}

/// Everything the form needs to render one session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub doctor_types: Vec<DoctorType>,
    pub form: IntakeForm,
    pub field_errors: Vec<FieldError>,
    pub precautions: Option<PrecautionResult>,
    pub transcript: Vec<ChatEntry>,
    pub error: Option<String>,
    pub pending: Option<PendingOperation>,
    pub can_submit: bool,
    pub can_chat: bool,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        let can_submit = session.state.can_submit();
        let can_chat = session.state.can_chat();
        let state = session.state;

        Self {
            session_id: session.id,
            created_at: session.created_at,
            doctor_types: state.doctor_types,
            form: state.form,
            field_errors: state.field_errors,
            precautions: state.precautions,
            transcript: state.transcript.entries().to_vec(),
            error: state.error,
            pending: state.pending,
            can_submit,
            can_chat,
        }
    }
}
