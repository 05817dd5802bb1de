use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{FlowError, Result},
    state::{ConsultationAction, ConsultationState},
};

/// One patient's consultation, alive until it is deleted or the process exits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub state: ConsultationState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            state: ConsultationState::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;

    /// Dispatch `action` against the stored state as one atomic step and
    /// return the updated session.
    async fn apply(&self, id: &str, action: ConsultationAction) -> Result<Session>;
}

/// In-memory implementation of SessionStorage
#[derive(Clone, Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn apply(&self, id: &str, action: ConsultationAction) -> Result<Session> {
        let mut entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| FlowError::SessionNotFound(id.to_string()))?;

        entry.state.dispatch(action)?;

        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TransitionError, models::IntakeForm};

    #[tokio::test]
    async fn save_get_delete() {
        let storage = InMemorySessionStorage::new();
        let session = Session::new();
        let id = session.id.clone();

        storage.save(session).await.unwrap();
        assert!(storage.get(&id).await.unwrap().is_some());

        storage.delete(&id).await.unwrap();
        assert!(storage.get(&id).await.unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn apply_updates_stored_state() {
        let storage = InMemorySessionStorage::new();
        let session = Session::new();
        let id = session.id.clone();
        storage.save(session).await.unwrap();

        let updated = storage
            .apply(&id, ConsultationAction::PrecautionsRequested(IntakeForm::default()))
            .await
            .unwrap();
        assert!(!updated.state.can_submit());

        let stored = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.state, updated.state);
    }

    #[tokio::test]
    async fn rejected_action_leaves_stored_state_alone() {
        let storage = InMemorySessionStorage::new();
        let session = Session::new();
        let id = session.id.clone();
        storage.save(session).await.unwrap();

        let err = storage
            .apply(&id, ConsultationAction::QuestionAsked("hello?".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::Transition(TransitionError::NoPrecautions)
        ));
        assert!(storage.get(&id).await.unwrap().unwrap().state.transcript.is_empty());
    }

    #[tokio::test]
    async fn apply_to_missing_session_fails() {
        let storage = InMemorySessionStorage::new();
        let err = storage
            .apply("missing", ConsultationAction::ErrorDismissed)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::SessionNotFound(id) if id == "missing"));
    }
}
