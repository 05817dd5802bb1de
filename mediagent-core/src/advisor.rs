use std::sync::Arc;

use tracing::{error, info};

use crate::{
    backend::{GenerationBackend, GenerationRequest},
    error::GenerationError,
    models::{InteractiveAnswer, InteractiveQuery},
    prompts::{ADVISOR_PREAMBLE, decode_reply, follow_up_prompt},
};

/// Answers follow-up questions about precautions already given.
/// Stateless: each call carries all the context the model gets.
#[derive(Clone)]
pub struct InteractiveAdvisor {
    backend: Arc<dyn GenerationBackend>,
}

impl InteractiveAdvisor {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub async fn answer(
        &self,
        query: &InteractiveQuery,
    ) -> Result<InteractiveAnswer, GenerationError> {
        info!(question_chars = query.question.len(), "Answering follow-up question");

        let generation = GenerationRequest::new(ADVISOR_PREAMBLE, follow_up_prompt(query));
        let reply = self.backend.generate(generation).await.map_err(|e| {
            error!("Follow-up generation failed: {}", e);
            e
        })?;

        decode_reply(&reply)
    }
}
