use std::sync::Arc;

use tracing::{error, info};

use crate::{
    backend::{GenerationBackend, GenerationRequest},
    error::GenerationError,
    models::{PrecautionRequest, PrecautionResult},
    prompts::{PRECAUTIONS_PREAMBLE, decode_reply, precautions_prompt},
};

/// Turns a validated intake into the five categorized precautions.
///
/// One backend call per request, no retries. The returned fields are passed
/// through exactly as the model wrote them.
#[derive(Clone)]
pub struct PrecautionGenerator {
    backend: Arc<dyn GenerationBackend>,
}

impl PrecautionGenerator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub async fn generate(
        &self,
        request: &PrecautionRequest,
    ) -> Result<PrecautionResult, GenerationError> {
        info!(
            doctor_type = %request.doctor_type,
            has_report = request.report_reference.is_some(),
            "Generating precautions"
        );

        let generation = GenerationRequest::new(PRECAUTIONS_PREAMBLE, precautions_prompt(request))
            .with_attachment(request.report_reference.clone());

        let reply = self.backend.generate(generation).await.map_err(|e| {
            error!("Precaution generation failed: {}", e);
            e
        })?;

        let result: PrecautionResult = decode_reply(&reply).map_err(|e| {
            error!("Precaution reply rejected: {}", e);
            e
        })?;

        info!("Precautions generated");
        Ok(result)
    }
}
