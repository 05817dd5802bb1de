use async_trait::async_trait;
use rig::{client::CompletionClient, completion::Prompt, providers::openrouter};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{GenerationBackend, GenerationRequest};
use crate::{error::GenerationError, models::ReportReference};

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

const CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// OpenRouter-hosted model.
///
/// Plain prompts go through a `rig` agent. Prompts carrying a report are sent
/// as a multimodal chat completion, since the attachment has to travel as its
/// own content part.
pub struct OpenRouterBackend {
    api_key: String,
    model: String,
    max_tokens: u32,
    client: openrouter::Client,
    http: reqwest::Client,
}

impl OpenRouterBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::Configuration(
                "OPENROUTER_API_KEY is empty".to_string(),
            ));
        }

        Ok(Self {
            client: openrouter::Client::new(&api_key),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            http: reqwest::Client::new(),
        })
    }

    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key = std::env::var("OPENROUTER_API_KEY").map_err(|_| {
            GenerationError::Configuration("OPENROUTER_API_KEY not set".to_string())
        })?;
        Self::new(api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn prompt_agent(&self, preamble: &str, prompt: &str) -> Result<String, GenerationError> {
        let agent = self.client.agent(&self.model).preamble(preamble).build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))
    }

    async fn complete_with_attachment(
        &self,
        preamble: &str,
        prompt: &str,
        attachment: &ReportReference,
    ) -> Result<String, GenerationError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": preamble },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        attachment_part(attachment),
                    ]
                }
            ],
            "max_tokens": self.max_tokens
        });

        let response = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GenerationError::Backend(format!(
                "LLM API request failed: {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        completion_text(&body)
    }
}

#[async_trait]
impl GenerationBackend for OpenRouterBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        debug!(model = %self.model, has_attachment = request.attachment.is_some(), "Sending generation request");

        let reply = match &request.attachment {
            Some(attachment) => {
                self.complete_with_attachment(&request.preamble, &request.prompt, attachment)
                    .await?
            }
            None => self.prompt_agent(&request.preamble, &request.prompt).await?,
        };

        info!(model = %self.model, chars = reply.len(), "Generation request completed");
        Ok(reply)
    }
}

/// PDFs go as a `file` part, anything else as an image URL.
fn attachment_part(attachment: &ReportReference) -> Value {
    if attachment.is_pdf() {
        json!({
            "type": "file",
            "file": {
                "filename": "report.pdf",
                "file_data": attachment.as_str()
            }
        })
    } else {
        json!({
            "type": "image_url",
            "image_url": { "url": attachment.as_str() }
        })
    }
}

fn completion_text(body: &Value) -> Result<String, GenerationError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GenerationError::MalformedOutput("Invalid response format from LLM".to_string()))
}
