//! Generative LLM backend (OpenAI)
//!
//! Prompts a chat model with a fixed template demanding a JSON verdict and
//! parses the reply as-is. A reply that is not valid JSON is a malformed
//! response, never a panic.

use super::http::{chat, HttpTransport};
use super::{BackendError, VerificationBackend};
use crate::models::{Backend, VerificationResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use vh_common::config::OpenAiConfig;

/// Build the fixed verification prompt for a claim
pub fn build_prompt(claim: &str) -> String {
    format!(
        "Verify the following health claim and provide scientific evidence: \"{}\"\n\
         Format your response as JSON with the following fields:\n\
         - isVerified (boolean)\n\
         - confidence (number between 0-100)\n\
         - explanation (string)\n\
         - sources (array of URLs, optional)\n\
         Respond with the JSON object only.",
        claim
    )
}

/// Parse the model's raw text into a verdict
pub fn parse_verdict(text: &str) -> Result<VerificationResult, BackendError> {
    serde_json::from_str(text.trim()).map_err(|e| BackendError::Malformed(e.to_string()))
}

/// OpenAI chat completion client
pub struct OpenAiClient {
    transport: HttpTransport,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        config: &OpenAiConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            transport: HttpTransport::new(
                api_key,
                &config.base_url,
                timeout,
                config.requests_per_second,
            )?,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl VerificationBackend for OpenAiClient {
    fn backend(&self) -> Backend {
        Backend::OpenAi
    }

    fn is_configured(&self) -> bool {
        self.transport.has_credential()
    }

    async fn verify(&self, claim: &str) -> Result<VerificationResult, BackendError> {
        let prompt = build_prompt(claim);
        let request = chat::ChatRequest {
            model: &self.model,
            messages: vec![chat::ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response: chat::ChatResponse = self
            .transport
            .post_json("/chat/completions", &request)
            .await?;

        let text = response
            .into_first_content()
            .ok_or_else(|| BackendError::Malformed("completion has no content".to_string()))?;

        debug!(model = %self.model, chars = text.len(), "OpenAI completion received");

        parse_verdict(&text)
    }
}
