//! Retrieval-QA backend (Perplexity)
//!
//! Two response shapes exist for this service:
//! - **chat**: free-text answer, judged by a keyword heuristic with fixed
//!   confidences (80 verified / 20 not). Coarse, kept as-is.
//! - **structured**: `/verify` returns a numeric score in 0..1 plus sources.
//!
//! Both are mapped to the canonical [`VerificationResult`] here.

use super::http::{chat, HttpTransport};
use super::{BackendError, VerificationBackend};
use crate::models::{Backend, VerificationResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use vh_common::config::{PerplexityConfig, PerplexityMode};

/// Score above which a structured answer counts as verified
pub const SCORE_THRESHOLD: f64 = 0.7;

pub const HEURISTIC_VERIFIED_CONFIDENCE: f64 = 80.0;
pub const HEURISTIC_UNVERIFIED_CONFIDENCE: f64 = 20.0;

const SYSTEM_PROMPT: &str = "You are an AI assistant tasked with verifying health claims. \
Analyze the given claim and provide a verification result.";

/// What the service answered, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalAnswer {
    Scored {
        score: f64,
        sources: Vec<String>,
        explanation: Option<String>,
    },
    Text(String),
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct StructuredResponse {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default, alias = "text")]
    answer: Option<String>,
}

impl StructuredResponse {
    fn into_answer(self) -> Result<RetrievalAnswer, BackendError> {
        match (self.score, self.answer) {
            (Some(score), _) => Ok(RetrievalAnswer::Scored {
                score,
                sources: self.sources,
                explanation: self.explanation,
            }),
            (None, Some(text)) => Ok(RetrievalAnswer::Text(text)),
            (None, None) => Err(BackendError::Malformed(
                "response has neither a score nor answer text".to_string(),
            )),
        }
    }
}

/// Keyword heuristic over free text
///
/// Verified when the lowercased text contains "verified" or
/// "supported by evidence". Note that "unverified" also matches.
pub fn text_indicates_verified(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("verified") || lower.contains("supported by evidence")
}

/// Map either answer shape to the canonical result
pub fn assess_answer(answer: RetrievalAnswer) -> VerificationResult {
    match answer {
        RetrievalAnswer::Scored {
            score,
            sources,
            explanation,
        } => VerificationResult {
            is_verified: score > SCORE_THRESHOLD,
            confidence: score * 100.0,
            explanation: explanation
                .unwrap_or_else(|| format!("Retrieval verification score {:.2}.", score)),
            sources,
        },
        RetrievalAnswer::Text(text) => {
            let is_verified = text_indicates_verified(&text);
            VerificationResult {
                is_verified,
                confidence: if is_verified {
                    HEURISTIC_VERIFIED_CONFIDENCE
                } else {
                    HEURISTIC_UNVERIFIED_CONFIDENCE
                },
                explanation: text,
                sources: Vec::new(),
            }
        }
    }
}

/// Structured-mode query for a claim
pub fn structured_query(claim: &str) -> String {
    format!(
        "Verify the following health claim against trusted scientific journals: {}",
        claim
    )
}

/// Perplexity API client
pub struct PerplexityClient {
    transport: Arc<HttpTransport>,
    mode: PerplexityMode,
    model: String,
}

impl PerplexityClient {
    pub fn new(
        config: &PerplexityConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let transport = Self::transport(config, api_key, timeout)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Transport for the retrieval service, shareable with the content analyzer
    pub fn transport(
        config: &PerplexityConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Arc<HttpTransport>, BackendError> {
        Ok(Arc::new(HttpTransport::new(
            api_key,
            &config.base_url,
            timeout,
            config.requests_per_second,
        )?))
    }

    pub fn with_transport(config: &PerplexityConfig, transport: Arc<HttpTransport>) -> Self {
        Self {
            transport,
            mode: config.mode,
            model: config.model.clone(),
        }
    }

    pub fn mode(&self) -> PerplexityMode {
        self.mode
    }

    async fn ask_chat(&self, claim: &str) -> Result<RetrievalAnswer, BackendError> {
        let user_prompt = format!("Verify the following health claim: \"{}\"", claim);
        let request = chat::ChatRequest {
            model: &self.model,
            messages: vec![
                chat::ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                chat::ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        let response: chat::ChatResponse = self
            .transport
            .post_json("/chat/completions", &request)
            .await?;

        response
            .into_first_content()
            .map(RetrievalAnswer::Text)
            .ok_or_else(|| BackendError::Malformed("chat response has no content".to_string()))
    }

    async fn ask_structured(&self, claim: &str) -> Result<RetrievalAnswer, BackendError> {
        let query = structured_query(claim);
        let response: StructuredResponse = self
            .transport
            .post_json("/verify", &VerifyRequest { query: &query })
            .await?;
        response.into_answer()
    }
}

#[async_trait]
impl VerificationBackend for PerplexityClient {
    fn backend(&self) -> Backend {
        Backend::Perplexity
    }

    fn is_configured(&self) -> bool {
        self.transport.has_credential()
    }

    async fn verify(&self, claim: &str) -> Result<VerificationResult, BackendError> {
        let answer = match self.mode {
            PerplexityMode::Chat => self.ask_chat(claim).await?,
            PerplexityMode::Structured => self.ask_structured(claim).await?,
        };

        debug!(
            mode = ?self.mode,
            scored = matches!(answer, RetrievalAnswer::Scored { .. }),
            "Perplexity answered"
        );

        Ok(assess_answer(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_verified_any_case() {
        let result = assess_answer(RetrievalAnswer::Text(
            "This claim is VERIFIED by multiple trials.".to_string(),
        ));
        assert!(result.is_verified);
        assert_eq!(result.confidence, 80.0);
        assert_eq!(
            result.explanation,
            "This claim is VERIFIED by multiple trials."
        );
    }

    #[test]
    fn test_heuristic_supported_by_evidence() {
        let result = assess_answer(RetrievalAnswer::Text(
            "The effect is Supported By Evidence from cohort studies.".to_string(),
        ));
        assert!(result.is_verified);
        assert_eq!(result.confidence, 80.0);
    }

    #[test]
    fn test_heuristic_otherwise_unverified() {
        let result = assess_answer(RetrievalAnswer::Text(
            "There is no scientific basis for this.".to_string(),
        ));
        assert!(!result.is_verified);
        assert_eq!(result.confidence, 20.0);
    }

    #[test]
    fn test_heuristic_is_deterministic() {
        let text = "Partially verified.".to_string();
        let first = assess_answer(RetrievalAnswer::Text(text.clone()));
        let second = assess_answer(RetrievalAnswer::Text(text));
        assert_eq!(first, second);
    }

    #[test]
    fn test_heuristic_substring_quirk() {
        // Substring match: "unverified" contains "verified"
        assert!(text_indicates_verified("This remains unverified."));
    }

    #[test]
    fn test_scored_answer() {
        let result = assess_answer(RetrievalAnswer::Scored {
            score: 0.85,
            sources: vec!["https://pubmed.example/1".to_string()],
            explanation: None,
        });
        assert!(result.is_verified);
        assert!((result.confidence - 85.0).abs() < 1e-9);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.explanation, "Retrieval verification score 0.85.");
    }

    #[test]
    fn test_scored_threshold_is_strict() {
        let result = assess_answer(RetrievalAnswer::Scored {
            score: 0.7,
            sources: vec![],
            explanation: Some("borderline".to_string()),
        });
        assert!(!result.is_verified);
        assert_eq!(result.explanation, "borderline");
    }

    #[test]
    fn test_structured_query_wording() {
        assert_eq!(
            structured_query("Meditation reduces cortisol levels"),
            "Verify the following health claim against trusted scientific journals: \
             Meditation reduces cortisol levels"
        );
    }

    #[test]
    fn test_structured_response_shapes() {
        let scored: StructuredResponse =
            serde_json::from_str(r#"{"score": 0.9, "sources": ["https://a"]}"#).unwrap();
        assert!(matches!(
            scored.into_answer().unwrap(),
            RetrievalAnswer::Scored { .. }
        ));

        let text: StructuredResponse =
            serde_json::from_str(r#"{"text": "supported by evidence"}"#).unwrap();
        assert_eq!(
            text.into_answer().unwrap(),
            RetrievalAnswer::Text("supported by evidence".to_string())
        );

        let empty: StructuredResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            empty.into_answer(),
            Err(BackendError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let client =
            PerplexityClient::new(&PerplexityConfig::default(), None, Duration::from_secs(5)).unwrap();
        assert!(!client.is_configured());
        assert_eq!(client.mode(), PerplexityMode::Chat);
        assert!(matches!(
            client.verify("claim").await,
            Err(BackendError::MissingCredential)
        ));
    }
}
