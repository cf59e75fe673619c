//! Verification data model
//!
//! Every backend adapter produces the same [`VerificationResult`] shape.
//! Backend-specific scoring quirks stay inside the adapters.

use serde::{Deserialize, Serialize};

/// One of the three external verification services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Literature search (Consensus-style)
    Consensus,
    /// Retrieval-QA (Perplexity-style)
    Perplexity,
    /// Generative LLM check
    #[serde(rename = "OpenAI")]
    OpenAi,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Consensus, Backend::Perplexity, Backend::OpenAi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Consensus => "Consensus",
            Backend::Perplexity => "Perplexity",
            Backend::OpenAi => "OpenAI",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict from a single backend for a single claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_verified: bool,

    /// Nominally 0-100. Not clamped: a misbehaving backend can exceed the range.
    pub confidence: f64,

    pub explanation: String,

    /// Supporting URLs (may be empty)
    #[serde(default)]
    pub sources: Vec<String>,
}

impl VerificationResult {
    /// Placeholder substituted when a backend call fails
    pub fn sentinel(explanation: impl Into<String>) -> Self {
        Self {
            is_verified: false,
            confidence: 0.0,
            explanation: explanation.into(),
            sources: Vec::new(),
        }
    }
}

/// Combined verdict of all three backends for one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateVerification {
    pub claim: String,
    pub consensus: VerificationResult,
    pub perplexity: VerificationResult,
    pub openai: VerificationResult,

    /// Unweighted mean of the three confidences, sentinel zeros included
    pub aggregate_score: f64,

    /// Backends whose result is a sentinel
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<Backend>,
}

impl AggregateVerification {
    pub fn result_for(&self, backend: Backend) -> &VerificationResult {
        match backend {
            Backend::Consensus => &self.consensus,
            Backend::Perplexity => &self.perplexity,
            Backend::OpenAi => &self.openai,
        }
    }

    /// True when at least one backend could not be reached
    pub fn is_degraded(&self) -> bool {
        !self.unavailable.is_empty()
    }
}

/// Unweighted arithmetic mean; 0 for an empty slice
pub fn mean_confidence(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    confidences.iter().sum::<f64>() / confidences.len() as f64
}
