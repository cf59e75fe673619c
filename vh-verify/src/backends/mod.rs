//! Verification backends
//!
//! One adapter per external service. Every adapter implements
//! [`VerificationBackend`] and returns the canonical [`VerificationResult`].
//!
//! # Backends
//! 1. **consensus** - literature search, verdict from supporting-paper ratio
//! 2. **perplexity** - retrieval-QA, graded score or keyword heuristic
//! 3. **openai** - generative LLM asked for a strict JSON verdict
//!
//! Failures are reported as [`BackendError`] and never panic. The aggregator
//! turns them into sentinel results.

pub mod consensus;
pub mod http;
pub mod openai;
pub mod perplexity;

pub use consensus::ConsensusClient;
pub use openai::OpenAiClient;
pub use perplexity::PerplexityClient;

use crate::models::{Backend, VerificationResult};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Backend call errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// No credential configured; no request was attempted
    #[error("API key is not configured")]
    MissingCredential,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    #[error("No response within {}s", .0.as_secs())]
    Timeout(Duration),

    /// Payload could not be read into the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Failure class reported in logs and sentinel explanations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Transport,
    MalformedResponse,
}

impl BackendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendError::MissingCredential => FailureKind::Configuration,
            BackendError::Transport(_)
            | BackendError::Status(_, _)
            | BackendError::Timeout(_) => FailureKind::Transport,
            BackendError::Malformed(_) => FailureKind::MalformedResponse,
        }
    }

    /// Human-readable sentinel explanation naming the backend and failure class
    pub fn explain(&self, backend: Backend) -> String {
        match self {
            BackendError::MissingCredential => format!(
                "{} could not verify the claim: API key is not configured",
                backend
            ),
            BackendError::Transport(e) => format!("{} request failed: {}", backend, e),
            BackendError::Status(code, _) => {
                format!("{} request failed: HTTP status {}", backend, code)
            }
            BackendError::Timeout(limit) => format!(
                "{} did not respond within {}s",
                backend,
                limit.as_secs()
            ),
            BackendError::Malformed(e) => {
                format!("{} returned an unreadable response: {}", backend, e)
            }
        }
    }
}

/// A single external verification service
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// Which of the three services this is
    fn backend(&self) -> Backend;

    /// Whether a credential is available (no network check)
    fn is_configured(&self) -> bool {
        true
    }

    /// Ask the service for a verdict on one claim
    ///
    /// # Errors
    /// Returns `BackendError` on missing credential, transport failure,
    /// or an unreadable payload.
    async fn verify(&self, claim: &str) -> Result<VerificationResult, BackendError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// What a mock backend should do when called
    pub enum MockBehavior {
        Succeed(VerificationResult),
        Fail(fn() -> BackendError),
        Sleep(Duration, VerificationResult),
    }

    /// Scriptable backend for aggregator tests
    pub struct MockBackend {
        pub backend: Backend,
        pub behavior: MockBehavior,
        pub calls: Arc<AtomicUsize>,
    }

    impl MockBackend {
        pub fn succeeding(backend: Backend, is_verified: bool, confidence: f64) -> Self {
            Self {
                backend,
                behavior: MockBehavior::Succeed(VerificationResult {
                    is_verified,
                    confidence,
                    explanation: format!("{} mock verdict", backend),
                    sources: Vec::new(),
                }),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(backend: Backend, error: fn() -> BackendError) -> Self {
            Self {
                backend,
                behavior: MockBehavior::Fail(error),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn slow(backend: Backend, delay: Duration, confidence: f64) -> Self {
            Self {
                backend,
                behavior: MockBehavior::Sleep(
                    delay,
                    VerificationResult {
                        is_verified: true,
                        confidence,
                        explanation: "slow".to_string(),
                        sources: Vec::new(),
                    },
                ),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl VerificationBackend for MockBackend {
        fn backend(&self) -> Backend {
            self.backend
        }

        async fn verify(&self, _claim: &str) -> Result<VerificationResult, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                MockBehavior::Succeed(result) => Ok(result.clone()),
                MockBehavior::Fail(make_error) => Err(make_error()),
                MockBehavior::Sleep(delay, result) => {
                    tokio::time::sleep(*delay).await;
                    Ok(result.clone())
                }
            }
        }
    }
}
