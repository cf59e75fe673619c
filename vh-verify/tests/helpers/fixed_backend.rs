//! In-process backends with a fixed verdict

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vh_verify::backends::{BackendError, VerificationBackend};
use vh_verify::models::{Backend, VerificationResult};
use vh_verify::{ClaimVerifier, VerifierSettings};

pub struct FixedBackend {
    backend: Backend,
    verdict: Option<VerificationResult>,
    pub calls: Arc<AtomicUsize>,
}

impl FixedBackend {
    pub fn verdict(backend: Backend, is_verified: bool, confidence: f64) -> Self {
        Self {
            backend,
            verdict: Some(VerificationResult {
                is_verified,
                confidence,
                explanation: format!("{} fixed verdict", backend),
                sources: vec![format!("https://{}.example/source", backend.as_str().to_lowercase())],
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fails as if the service refused the connection
    pub fn unreachable(backend: Backend) -> Self {
        Self {
            backend,
            verdict: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl VerificationBackend for FixedBackend {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn verify(&self, _claim: &str) -> Result<VerificationResult, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
            .clone()
            .ok_or_else(|| BackendError::Transport("connection refused".to_string()))
    }
}

/// Verifier whose three backends answer with the given confidences
pub fn fixed_verifier(consensus: f64, perplexity: f64, openai: f64) -> ClaimVerifier {
    ClaimVerifier::new(
        Arc::new(FixedBackend::verdict(Backend::Consensus, true, consensus)),
        Arc::new(FixedBackend::verdict(Backend::Perplexity, true, perplexity)),
        Arc::new(FixedBackend::verdict(Backend::OpenAi, true, openai)),
        VerifierSettings {
            call_timeout: Duration::from_secs(5),
            max_concurrent_claims: 4,
        },
    )
}
