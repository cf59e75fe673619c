//! Claim Verification Aggregator
//!
//! Queries all three backends concurrently for one claim, isolates each
//! backend's failure behind a sentinel result, and averages the three
//! confidences into one aggregate score.
//!
//! # Failure policy
//! Uniform graceful degradation: a backend that is unconfigured, unreachable,
//! slow, or returns garbage contributes a sentinel (confidence 0, unverified).
//! The mean is always taken over all three, so a failed backend pulls the
//! aggregate down rather than being excluded. Only an empty claim is rejected.

use crate::backends::http::HttpTransport;
use crate::backends::{
    BackendError, ConsensusClient, OpenAiClient, PerplexityClient, VerificationBackend,
};
use crate::config::Credentials;
use crate::models::{mean_confidence, AggregateVerification, Backend, VerificationResult};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use vh_common::config::TomlConfig;

/// Aggregator errors (input errors only; backend failures never surface here)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Claim must not be empty")]
    EmptyClaim,
}

/// Aggregator tuning
#[derive(Debug, Clone, Copy)]
pub struct VerifierSettings {
    /// Ceiling for any single backend call
    pub call_timeout: Duration,
    /// Claims in flight during `verify_many`
    pub max_concurrent_claims: usize,
}

impl VerifierSettings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            call_timeout: Duration::from_secs(config.verification.timeout_seconds),
            max_concurrent_claims: config.verification.max_concurrent_claims,
        }
    }
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}

/// Outcome of one isolated backend call
struct BackendOutcome {
    result: VerificationResult,
    failed: bool,
}

/// Multi-backend claim verifier
pub struct ClaimVerifier {
    consensus: Arc<dyn VerificationBackend>,
    perplexity: Arc<dyn VerificationBackend>,
    openai: Arc<dyn VerificationBackend>,
    settings: VerifierSettings,
}

impl ClaimVerifier {
    pub fn new(
        consensus: Arc<dyn VerificationBackend>,
        perplexity: Arc<dyn VerificationBackend>,
        openai: Arc<dyn VerificationBackend>,
        settings: VerifierSettings,
    ) -> Self {
        debug_assert_eq!(consensus.backend(), Backend::Consensus);
        debug_assert_eq!(perplexity.backend(), Backend::Perplexity);
        debug_assert_eq!(openai.backend(), Backend::OpenAi);

        Self {
            consensus,
            perplexity,
            openai,
            settings: VerifierSettings {
                max_concurrent_claims: settings.max_concurrent_claims.max(1),
                ..settings
            },
        }
    }

    /// Build the production verifier from bootstrap config and resolved keys
    ///
    /// Missing keys do not fail construction; those backends yield sentinels.
    pub fn from_config(
        config: &TomlConfig,
        credentials: &Credentials,
    ) -> Result<Self, BackendError> {
        let timeout = Duration::from_secs(config.verification.timeout_seconds);
        let perplexity_transport =
            PerplexityClient::transport(&config.perplexity, credentials.perplexity.clone(), timeout)?;

        Self::with_perplexity_transport(config, credentials, perplexity_transport)
    }

    /// Like [`Self::from_config`], reusing an existing retrieval-service
    /// transport so every caller of that service draws on one rate limiter
    pub fn with_perplexity_transport(
        config: &TomlConfig,
        credentials: &Credentials,
        perplexity_transport: Arc<HttpTransport>,
    ) -> Result<Self, BackendError> {
        let settings = VerifierSettings::from_toml(config);
        let timeout = settings.call_timeout;

        let consensus =
            ConsensusClient::new(&config.consensus, credentials.consensus.clone(), timeout)?;
        let perplexity = PerplexityClient::with_transport(&config.perplexity, perplexity_transport);
        let openai = OpenAiClient::new(&config.openai, credentials.openai.clone(), timeout)?;

        Ok(Self::new(
            Arc::new(consensus),
            Arc::new(perplexity),
            Arc::new(openai),
            settings,
        ))
    }

    pub fn settings(&self) -> VerifierSettings {
        self.settings
    }

    /// Backends that have a credential configured
    pub fn configured_backends(&self) -> Vec<Backend> {
        [&self.consensus, &self.perplexity, &self.openai]
            .into_iter()
            .filter(|b| b.is_configured())
            .map(|b| b.backend())
            .collect()
    }

    /// Verify one claim against all three backends
    ///
    /// # Errors
    /// `VerifyError::EmptyClaim` if the claim is empty after trimming.
    /// Backend failures are folded into sentinel results, never returned.
    pub async fn verify(&self, claim: &str) -> Result<AggregateVerification, VerifyError> {
        let claim = claim.trim();
        if claim.is_empty() {
            return Err(VerifyError::EmptyClaim);
        }

        let span = info_span!("verify_claim", verification_id = %Uuid::new_v4());

        async move {
            debug!(claim = %claim, "Verifying claim");

            let (consensus, perplexity, openai) = tokio::join!(
                self.call_isolated(self.consensus.as_ref(), claim),
                self.call_isolated(self.perplexity.as_ref(), claim),
                self.call_isolated(self.openai.as_ref(), claim),
            );

            let unavailable: Vec<Backend> = [
                (Backend::Consensus, consensus.failed),
                (Backend::Perplexity, perplexity.failed),
                (Backend::OpenAi, openai.failed),
            ]
            .into_iter()
            .filter_map(|(backend, failed)| failed.then_some(backend))
            .collect();

            let aggregate_score = mean_confidence(&[
                consensus.result.confidence,
                perplexity.result.confidence,
                openai.result.confidence,
            ]);

            info!(
                aggregate_score = aggregate_score,
                unavailable = unavailable.len(),
                "Claim verified"
            );

            Ok(AggregateVerification {
                claim: claim.to_string(),
                consensus: consensus.result,
                perplexity: perplexity.result,
                openai: openai.result,
                aggregate_score,
                unavailable,
            })
        }
        .instrument(span)
        .await
    }

    /// Verify many claims, preserving input order
    ///
    /// At most `max_concurrent_claims` claims are in flight at once. Each
    /// entry is independent: an empty claim yields `Err` in its slot only.
    pub async fn verify_many<S>(&self, claims: &[S]) -> Vec<Result<AggregateVerification, VerifyError>>
    where
        S: AsRef<str>,
    {
        // Collected up front: a stream that owns the mapping closure is not Send
        let pending: Vec<_> = claims
            .iter()
            .map(|claim| self.verify(claim.as_ref()))
            .collect();

        stream::iter(pending)
            .buffered(self.settings.max_concurrent_claims)
            .collect()
            .await
    }

    /// Run one backend with timeout ceiling and failure isolation
    async fn call_isolated(&self, backend: &dyn VerificationBackend, claim: &str) -> BackendOutcome {
        let name = backend.backend();

        let outcome = match tokio::time::timeout(self.settings.call_timeout, backend.verify(claim))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.settings.call_timeout)),
        };

        match outcome {
            Ok(result) => {
                debug!(
                    backend = %name,
                    is_verified = result.is_verified,
                    confidence = result.confidence,
                    "Backend verdict"
                );
                BackendOutcome {
                    result,
                    failed: false,
                }
            }
            Err(e) => {
                warn!(
                    backend = %name,
                    failure = ?e.kind(),
                    error = %e,
                    "Backend failed, substituting sentinel result"
                );
                BackendOutcome {
                    result: VerificationResult::sentinel(e.explain(name)),
                    failed: true,
                }
            }
        }
    }
}
