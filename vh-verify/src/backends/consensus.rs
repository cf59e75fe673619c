//! Literature-search backend (Consensus)
//!
//! Sends the claim as a search query, keeps candidate papers that are both
//! relevant and supportive, and reports the supporting share as confidence.

use super::http::HttpTransport;
use super::{BackendError, VerificationBackend};
use crate::models::{Backend, VerificationResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use vh_common::config::ConsensusConfig;

/// A paper counts as relevant above this score
pub const RELEVANCE_THRESHOLD: f64 = 0.7;

/// A relevant paper counts as supporting above this score
pub const SUPPORT_THRESHOLD: f64 = 0.6;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Paper>,
}

/// One candidate paper from the search endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub relevance_score: f64,
    pub support_score: f64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Paper {
    fn supports_claim(&self) -> bool {
        self.relevance_score > RELEVANCE_THRESHOLD && self.support_score > SUPPORT_THRESHOLD
    }
}

/// Turn candidate papers into a verdict
///
/// Confidence is `supporting / total * 100`, defined as 0 when no
/// candidates came back.
pub fn assess_papers(papers: &[Paper]) -> VerificationResult {
    let supporting: Vec<&Paper> = papers.iter().filter(|p| p.supports_claim()).collect();
    let total = papers.len();

    let confidence = if total == 0 {
        0.0
    } else {
        supporting.len() as f64 / total as f64 * 100.0
    };

    VerificationResult {
        is_verified: !supporting.is_empty(),
        confidence,
        explanation: format!(
            "Found {} supporting papers out of {} relevant papers.",
            supporting.len(),
            total
        ),
        sources: supporting.iter().filter_map(|p| p.url.clone()).collect(),
    }
}

/// Consensus API client
pub struct ConsensusClient {
    transport: HttpTransport,
    candidate_limit: u32,
}

impl ConsensusClient {
    pub fn new(
        config: &ConsensusConfig,
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
            candidate_limit: config.candidate_limit,
        })
    }
}

#[async_trait]
impl VerificationBackend for ConsensusClient {
    fn backend(&self) -> Backend {
        Backend::Consensus
    }

    fn is_configured(&self) -> bool {
        self.transport.has_credential()
    }

    async fn verify(&self, claim: &str) -> Result<VerificationResult, BackendError> {
        let request = SearchRequest {
            query: claim,
            limit: self.candidate_limit,
        };

        let response: SearchResponse = self.transport.post_json("/search", &request).await?;

        debug!(
            candidates = response.results.len(),
            "Consensus search returned"
        );

        // The service may ignore `limit`
        let mut papers = response.results;
        papers.truncate(self.candidate_limit as usize);
        Ok(assess_papers(&papers))
    }
}
