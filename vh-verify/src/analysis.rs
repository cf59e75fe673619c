//! Content analysis pipeline
//!
//! Three steps for one influencer:
//! 1. Ask the retrieval service for recent health content by that influencer
//! 2. Ask it to extract individual health claims from that content
//! 3. Verify every extracted claim through the [`ClaimVerifier`]
//!
//! Steps 1-2 are upstream dependencies: if either fails the whole analysis
//! fails. Step 3 never fails; backend problems become sentinel results.

use crate::aggregator::ClaimVerifier;
use crate::backends::http::HttpTransport;
use crate::backends::{BackendError, PerplexityClient};
use crate::models::AggregateVerification;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use vh_common::config::PerplexityConfig;

pub const DEFAULT_DATE_RANGE_DAYS: u32 = 7;
pub const DEFAULT_MAX_CLAIMS: usize = 50;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Content service failed: {0}")]
    Upstream(#[from] BackendError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Analysis tuning supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub date_range_days: u32,
    pub max_claims: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            date_range_days: DEFAULT_DATE_RANGE_DAYS,
            max_claims: DEFAULT_MAX_CLAIMS,
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// `/analyze` answers with either a bare string or `{content}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentResponse {
    Text(String),
    Wrapped { content: String },
}

impl ContentResponse {
    fn into_content(self) -> String {
        match self {
            ContentResponse::Text(content) | ContentResponse::Wrapped { content } => content,
        }
    }
}

/// `/extract` answers with either a bare array or `{claims}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClaimsResponse {
    List(Vec<String>),
    Wrapped { claims: Vec<String> },
}

impl ClaimsResponse {
    fn into_claims(self) -> Vec<String> {
        match self {
            ClaimsResponse::List(claims) | ClaimsResponse::Wrapped { claims } => claims,
        }
    }
}

pub fn content_query(influencer_name: &str, date_range_days: u32) -> String {
    format!(
        "Analyze recent health-related content from {} published in the last {} days",
        influencer_name, date_range_days
    )
}

pub fn extraction_query(content: &str) -> String {
    format!(
        "Identify health claims from the following content: {}",
        content
    )
}

/// Trim, drop blanks, cap at `max_claims`
pub fn prepare_claims(raw: Vec<String>, max_claims: usize) -> Vec<String> {
    raw.into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .take(max_claims)
        .collect()
}

/// Fetches influencer content and extracts claims from it
pub struct ContentAnalyzer {
    transport: Arc<HttpTransport>,
}

impl ContentAnalyzer {
    /// Uses the retrieval service's base URL, key, and rate
    pub fn new(
        config: &PerplexityConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        Ok(Self::with_transport(PerplexityClient::transport(
            config, api_key, timeout,
        )?))
    }

    /// Share the retrieval client's transport (and its rate limiter)
    pub fn with_transport(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.has_credential()
    }

    pub async fn fetch_content(
        &self,
        influencer_name: &str,
        date_range_days: u32,
    ) -> Result<String, BackendError> {
        let query = content_query(influencer_name, date_range_days);
        let response: ContentResponse = self
            .transport
            .post_json("/analyze", &QueryRequest { query: &query })
            .await?;
        Ok(response.into_content())
    }

    pub async fn extract_claims(&self, content: &str) -> Result<Vec<String>, BackendError> {
        let query = extraction_query(content);
        let response: ClaimsResponse = self
            .transport
            .post_json("/extract", &QueryRequest { query: &query })
            .await?;
        Ok(response.into_claims())
    }

    /// Run the full pipeline for one influencer
    ///
    /// # Errors
    /// `InvalidInput` for a blank name or a zero date range, `Upstream` when
    /// content retrieval or claim extraction fails.
    pub async fn analyze(
        &self,
        influencer_name: &str,
        options: AnalysisOptions,
        verifier: &ClaimVerifier,
    ) -> Result<Vec<AggregateVerification>, AnalysisError> {
        let name = influencer_name.trim();
        if name.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "influencerName must not be empty".to_string(),
            ));
        }
        if options.date_range_days == 0 {
            return Err(AnalysisError::InvalidInput(
                "dateRangeDays must be at least 1".to_string(),
            ));
        }

        let content = self
            .fetch_content(name, options.date_range_days)
            .await
            .map_err(|e| {
                warn!(influencer = %name, error = %e, "Content retrieval failed");
                e
            })?;

        let extracted = self.extract_claims(&content).await.map_err(|e| {
            warn!(influencer = %name, error = %e, "Claim extraction failed");
            e
        })?;

        let extracted_count = extracted.len();
        let claims = prepare_claims(extracted, options.max_claims);

        info!(
            influencer = %name,
            extracted = extracted_count,
            verifying = claims.len(),
            "Claims extracted"
        );

        // Claims are non-empty here, so every slot is Ok
        Ok(verifier
            .verify_many(&claims)
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect())
    }
}
