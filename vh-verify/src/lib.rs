//! vh-verify library interface
//!
//! Health claim verification service: fans a claim out to three external
//! verification backends and reports their combined confidence.

pub mod aggregator;
pub mod analysis;
pub mod api;
pub mod backends;
pub mod config;
pub mod error;
pub mod models;
pub mod roster;

pub use crate::aggregator::{ClaimVerifier, VerifierSettings, VerifyError};
pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::analysis::ContentAnalyzer;
use crate::backends::{BackendError, PerplexityClient};
use crate::config::Credentials;
use crate::roster::Roster;
use vh_common::config::TomlConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<ClaimVerifier>,
    pub analyzer: Arc<ContentAnalyzer>,
    pub roster: Arc<Roster>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(verifier: ClaimVerifier, analyzer: ContentAnalyzer, roster: Roster) -> Self {
        Self {
            verifier: Arc::new(verifier),
            analyzer: Arc::new(analyzer),
            roster: Arc::new(roster),
            startup_time: Utc::now(),
        }
    }

    /// Wire production clients from bootstrap config and resolved keys
    pub fn from_config(
        config: &TomlConfig,
        credentials: &Credentials,
        roster: Roster,
    ) -> Result<Self, BackendError> {
        // One transport, so verification and analysis share one rate limiter
        let perplexity = PerplexityClient::transport(
            &config.perplexity,
            credentials.perplexity.clone(),
            Duration::from_secs(config.verification.timeout_seconds),
        )?;
        let verifier =
            ClaimVerifier::with_perplexity_transport(config, credentials, perplexity.clone())?;
        let analyzer = ContentAnalyzer::with_transport(perplexity);
        Ok(Self::new(verifier, analyzer, roster))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::verify_routes())
        .merge(api::influencer_routes())
        .merge(api::analyze_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
