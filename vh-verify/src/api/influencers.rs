//! Influencer roster endpoints
//!
//! Listing and search re-verify each influencer's recent claims live. The
//! static trust score and claim counts are returned untouched.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{AggregateVerification, Backend, VerificationResult};
use crate::roster::{Influencer, RecentClaim};
use crate::AppState;

/// One backend's verdict on a recent claim
#[derive(Debug, Clone, Serialize)]
pub struct ServiceVerification {
    pub service: Backend,
    pub result: VerificationResult,
}

/// Recent claim with its live verification attached
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedClaim {
    #[serde(flatten)]
    pub claim: RecentClaim,
    /// Empty when the claim could not be verified at all
    pub verifications: Vec<ServiceVerification>,
    pub aggregate_score: f64,
}

impl VerifiedClaim {
    fn new(claim: RecentClaim, verification: Option<AggregateVerification>) -> Self {
        match verification {
            Some(v) => Self {
                claim,
                verifications: Backend::ALL
                    .into_iter()
                    .map(|backend| ServiceVerification {
                        service: backend,
                        result: v.result_for(backend).clone(),
                    })
                    .collect(),
                aggregate_score: v.aggregate_score,
            },
            None => Self {
                claim,
                verifications: Vec::new(),
                aggregate_score: 0.0,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InfluencerListResponse {
    pub success: bool,
    pub influencers: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct InfluencerResponse {
    pub success: bool,
    pub influencer: Influencer,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

/// Verify every recent claim of the given influencers and splice the results in
///
/// All claims go through one `verify_many` call so the batch concurrency cap
/// holds across influencers.
async fn with_live_verifications(
    state: &AppState,
    influencers: Vec<&Influencer>,
) -> ApiResult<Vec<Value>> {
    let texts: Vec<&str> = influencers
        .iter()
        .flat_map(|i| i.recent_claims.iter().map(|c| c.text.as_str()))
        .collect();

    debug!(
        influencers = influencers.len(),
        claims = texts.len(),
        "Verifying recent claims"
    );

    let mut results = state.verifier.verify_many(&texts).await.into_iter();

    let mut out = Vec::with_capacity(influencers.len());
    for influencer in influencers {
        let mut verified = Vec::with_capacity(influencer.recent_claims.len());
        for claim in &influencer.recent_claims {
            let verification = match results.next() {
                Some(Ok(v)) => Some(v),
                Some(Err(e)) => {
                    warn!(influencer_id = influencer.id, claim_id = claim.id, error = %e, "Recent claim not verified");
                    None
                }
                None => None,
            };
            verified.push(VerifiedClaim::new(claim.clone(), verification));
        }

        let mut value =
            serde_json::to_value(influencer).map_err(|e| ApiError::Internal(e.to_string()))?;
        let verified =
            serde_json::to_value(verified).map_err(|e| ApiError::Internal(e.to_string()))?;
        if let Value::Object(ref mut map) = value {
            map.insert("recentClaims".to_string(), verified);
        }
        out.push(value);
    }

    Ok(out)
}

/// GET /api/influencers
pub async fn list_influencers(
    State(state): State<AppState>,
) -> ApiResult<Json<InfluencerListResponse>> {
    let roster = state.roster.clone();
    let influencers = with_live_verifications(&state, roster.all().iter().collect()).await?;

    Ok(Json(InfluencerListResponse {
        success: true,
        influencers,
    }))
}

/// GET /api/influencers/:id
///
/// Static record only; no live verification.
pub async fn get_influencer(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<InfluencerResponse>> {
    let influencer = state
        .roster
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Influencer {} not found", id)))?;

    Ok(Json(InfluencerResponse {
        success: true,
        influencer,
    }))
}

/// GET /api/search-influencers?query=
pub async fn search_influencers(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<InfluencerListResponse>> {
    let roster = state.roster.clone();
    let matches = roster.search(&params.query);

    debug!(query = %params.query, matches = matches.len(), "Influencer search");

    let influencers = with_live_verifications(&state, matches).await?;

    Ok(Json(InfluencerListResponse {
        success: true,
        influencers,
    }))
}

pub fn influencer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/influencers", get(list_influencers))
        .route("/api/influencers/:id", get(get_influencer))
        // Singular form used by existing dashboard clients
        .route("/api/influencer/:id", get(get_influencer))
        .route("/api/search-influencers", get(search_influencers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_claim_serialization() {
        let aggregate = AggregateVerification {
            claim: "Meditation reduces cortisol levels".to_string(),
            consensus: VerificationResult::sentinel("c"),
            perplexity: VerificationResult::sentinel("p"),
            openai: VerificationResult {
                is_verified: true,
                confidence: 90.0,
                explanation: "ok".to_string(),
                sources: vec![],
            },
            aggregate_score: 30.0,
            unavailable: vec![Backend::Consensus, Backend::Perplexity],
        };
        let claim = RecentClaim {
            id: 2,
            text: "Meditation reduces cortisol levels".to_string(),
        };

        let json = serde_json::to_value(VerifiedClaim::new(claim, Some(aggregate))).unwrap();

        assert_eq!(json["id"], 2);
        assert_eq!(json["text"], "Meditation reduces cortisol levels");
        assert_eq!(json["aggregateScore"], 30.0);
        assert_eq!(json["verifications"][2]["service"], "OpenAI");
        assert_eq!(json["verifications"][2]["result"]["isVerified"], true);
    }

    #[test]
    fn test_unverified_claim_is_empty() {
        let claim = RecentClaim {
            id: 1,
            text: String::new(),
        };
        let json = serde_json::to_value(VerifiedClaim::new(claim, None)).unwrap();
        assert!(json["verifications"].as_array().unwrap().is_empty());
        assert_eq!(json["aggregateScore"], 0.0);
    }
}
