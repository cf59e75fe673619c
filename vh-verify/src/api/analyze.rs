//! Influencer content analysis endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::AnalysisOptions;
use crate::error::ApiResult;
use crate::models::AggregateVerification;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub influencer_name: String,
    #[serde(default)]
    pub date_range_days: Option<u32>,
    #[serde(default)]
    pub max_claims: Option<usize>,
}

impl AnalyzeRequest {
    fn options(&self) -> AnalysisOptions {
        let defaults = AnalysisOptions::default();
        AnalysisOptions {
            date_range_days: self.date_range_days.unwrap_or(defaults.date_range_days),
            max_claims: self.max_claims.unwrap_or(defaults.max_claims),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    /// Each entry carries its claim text alongside the aggregate verdict
    pub claims: Vec<AggregateVerification>,
}

/// POST /api/analyze-influencer
///
/// 400 for a blank name, 502 when content retrieval or claim extraction fails.
pub async fn analyze_influencer(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let options = request.options();
    info!(
        influencer = %request.influencer_name,
        date_range_days = options.date_range_days,
        max_claims = options.max_claims,
        "Analyzing influencer"
    );

    let claims = state
        .analyzer
        .analyze(&request.influencer_name, options, &state.verifier)
        .await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        claims,
    }))
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze-influencer", post(analyze_influencer))
}
