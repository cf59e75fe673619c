//! Single-claim verification endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::models::AggregateVerification;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub claim: String,
}

/// POST /api/verify
///
/// Always 200 with an aggregate once the claim is non-empty; backend
/// failures show up as sentinel results inside the body.
pub async fn verify_claim(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<AggregateVerification>> {
    let result = state.verifier.verify(&request.claim).await?;
    Ok(Json(result))
}

pub fn verify_routes() -> Router<AppState> {
    Router::new().route("/api/verify", post(verify_claim))
}
