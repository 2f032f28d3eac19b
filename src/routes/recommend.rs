use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{RecommendationRequest, ResolvedRecommendationSet},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendRequestBody {
    pub user_id: String,
    pub query: String,
    #[serde(default = "default_count")]
    pub desired_count: u32,
    #[serde(default = "default_true")]
    pub include_movies: bool,
    #[serde(default = "default_true")]
    pub include_tv: bool,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_count() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    "US".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

/// Handler for the recommendation endpoint. The entitlement gate is checked
/// before the orchestrator runs; a denial is an expected outcome (429), not
/// a failure. The quota is consumed only after a successful pipeline run.
pub async fn recommend(
    State(state): State<AppState>,
    Json(body): Json<RecommendRequestBody>,
) -> AppResult<Json<ResolvedRecommendationSet>> {
    let now = Utc::now();
    let status = state.gate.status_for(&body.user_id, now).await;

    if !state.gate.can_invoke(&body.user_id, status, now).await? {
        tracing::info!(user_id = %body.user_id, "Recommendation denied by quota");
        return Err(AppError::QuotaExceeded);
    }

    let request = RecommendationRequest {
        query: body.query,
        desired_count: body.desired_count,
        include_movies: body.include_movies,
        include_tv: body.include_tv,
        region: body.region,
        language: body.language,
    };

    let set = state.orchestrator.run(&request).await?;
    state
        .gate
        .record_invocation(&body.user_id, status, now)
        .await?;

    Ok(Json(set))
}
