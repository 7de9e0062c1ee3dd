use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use odontia_domain::{CleanupRunError, RetentionCategory};

use crate::dto::{
    CleanupRunResponse, RetentionPolicyQuery, RetentionPolicyResponse, RetentionPreviewResponse,
    RetentionStatsResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[cfg(test)]
mod tests;

pub async fn retention_stats_handler(
    State(state): State<AppState>,
) -> Json<RetentionStatsResponse> {
    let stats = state.retention_service.stats().await;
    Json(RetentionStatsResponse::from_stats(stats, Utc::now()))
}

/// Triggers a manual run and waits for it to finish.
///
/// A trigger that loses the race against an active run answers `202` with
/// the rejected snapshot instead of an error status. A run whose task died
/// before reporting answers `500`.
pub async fn force_cleanup_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<CleanupRunResponse>) {
    let run = state.retention_service.force_cleanup().await;
    let status = match run.overall_error {
        Some(CleanupRunError::AlreadyRunning) => StatusCode::ACCEPTED,
        Some(CleanupRunError::Interrupted) => StatusCode::INTERNAL_SERVER_ERROR,
        None => StatusCode::OK,
    };

    (status, Json(run.into()))
}

pub async fn retention_policies_handler(
    State(state): State<AppState>,
    Query(query): Query<RetentionPolicyQuery>,
) -> ApiResult<Json<Vec<RetentionPolicyResponse>>> {
    let now = Utc::now();
    let policies = match query.category {
        Some(category) => {
            let category = category.parse::<RetentionCategory>()?;
            let policy = state.retention_service.get_policy(category)?;
            vec![RetentionPolicyResponse::from_policy(policy, now)]
        }
        None => state
            .retention_service
            .list_policies()
            .iter()
            .map(|policy| RetentionPolicyResponse::from_policy(policy, now))
            .collect(),
    };

    Ok(Json(policies))
}

pub async fn retention_preview_handler(
    State(state): State<AppState>,
) -> Json<Vec<RetentionPreviewResponse>> {
    let previews = state.retention_service.preview().await;
    Json(previews.into_iter().map(Into::into).collect())
}
