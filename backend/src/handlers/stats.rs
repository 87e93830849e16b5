use axum::{extract::State, http::StatusCode, Json};
use shared::api::UserStatsResponse;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::error;

use crate::{db, AppState};

use super::helpers::extract_user_id;

/// GET /api/stats - per-user entry counts by status plus trait averages
pub async fn get_stats(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<UserStatsResponse>, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let stats = db::get_user_stats(&mut conn, &user_id).map_err(|e| {
        error!("Failed to compute stats: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(UserStatsResponse {
        entries_by_status: stats.by_status,
        total_entries: stats.total_entries,
        shared_with_me: stats.shared_with_me,
        trait_averages: stats.trait_averages,
    }))
}
