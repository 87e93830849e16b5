use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use shared::api::UpsertAnalysisRequest;
use shared::EntryAnalysisInfo;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::error;

use crate::{
    models::{new_row_id, EntryAnalysis, JournalEntry, NewEntryAnalysis},
    schema::{entry_analyses, journal_entries},
    AppState,
};

use super::helpers::{extract_user_id, find_share};

fn load_entry(conn: &mut PgConnection, entry_id: &str) -> Result<JournalEntry, StatusCode> {
    journal_entries::table
        .find(entry_id)
        .first::<JournalEntry>(conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)
}

/// GET /api/entries/:id/analysis - fetch the analysis attached to an entry.
/// Visible to the owner, and to recipients whose share allows it.
pub async fn get_analysis(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(entry_id): Path<String>,
) -> Result<Json<EntryAnalysisInfo>, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = load_entry(&mut conn, &entry_id)?;

    if entry.user_id != user_id {
        let share = find_share(&mut conn, &entry_id, &user_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)?;

        if !share.allow_view_analysis {
            return Err(StatusCode::FORBIDDEN);
        }
    }

    let analysis = entry_analyses::table
        .filter(entry_analyses::entry_id.eq(&entry_id))
        .first::<EntryAnalysis>(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(analysis.into()))
}

/// PUT /api/entries/:id/analysis - create or replace the entry's analysis
/// (owner only). The entry_id unique key keeps this strictly 0-or-1.
pub async fn upsert_analysis(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(entry_id): Path<String>,
    Json(req): Json<UpsertAnalysisRequest>,
) -> Result<Json<EntryAnalysisInfo>, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = load_entry(&mut conn, &entry_id)?;
    if entry.user_id != user_id {
        return Err(StatusCode::FORBIDDEN);
    }

    let new_analysis = NewEntryAnalysis {
        id: new_row_id(),
        entry_id: entry_id.clone(),
        user_id,
        openness: req.openness,
        conscientiousness: req.conscientiousness,
        extraversion: req.extraversion,
        agreeableness: req.agreeableness,
        neuroticism: req.neuroticism,
        mbti_type: req.mbti_type,
        mbti_description: req.mbti_description,
        strengths: req.strengths,
        growth_areas: req.growth_areas,
        career_suggestions: req.career_suggestions,
    };

    use diesel::upsert::excluded;
    let saved: EntryAnalysis = diesel::insert_into(entry_analyses::table)
        .values(&new_analysis)
        .on_conflict(entry_analyses::entry_id)
        .do_update()
        .set((
            entry_analyses::openness.eq(excluded(entry_analyses::openness)),
            entry_analyses::conscientiousness.eq(excluded(entry_analyses::conscientiousness)),
            entry_analyses::extraversion.eq(excluded(entry_analyses::extraversion)),
            entry_analyses::agreeableness.eq(excluded(entry_analyses::agreeableness)),
            entry_analyses::neuroticism.eq(excluded(entry_analyses::neuroticism)),
            entry_analyses::mbti_type.eq(excluded(entry_analyses::mbti_type)),
            entry_analyses::mbti_description.eq(excluded(entry_analyses::mbti_description)),
            entry_analyses::strengths.eq(excluded(entry_analyses::strengths)),
            entry_analyses::growth_areas.eq(excluded(entry_analyses::growth_areas)),
            entry_analyses::career_suggestions.eq(excluded(entry_analyses::career_suggestions)),
            entry_analyses::updated_at.eq(diesel::dsl::now),
        ))
        .get_result(&mut conn)
        .map_err(|e| {
            error!("Failed to upsert analysis: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(saved.into()))
}

/// DELETE /api/entries/:id/analysis - remove the entry's analysis (owner only)
pub async fn delete_analysis(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = load_entry(&mut conn, &entry_id)?;
    if entry.user_id != user_id {
        return Err(StatusCode::FORBIDDEN);
    }

    let deleted =
        diesel::delete(entry_analyses::table.filter(entry_analyses::entry_id.eq(&entry_id)))
            .execute(&mut conn)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted == 0 {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}
