use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use shared::api::{EntrySharesResponse, ShareEntryRequest, ShareRecipientInfo, UpdateShareRequest};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::{error, info};

use crate::{
    models::{new_row_id, JournalEntry, JournalShare, NewJournalShare},
    schema::{journal_entries, journal_shares, users},
    AppState,
};

use super::helpers::extract_user_id;

/// Load an entry or 404
fn load_entry(
    conn: &mut PgConnection,
    entry_id: &str,
) -> Result<JournalEntry, StatusCode> {
    journal_entries::table
        .find(entry_id)
        .first::<JournalEntry>(conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)
}

/// GET /api/entries/:id/shares - list all share grants on an entry (owner only)
pub async fn list_shares(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(entry_id): Path<String>,
) -> Result<Json<EntrySharesResponse>, StatusCode> {
    let current_user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = load_entry(&mut conn, &entry_id)?;
    if entry.user_id != current_user_id {
        return Err(StatusCode::NOT_FOUND);
    }

    // Shares joined with the recipient's display info
    let rows: Vec<(JournalShare, String, Option<String>)> = journal_shares::table
        .inner_join(users::table.on(users::id.eq(journal_shares::shared_with_user_id)))
        .filter(journal_shares::journal_id.eq(&entry_id))
        .order(journal_shares::created_at.asc())
        .select((JournalShare::as_select(), users::email, users::name))
        .load(&mut conn)
        .map_err(|e| {
            error!("Failed to list shares: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let shares = rows
        .into_iter()
        .map(|(share, email, name)| ShareRecipientInfo {
            share: share.into(),
            email,
            name,
        })
        .collect();

    Ok(Json(EntrySharesResponse { shares }))
}

/// POST /api/entries/:id/shares - share an entry with a user by email (owner only)
pub async fn share_entry(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(entry_id): Path<String>,
    Json(req): Json<ShareEntryRequest>,
) -> Result<StatusCode, StatusCode> {
    let current_user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = load_entry(&mut conn, &entry_id)?;
    if entry.user_id != current_user_id {
        return Err(StatusCode::FORBIDDEN);
    }

    // Find the recipient by email
    let target_user_id: String = users::table
        .filter(users::email.eq(&req.email))
        .select(users::id)
        .first(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    // Sharing with yourself is meaningless
    if target_user_id == current_user_id {
        return Err(StatusCode::BAD_REQUEST);
    }

    // A journal cannot be shared twice with the same user
    let existing = journal_shares::table
        .filter(journal_shares::journal_id.eq(&entry_id))
        .filter(journal_shares::shared_with_user_id.eq(&target_user_id))
        .first::<JournalShare>(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if existing.is_some() {
        return Err(StatusCode::CONFLICT);
    }

    let new_share = NewJournalShare {
        id: new_row_id(),
        journal_id: entry_id.clone(),
        shared_by_user_id: current_user_id,
        shared_with_user_id: target_user_id,
        allow_edit: req.allow_edit,
        allow_view_analysis: req.allow_view_analysis,
    };

    diesel::insert_into(journal_shares::table)
        .values(&new_share)
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to create share: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!("Entry {} shared with {}", entry_id, req.email);
    Ok(StatusCode::CREATED)
}

/// PUT /api/entries/:id/shares/:user_id - update share permissions (owner only)
pub async fn update_share(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path((entry_id, target_user_id)): Path<(String, String)>,
    Json(req): Json<UpdateShareRequest>,
) -> Result<StatusCode, StatusCode> {
    let current_user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = load_entry(&mut conn, &entry_id)?;
    if entry.user_id != current_user_id {
        return Err(StatusCode::FORBIDDEN);
    }

    let updated = diesel::update(
        journal_shares::table
            .filter(journal_shares::journal_id.eq(&entry_id))
            .filter(journal_shares::shared_with_user_id.eq(&target_user_id)),
    )
    .set((
        journal_shares::allow_edit.eq(req.allow_edit),
        journal_shares::allow_view_analysis.eq(req.allow_view_analysis),
    ))
    .execute(&mut conn)
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if updated == 0 {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::OK)
}

/// DELETE /api/entries/:id/shares/:user_id - revoke a share
/// Owner can revoke any share; a recipient can only remove their own
pub async fn remove_share(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path((entry_id, target_user_id)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let current_user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = load_entry(&mut conn, &entry_id)?;

    let is_owner = entry.user_id == current_user_id;

    // Non-owners can only remove themselves
    if !is_owner && current_user_id != target_user_id {
        return Err(StatusCode::FORBIDDEN);
    }

    let deleted = diesel::delete(
        journal_shares::table
            .filter(journal_shares::journal_id.eq(&entry_id))
            .filter(journal_shares::shared_with_user_id.eq(&target_user_id)),
    )
    .execute(&mut conn)
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted == 0 {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}
