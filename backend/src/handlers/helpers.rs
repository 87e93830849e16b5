use axum::http::StatusCode;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::PgConnection;
use shared::protocol::SESSION_COOKIE_NAME;
use shared::EntryAccess;
use tower_cookies::Cookies;
use tracing::error;

use crate::models::{JournalEntry, JournalShare};
use crate::schema::{entry_analyses, journal_entries, journal_shares};
use crate::AppState;

/// Resolve the requesting user from the signed session cookie.
///
/// In dev mode, unauthenticated requests act as the test user.
pub fn extract_user_id(app_state: &AppState, cookies: &Cookies) -> Result<String, StatusCode> {
    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if app_state.dev_mode {
        use crate::schema::users;
        return users::table
            .filter(users::email.eq("testing@testing.local"))
            .select(users::id)
            .first::<String>(&mut conn)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR);
    }

    let cookie = cookies
        .signed(&app_state.cookie_key)
        .get(SESSION_COOKIE_NAME)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    crate::auth::validate_session(&mut conn, cookie.value())
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Look up the share row granting `user_id` access to `journal_id`, if any
pub fn find_share(
    conn: &mut PgConnection,
    journal_id: &str,
    user_id: &str,
) -> Result<Option<JournalShare>, diesel::result::Error> {
    journal_shares::table
        .filter(journal_shares::journal_id.eq(journal_id))
        .filter(journal_shares::shared_with_user_id.eq(user_id))
        .first::<JournalShare>(conn)
        .optional()
}

/// Access level `user_id` holds on `entry`, derived from ownership or a share.
/// None means the entry should not be visible to this user at all.
pub fn entry_access(
    conn: &mut PgConnection,
    entry: &JournalEntry,
    user_id: &str,
) -> Result<Option<EntryAccess>, diesel::result::Error> {
    if entry.user_id == user_id {
        return Ok(Some(EntryAccess::Owner));
    }

    Ok(find_share(conn, &entry.id, user_id)?.map(|share| {
        if share.allow_edit {
            EntryAccess::Editor
        } else {
            EntryAccess::Viewer
        }
    }))
}

/// Error type for helper operations
pub struct DeleteEntryError(String);

impl std::fmt::Debug for DeleteEntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeleteEntryError({})", self.0)
    }
}

impl From<diesel::result::Error> for DeleteEntryError {
    fn from(err: diesel::result::Error) -> Self {
        DeleteEntryError(err.to_string())
    }
}

/// Delete a journal entry and all dependent rows (analysis, shares).
///
/// Returns the number of deleted share rows.
pub fn delete_entry_with_data(
    conn: &mut PooledConnection<ConnectionManager<PgConnection>>,
    entry_id: &str,
) -> Result<usize, DeleteEntryError> {
    // Delete the 0-or-1 analysis row
    diesel::delete(entry_analyses::table.filter(entry_analyses::entry_id.eq(entry_id)))
        .execute(conn)
        .map_err(|e| {
            error!("Failed to delete entry analysis: {}", e);
            DeleteEntryError(format!("Failed to delete analysis: {}", e))
        })?;

    // Delete share grants
    let deleted_shares =
        diesel::delete(journal_shares::table.filter(journal_shares::journal_id.eq(entry_id)))
            .execute(conn)
            .map_err(|e| {
                error!("Failed to delete entry shares: {}", e);
                DeleteEntryError(format!("Failed to delete shares: {}", e))
            })?;

    // Delete the entry itself
    diesel::delete(journal_entries::table.filter(journal_entries::id.eq(entry_id)))
        .execute(conn)
        .map_err(|e| {
            error!("Failed to delete entry: {}", e);
            DeleteEntryError(format!("Failed to delete entry: {}", e))
        })?;

    Ok(deleted_shares)
}

/// Delete a user and everything they own (entries, analyses, shares in both
/// directions, authenticators, accounts, sessions).
///
/// Returns (entries_deleted, shares_deleted)
pub fn delete_user_with_data(
    conn: &mut PooledConnection<ConnectionManager<PgConnection>>,
    user_id: &str,
) -> Result<(usize, usize), DeleteEntryError> {
    use crate::schema::{accounts, authenticators, sessions, users};

    // Get all entry IDs for this user
    let entry_ids: Vec<String> = journal_entries::table
        .filter(journal_entries::user_id.eq(user_id))
        .select(journal_entries::id)
        .load(conn)
        .map_err(|e| {
            error!("Failed to get user entries: {}", e);
            DeleteEntryError(format!("Failed to get entries: {}", e))
        })?;

    // Analyses the user wrote, plus any attached to their entries
    diesel::delete(
        entry_analyses::table.filter(
            entry_analyses::user_id
                .eq(user_id)
                .or(entry_analyses::entry_id.eq_any(&entry_ids)),
        ),
    )
    .execute(conn)?;

    // Shares on their entries, granted by them, or granted to them
    let deleted_shares = diesel::delete(
        journal_shares::table.filter(
            journal_shares::journal_id
                .eq_any(&entry_ids)
                .or(journal_shares::shared_by_user_id.eq(user_id))
                .or(journal_shares::shared_with_user_id.eq(user_id)),
        ),
    )
    .execute(conn)?;

    let deleted_entries =
        diesel::delete(journal_entries::table.filter(journal_entries::user_id.eq(user_id)))
            .execute(conn)?;

    diesel::delete(authenticators::table.filter(authenticators::user_id.eq(user_id)))
        .execute(conn)?;
    diesel::delete(accounts::table.filter(accounts::user_id.eq(user_id))).execute(conn)?;
    diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id))).execute(conn)?;

    diesel::delete(users::table.filter(users::id.eq(user_id)))
        .execute(conn)
        .map_err(|e| {
            error!("Failed to delete user: {}", e);
            DeleteEntryError(format!("Failed to delete user: {}", e))
        })?;

    Ok((deleted_entries, deleted_shares))
}
