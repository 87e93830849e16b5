use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shared::api::{CreateEntryRequest, EntryDetailResponse, EntryListResponse, UpdateEntryRequest};
use shared::protocol::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use shared::{EntryAccess, EntryStatus, JournalEntryInfo};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::error;

use crate::{
    models::{
        new_row_id, EntryAnalysis, JournalEntry, JournalEntryChangeset, JournalShare,
        NewJournalEntry,
    },
    schema::{entry_analyses, journal_entries, journal_shares},
    AppState,
};

use super::helpers::{entry_access, extract_user_id, find_share};

/// Query string accepted by GET /api/entries
#[derive(Debug, Default, Deserialize)]
pub struct EntryListQuery {
    pub status: Option<String>,
    pub mood: Option<String>,
    /// Substring match against subject and content
    pub q: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Sort order for entry listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySort {
    CreatedAsc,
    CreatedDesc,
    UpdatedAsc,
    UpdatedDesc,
}

/// Parse `sort`/`order` query params; defaults to newest-created first
pub fn parse_sort(sort: Option<&str>, order: Option<&str>) -> Result<EntrySort, ()> {
    let ascending = match order {
        None | Some("desc") => false,
        Some("asc") => true,
        Some(_) => return Err(()),
    };

    match (sort, ascending) {
        (None | Some("created"), false) => Ok(EntrySort::CreatedDesc),
        (None | Some("created"), true) => Ok(EntrySort::CreatedAsc),
        (Some("updated"), false) => Ok(EntrySort::UpdatedDesc),
        (Some("updated"), true) => Ok(EntrySort::UpdatedAsc),
        (Some(_), _) => Err(()),
    }
}

/// Validated filter built from the raw query string
struct EntryFilter {
    status: Option<EntryStatus>,
    mood: Option<String>,
    search: Option<String>,
    created_after: Option<NaiveDateTime>,
    created_before: Option<NaiveDateTime>,
    sort: EntrySort,
    limit: i64,
    offset: i64,
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ()> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|t| t.naive_utc())
        .map_err(|_| ())
}

impl EntryFilter {
    fn from_query(query: &EntryListQuery) -> Result<Self, StatusCode> {
        let status = match &query.status {
            Some(s) => Some(EntryStatus::parse(s).ok_or(StatusCode::BAD_REQUEST)?),
            None => None,
        };

        let created_after = match &query.created_after {
            Some(s) => Some(parse_timestamp(s).map_err(|_| StatusCode::BAD_REQUEST)?),
            None => None,
        };
        let created_before = match &query.created_before {
            Some(s) => Some(parse_timestamp(s).map_err(|_| StatusCode::BAD_REQUEST)?),
            None => None,
        };

        let sort = parse_sort(query.sort.as_deref(), query.order.as_deref())
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0).max(0);

        Ok(EntryFilter {
            status,
            mood: query.mood.clone(),
            search: query.q.clone(),
            created_after,
            created_before,
            sort,
            limit,
            offset,
        })
    }
}

/// GET /api/entries - list the caller's own entries
pub async fn list_entries(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(query): Query<EntryListQuery>,
) -> Result<Json<EntryListResponse>, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;
    let filter = EntryFilter::from_query(&query)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut rows_query = journal_entries::table
        .into_boxed()
        .filter(journal_entries::user_id.eq(&user_id));

    if let Some(status) = filter.status {
        rows_query = rows_query.filter(journal_entries::status.eq(status.as_str()));
    }
    if let Some(ref mood) = filter.mood {
        rows_query = rows_query.filter(journal_entries::mood.eq(mood));
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search);
        rows_query = rows_query.filter(
            journal_entries::subject
                .ilike(pattern.clone())
                .or(journal_entries::content.ilike(pattern)),
        );
    }
    if let Some(after) = filter.created_after {
        rows_query = rows_query.filter(journal_entries::created_at.ge(after));
    }
    if let Some(before) = filter.created_before {
        rows_query = rows_query.filter(journal_entries::created_at.lt(before));
    }

    rows_query = match filter.sort {
        EntrySort::CreatedAsc => rows_query.order(journal_entries::created_at.asc()),
        EntrySort::CreatedDesc => rows_query.order(journal_entries::created_at.desc()),
        EntrySort::UpdatedAsc => rows_query.order(journal_entries::updated_at.asc()),
        EntrySort::UpdatedDesc => rows_query.order(journal_entries::updated_at.desc()),
    };

    let entries: Vec<JournalEntry> = rows_query
        .limit(filter.limit)
        .offset(filter.offset)
        .load(&mut conn)
        .map_err(|e| {
            error!("Failed to list entries: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // Same filter again for the total; the select clause differs, so the
    // boxed query cannot be reused
    let mut count_query = journal_entries::table
        .select(diesel::dsl::count_star())
        .into_boxed()
        .filter(journal_entries::user_id.eq(&user_id));

    if let Some(status) = filter.status {
        count_query = count_query.filter(journal_entries::status.eq(status.as_str()));
    }
    if let Some(ref mood) = filter.mood {
        count_query = count_query.filter(journal_entries::mood.eq(mood));
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search);
        count_query = count_query.filter(
            journal_entries::subject
                .ilike(pattern.clone())
                .or(journal_entries::content.ilike(pattern)),
        );
    }
    if let Some(after) = filter.created_after {
        count_query = count_query.filter(journal_entries::created_at.ge(after));
    }
    if let Some(before) = filter.created_before {
        count_query = count_query.filter(journal_entries::created_at.lt(before));
    }

    let total: i64 = count_query.first(&mut conn).map_err(|e| {
        error!("Failed to count entries: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(EntryListResponse {
        entries: entries.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// GET /api/entries/:id - fetch one entry with its analysis, if visible
pub async fn get_entry(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(entry_id): Path<String>,
) -> Result<Json<EntryDetailResponse>, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let row: (JournalEntry, Option<EntryAnalysis>) = journal_entries::table
        .left_join(entry_analyses::table.on(entry_analyses::entry_id.eq(journal_entries::id)))
        .filter(journal_entries::id.eq(&entry_id))
        .select((
            JournalEntry::as_select(),
            Option::<EntryAnalysis>::as_select(),
        ))
        .first(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let (entry, analysis) = row;

    let access = entry_access(&mut conn, &entry, &user_id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    // The analysis travels with the entry only when the caller may see it
    let analysis_visible = match access {
        EntryAccess::Owner => true,
        _ => find_share(&mut conn, &entry.id, &user_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .map(|s| s.allow_view_analysis)
            .unwrap_or(false),
    };

    Ok(Json(EntryDetailResponse {
        entry: entry.into(),
        analysis: analysis_visible.then(|| analysis.map(Into::into)).flatten(),
        my_access: access,
    }))
}

/// POST /api/entries - create an entry owned by the caller
pub async fn create_entry(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<JournalEntryInfo>), StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    if req.subject.trim().is_empty() || req.content.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let new_entry = NewJournalEntry {
        id: new_row_id(),
        user_id,
        subject: req.subject,
        content: req.content,
        mood: req.mood,
        color: req.color,
        status: req.status.as_str().to_string(),
    };

    let entry: JournalEntry = diesel::insert_into(journal_entries::table)
        .values(&new_entry)
        .get_result(&mut conn)
        .map_err(|e| {
            error!("Failed to create entry: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// PUT /api/entries/:id - update an entry (owner, or share with allow_edit)
pub async fn update_entry(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(entry_id): Path<String>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<JournalEntryInfo>, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = journal_entries::table
        .find(&entry_id)
        .first::<JournalEntry>(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let access = entry_access(&mut conn, &entry, &user_id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if !access.can_edit() {
        return Err(StatusCode::FORBIDDEN);
    }

    // Lifecycle transitions stay with the owner
    if req.status.is_some() && access != EntryAccess::Owner {
        return Err(StatusCode::FORBIDDEN);
    }

    let changeset = JournalEntryChangeset {
        subject: req.subject,
        content: req.content,
        mood: req.mood,
        color: req.color,
        status: req.status.map(|s| s.as_str().to_string()),
        updated_at: Some(Utc::now().naive_utc()),
    };

    let updated: JournalEntry = diesel::update(journal_entries::table.find(&entry_id))
        .set(&changeset)
        .get_result(&mut conn)
        .map_err(|e| {
            error!("Failed to update entry: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(updated.into()))
}

/// DELETE /api/entries/:id - delete an entry and its dependents (owner only)
pub async fn delete_entry(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let entry = journal_entries::table
        .find(&entry_id)
        .first::<JournalEntry>(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let access = entry_access(&mut conn, &entry, &user_id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if access != EntryAccess::Owner {
        return Err(StatusCode::FORBIDDEN);
    }

    super::helpers::delete_entry_with_data(&mut conn, &entry_id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::NO_CONTENT)
}

/// An entry someone shared with the caller, with the granted permissions
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedEntryInfo {
    #[serde(flatten)]
    pub entry: JournalEntryInfo,
    pub allow_edit: bool,
    pub allow_view_analysis: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedWithMeResponse {
    pub entries: Vec<SharedEntryInfo>,
}

/// GET /api/entries/shared-with-me - entries other users shared with the caller
pub async fn shared_with_me(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<SharedWithMeResponse>, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let rows: Vec<(JournalShare, JournalEntry)> = journal_shares::table
        .inner_join(journal_entries::table.on(journal_entries::id.eq(journal_shares::journal_id)))
        .filter(journal_shares::shared_with_user_id.eq(&user_id))
        .order(journal_shares::created_at.desc())
        .select((JournalShare::as_select(), JournalEntry::as_select()))
        .load(&mut conn)
        .map_err(|e| {
            error!("Failed to list shared entries: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let entries = rows
        .into_iter()
        .map(|(share, entry)| SharedEntryInfo {
            entry: entry.into(),
            allow_edit: share.allow_edit,
            allow_view_analysis: share.allow_view_analysis,
        })
        .collect();

    Ok(Json(SharedWithMeResponse { entries }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_defaults() {
        assert_eq!(parse_sort(None, None), Ok(EntrySort::CreatedDesc));
        assert_eq!(parse_sort(Some("created"), None), Ok(EntrySort::CreatedDesc));
    }

    #[test]
    fn test_parse_sort_variants() {
        assert_eq!(
            parse_sort(Some("updated"), Some("asc")),
            Ok(EntrySort::UpdatedAsc)
        );
        assert_eq!(
            parse_sort(Some("updated"), Some("desc")),
            Ok(EntrySort::UpdatedDesc)
        );
        assert_eq!(parse_sort(None, Some("asc")), Ok(EntrySort::CreatedAsc));
    }

    #[test]
    fn test_parse_sort_rejects_unknown() {
        assert!(parse_sort(Some("mood"), None).is_err());
        assert!(parse_sort(None, Some("sideways")).is_err());
    }

    #[test]
    fn test_filter_validation() {
        let query = EntryListQuery {
            status: Some("PUBLISHED".into()),
            limit: Some(10_000),
            offset: Some(-5),
            ..Default::default()
        };
        let filter = EntryFilter::from_query(&query).unwrap();
        assert_eq!(filter.status, Some(EntryStatus::Published));
        assert_eq!(filter.limit, MAX_PAGE_SIZE);
        assert_eq!(filter.offset, 0);

        let bad = EntryListQuery {
            status: Some("published".into()),
            ..Default::default()
        };
        assert!(EntryFilter::from_query(&bad).is_err());
    }

    #[test]
    fn test_timestamp_parsing() {
        assert!(parse_timestamp("2026-01-15T10:30:00Z").is_ok());
        assert!(parse_timestamp("2026-01-15T10:30:00+02:00").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
