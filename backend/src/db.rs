use anyhow::Result;
use bigdecimal::ToPrimitive;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use shared::api::{StatusCounts, TraitAverages};
use std::env;

use crate::schema;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Embedded database migrations - compiled into the binary
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn create_pool() -> Result<DbPool> {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create pool");

    Ok(pool)
}

/// Run pending database migrations
/// Returns the list of migrations that were applied
pub fn run_migrations(pool: &DbPool) -> Result<Vec<String>> {
    let mut conn = pool.get()?;

    let applied: Vec<String> = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?
        .iter()
        .map(|m| m.to_string())
        .collect();

    Ok(applied)
}

/// Aggregated journaling stats for one user
#[derive(Debug, Default, Clone)]
pub struct UserJournalStats {
    pub by_status: StatusCounts,
    pub total_entries: i64,
    pub shared_with_me: i64,
    pub trait_averages: Option<TraitAverages>,
}

/// Per-user entry counts grouped by status
pub fn count_entries_by_status(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<StatusCounts, diesel::result::Error> {
    let rows: Vec<(String, i64)> = schema::journal_entries::table
        .filter(schema::journal_entries::user_id.eq(user_id))
        .group_by(schema::journal_entries::status)
        .select((
            schema::journal_entries::status,
            diesel::dsl::count_star(),
        ))
        .load(conn)?;

    let mut counts = StatusCounts::default();
    for (status, count) in rows {
        match status.as_str() {
            "DRAFT" => counts.draft = count,
            "PUBLISHED" => counts.published = count,
            "ARCHIVED" => counts.archived = count,
            other => tracing::warn!("Unknown entry status in group-by: {}", other),
        }
    }

    Ok(counts)
}

/// Average trait scores across all of a user's analyses.
/// Returns None when the user has no analyses.
pub fn average_trait_scores(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<Option<TraitAverages>, diesel::result::Error> {
    use schema::entry_analyses::dsl::*;

    let analysis_count: i64 = entry_analyses
        .filter(schema::entry_analyses::user_id.eq(user_id))
        .count()
        .get_result(conn)?;

    if analysis_count == 0 {
        return Ok(None);
    }

    let avg_of = |value: Option<bigdecimal::BigDecimal>| -> f64 {
        value.and_then(|d| d.to_f64()).unwrap_or(0.0)
    };

    let avg_openness = entry_analyses
        .filter(schema::entry_analyses::user_id.eq(user_id))
        .select(diesel::dsl::avg(openness))
        .first::<Option<bigdecimal::BigDecimal>>(conn)?;

    let avg_conscientiousness = entry_analyses
        .filter(schema::entry_analyses::user_id.eq(user_id))
        .select(diesel::dsl::avg(conscientiousness))
        .first::<Option<bigdecimal::BigDecimal>>(conn)?;

    let avg_extraversion = entry_analyses
        .filter(schema::entry_analyses::user_id.eq(user_id))
        .select(diesel::dsl::avg(extraversion))
        .first::<Option<bigdecimal::BigDecimal>>(conn)?;

    let avg_agreeableness = entry_analyses
        .filter(schema::entry_analyses::user_id.eq(user_id))
        .select(diesel::dsl::avg(agreeableness))
        .first::<Option<bigdecimal::BigDecimal>>(conn)?;

    let avg_neuroticism = entry_analyses
        .filter(schema::entry_analyses::user_id.eq(user_id))
        .select(diesel::dsl::avg(neuroticism))
        .first::<Option<bigdecimal::BigDecimal>>(conn)?;

    Ok(Some(TraitAverages {
        openness: avg_of(avg_openness),
        conscientiousness: avg_of(avg_conscientiousness),
        extraversion: avg_of(avg_extraversion),
        agreeableness: avg_of(avg_agreeableness),
        neuroticism: avg_of(avg_neuroticism),
    }))
}

/// Fetch the full stats block for a user (group-by counts + trait averages)
pub fn get_user_stats(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<UserJournalStats, diesel::result::Error> {
    let by_status = count_entries_by_status(conn, user_id)?;
    let total_entries = by_status.draft + by_status.published + by_status.archived;

    let shared_with_me: i64 = schema::journal_shares::table
        .filter(schema::journal_shares::shared_with_user_id.eq(user_id))
        .count()
        .get_result(conn)?;

    let trait_averages = average_trait_scores(conn, user_id)?;

    Ok(UserJournalStats {
        by_status,
        total_entries,
        shared_with_me,
        trait_averages,
    })
}
