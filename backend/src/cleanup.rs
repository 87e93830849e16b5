//! Expired-row cleanup logic
//!
//! Sessions and verification tokens expire by timestamp; this module sweeps
//! the stale rows so the tables do not grow without bound.

use crate::schema::{sessions, verification_tokens};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{error, info};

/// Configuration for the periodic cleanup sweep
#[derive(Clone, Copy, Debug)]
pub struct CleanupConfig {
    /// Seconds between sweeps (0 = disabled)
    pub interval_secs: u64,
}

impl CleanupConfig {
    pub fn new(interval_secs: u64) -> Self {
        Self { interval_secs }
    }

    pub fn enabled(&self) -> bool {
        self.interval_secs > 0
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        // Hourly
        Self {
            interval_secs: 3600,
        }
    }
}

/// Delete all sessions past their expiry timestamp
/// Returns the number of deleted rows
pub fn delete_expired_sessions(
    conn: &mut diesel::pg::PgConnection,
) -> Result<usize, diesel::result::Error> {
    let now = Utc::now().naive_utc();

    let deleted =
        diesel::delete(sessions::table.filter(sessions::expires.lt(now))).execute(conn)?;

    if deleted > 0 {
        info!("Cleanup: deleted {} expired sessions", deleted);
    }

    Ok(deleted)
}

/// Delete all verification tokens past their expiry timestamp
/// Returns the number of deleted rows
pub fn delete_expired_verification_tokens(
    conn: &mut diesel::pg::PgConnection,
) -> Result<usize, diesel::result::Error> {
    let now = Utc::now().naive_utc();

    let deleted = diesel::delete(
        verification_tokens::table.filter(verification_tokens::expires.lt(now)),
    )
    .execute(conn)?;

    if deleted > 0 {
        info!("Cleanup: deleted {} expired verification tokens", deleted);
    }

    Ok(deleted)
}

/// Run one full cleanup sweep:
/// 1. Delete expired sessions
/// 2. Delete expired verification tokens
pub fn run_cleanup(conn: &mut diesel::pg::PgConnection) -> (usize, usize) {
    let mut sessions_deleted = 0;
    let mut tokens_deleted = 0;

    match delete_expired_sessions(conn) {
        Ok(deleted) => sessions_deleted = deleted,
        Err(e) => error!("Failed to delete expired sessions: {:?}", e),
    }

    match delete_expired_verification_tokens(conn) {
        Ok(deleted) => tokens_deleted = deleted,
        Err(e) => error!("Failed to delete expired verification tokens: {:?}", e),
    }

    (sessions_deleted, tokens_deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_config_enabled() {
        assert!(CleanupConfig::default().enabled());
        assert!(CleanupConfig::new(60).enabled());
        assert!(!CleanupConfig::new(0).enabled());
    }
}
