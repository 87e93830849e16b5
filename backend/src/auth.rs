//! Session token utilities
//!
//! This module provides functions for creating and validating the database
//! sessions that back the signed browser cookie. The cookie carries the raw
//! session token; only its SHA256 hash is stored in the sessions table.

use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use rand::RngCore;
use sha2::{Digest, Sha256};
use shared::protocol::SESSION_TTL_DAYS;

use crate::models::{NewSession, Session};
use crate::schema::sessions;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,
}

/// Generate a fresh random session token (32 bytes, hex encoded)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compute SHA256 hash of a token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Expiry timestamp for a session created now
pub fn session_expiry() -> NaiveDateTime {
    (Utc::now() + Duration::days(SESSION_TTL_DAYS)).naive_utc()
}

/// Whether a session row is past its expiry
pub fn is_expired(session: &Session) -> bool {
    session.expires < Utc::now().naive_utc()
}

/// Create a database session for a user.
/// Returns the raw token destined for the cookie; the row stores its hash.
pub fn create_session(conn: &mut PgConnection, user_id: &str) -> Result<String, SessionError> {
    let token = generate_session_token();

    let new_session = NewSession {
        session_token: hash_token(&token),
        user_id: user_id.to_string(),
        expires: session_expiry(),
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(token)
}

/// Resolve a raw cookie token to the owning user id.
/// Expired sessions are deleted on sight.
pub fn validate_session(conn: &mut PgConnection, token: &str) -> Result<String, SessionError> {
    let token_hash = hash_token(token);

    let session = sessions::table
        .find(&token_hash)
        .first::<Session>(conn)
        .optional()?
        .ok_or(SessionError::NotFound)?;

    if is_expired(&session) {
        diesel::delete(sessions::table.find(&token_hash)).execute(conn)?;
        return Err(SessionError::Expired);
    }

    Ok(session.user_id)
}

/// Delete the session behind a raw cookie token (logout)
pub fn destroy_session(conn: &mut PgConnection, token: &str) -> Result<(), SessionError> {
    diesel::delete(sessions::table.find(hash_token(token))).execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;

    #[test]
    fn test_generated_tokens_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let token = generate_session_token();
            assert_eq!(token.len(), 64, "32 random bytes hex encode to 64 chars");
            assert!(seen.insert(token), "Each token should be unique");
        }
    }

    #[test]
    fn test_hash_token_shape() {
        let hash = hash_token("some-session-token");
        assert_eq!(hash.len(), 64); // SHA256 produces 32 bytes = 64 hex chars
    }

    #[test]
    fn test_hash_token_consistency() {
        // Same token should always produce same hash
        let token = "test-token-12345";
        assert_eq!(hash_token(token), hash_token(token));
    }

    #[test]
    fn test_hash_token_uniqueness() {
        assert_ne!(hash_token("token-1"), hash_token("token-2"));
    }

    #[test]
    fn test_session_expiry_is_in_the_future() {
        let expiry = session_expiry();
        let now = Utc::now().naive_utc();
        assert!(expiry > now);

        // Roughly SESSION_TTL_DAYS from now, with a minute of test tolerance
        let expected = now + Duration::days(SESSION_TTL_DAYS);
        assert!((expiry - expected).num_seconds().abs() < 60);
    }

    #[test]
    fn test_expired_session_detection() {
        let live = Session {
            session_token: hash_token("a"),
            user_id: "u1".into(),
            expires: (Utc::now() + Duration::hours(1)).naive_utc(),
        };
        assert!(!is_expired(&live));

        let stale = Session {
            session_token: hash_token("b"),
            user_id: "u1".into(),
            expires: (Utc::now() - Duration::hours(1)).naive_utc(),
        };
        assert!(is_expired(&stale));
    }
}
