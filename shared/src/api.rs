//! API request/response types
//!
//! This module defines the API contract between the backend and any HTTP
//! client of the journaling service.

use serde::{Deserialize, Serialize};

// Re-export types from parent module for convenience
pub use crate::{
    AuthenticatorInfo, EntryAccess, EntryAnalysisInfo, EntryStatus, JournalEntryInfo,
    JournalShareInfo, UserInfo,
};

/// API error types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiError {
    /// Network or connection error
    Network(String),
    /// Server returned an error status
    Server { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Authentication required or failed
    Auth(String),
    /// Resource not found
    NotFound(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Auth(msg) => write!(f, "Auth error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}

/// Request to create a journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub subject: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Defaults to DRAFT when omitted
    #[serde(default)]
    pub status: EntryStatus,
}

/// Request to update a journal entry; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
}

/// One page of journal entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryListResponse {
    pub entries: Vec<JournalEntryInfo>,
    /// Total rows matching the filter, ignoring pagination
    pub total: i64,
}

/// A single entry together with its (optional) analysis and the caller's access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetailResponse {
    pub entry: JournalEntryInfo,
    pub analysis: Option<EntryAnalysisInfo>,
    pub my_access: EntryAccess,
}

/// Request to share an entry with another user, addressed by email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEntryRequest {
    pub email: String,
    #[serde(default)]
    pub allow_edit: bool,
    #[serde(default)]
    pub allow_view_analysis: bool,
}

/// Request to update the permissions on an existing share
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShareRequest {
    pub allow_edit: bool,
    pub allow_view_analysis: bool,
}

/// A share grant joined with the recipient's display info
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecipientInfo {
    #[serde(flatten)]
    pub share: JournalShareInfo,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySharesResponse {
    pub shares: Vec<ShareRecipientInfo>,
}

/// Request to create or replace the analysis attached to an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAnalysisRequest {
    pub openness: i32,
    pub conscientiousness: i32,
    pub extraversion: i32,
    pub agreeableness: i32,
    pub neuroticism: i32,
    pub mbti_type: String,
    pub mbti_description: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub growth_areas: Vec<String>,
    #[serde(default)]
    pub career_suggestions: Vec<String>,
}

/// Request to register a WebAuthn credential
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAuthenticatorRequest {
    #[serde(rename = "credentialID")]
    pub credential_id: String,
    pub credential_public_key: String,
    pub counter: i32,
    pub credential_device_type: String,
    pub credential_backed_up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorListResponse {
    pub authenticators: Vec<AuthenticatorInfo>,
}

/// Request to confirm an email verification token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmVerificationRequest {
    pub identifier: String,
    pub token: String,
}

/// Per-status entry counts for one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub draft: i64,
    pub published: i64,
    pub archived: i64,
}

/// Averages of the five trait scores across a user's analyses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitAverages {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

/// Response for GET /api/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub entries_by_status: StatusCounts,
    pub total_entries: i64,
    pub shared_with_me: i64,
    /// None when the user has no analyses yet
    pub trait_averages: Option<TraitAverages>,
}

/// API endpoint definitions
pub mod endpoints {
    pub const HEALTH: &str = "/";
    pub const AUTH_ME: &str = "/auth/me";
    pub const AUTH_LOGOUT: &str = "/auth/logout";
    pub const ENTRIES: &str = "/api/entries";
    pub const SHARED_WITH_ME: &str = "/api/entries/shared-with-me";
    pub const AUTHENTICATORS: &str = "/api/authenticators";
    pub const STATS: &str = "/api/stats";

    pub fn entry(id: &str) -> String {
        format!("/api/entries/{}", id)
    }

    pub fn entry_shares(id: &str) -> String {
        format!("/api/entries/{}/shares", id)
    }

    pub fn entry_analysis(id: &str) -> String {
        format!("/api/entries/{}/analysis", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults_to_draft() {
        let req: CreateEntryRequest =
            serde_json::from_str(r#"{"subject":"day one","content":"hello"}"#).unwrap();
        assert_eq!(req.status, EntryStatus::Draft);
        assert!(req.mood.is_none());
    }

    #[test]
    fn test_update_request_omitted_fields_stay_none() {
        let req: UpdateEntryRequest = serde_json::from_str(r#"{"status":"ARCHIVED"}"#).unwrap();
        assert_eq!(req.status, Some(EntryStatus::Archived));
        assert!(req.subject.is_none());
        assert!(req.content.is_none());
    }

    #[test]
    fn test_share_request_wire_names() {
        let req: ShareEntryRequest = serde_json::from_str(
            r#"{"email":"friend@example.com","allowEdit":true,"allowViewAnalysis":false}"#,
        )
        .unwrap();
        assert!(req.allow_edit);
        assert!(!req.allow_view_analysis);
    }

    #[test]
    fn test_register_authenticator_uses_upstream_casing() {
        let req: RegisterAuthenticatorRequest = serde_json::from_str(
            r#"{
                "credentialID": "abc123",
                "credentialPublicKey": "pk",
                "counter": 7,
                "credentialDeviceType": "multiDevice",
                "credentialBackedUp": true
            }"#,
        )
        .unwrap();
        assert_eq!(req.credential_id, "abc123");
        assert_eq!(req.counter, 7);
        assert!(req.transports.is_none());
    }

    #[test]
    fn test_endpoint_builders() {
        assert_eq!(endpoints::entry("e1"), "/api/entries/e1");
        assert_eq!(endpoints::entry_analysis("e1"), "/api/entries/e1/analysis");
    }
}
