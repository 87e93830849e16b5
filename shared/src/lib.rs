use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Protocol constants shared between backend and clients
pub mod protocol;

// API request/response types and error type
pub mod api;
pub use api::ApiError;

/// Lifecycle status of a journal entry.
///
/// Stored and serialized as the exact strings `DRAFT`, `PUBLISHED`,
/// `ARCHIVED` for compatibility with existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "PUBLISHED")]
    Published,
    #[serde(rename = "ARCHIVED")]
    Archived,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "DRAFT",
            EntryStatus::Published => "PUBLISHED",
            EntryStatus::Archived => "ARCHIVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(EntryStatus::Draft),
            "PUBLISHED" => Some(EntryStatus::Published),
            "ARCHIVED" => Some(EntryStatus::Archived),
            _ => None,
        }
    }
}

impl Default for EntryStatus {
    fn default() -> Self {
        EntryStatus::Draft
    }
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A journal entry as it travels over the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryInfo {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub content: String,
    pub mood: Option<String>,
    pub color: Option<String>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Personality analysis attached to an entry (at most one per entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAnalysisInfo {
    pub id: String,
    pub entry_id: String,
    pub user_id: String,
    pub openness: i32,
    pub conscientiousness: i32,
    pub extraversion: i32,
    pub agreeableness: i32,
    pub neuroticism: i32,
    pub mbti_type: String,
    pub mbti_description: String,
    pub strengths: Vec<String>,
    pub growth_areas: Vec<String>,
    pub career_suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A share grant on a journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalShareInfo {
    pub id: String,
    pub journal_id: String,
    pub shared_by_user_id: String,
    pub shared_with_user_id: String,
    pub allow_edit: bool,
    pub allow_view_analysis: bool,
    pub created_at: DateTime<Utc>,
}

/// A registered WebAuthn credential.
///
/// `credentialID` keeps its irregular upstream casing on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorInfo {
    #[serde(rename = "credentialID")]
    pub credential_id: String,
    pub user_id: String,
    pub credential_public_key: String,
    pub counter: i32,
    pub credential_device_type: String,
    pub credential_backed_up: bool,
    pub transports: Option<String>,
}

/// Access level the requesting user holds on an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryAccess {
    Owner,
    Editor,
    Viewer,
}

impl EntryAccess {
    pub fn can_edit(&self) -> bool {
        matches!(self, EntryAccess::Owner | EntryAccess::Editor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            EntryStatus::Draft,
            EntryStatus::Published,
            EntryStatus::Archived,
        ] {
            assert_eq!(EntryStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EntryStatus::parse("draft"), None);
        assert_eq!(EntryStatus::parse(""), None);
    }

    #[test]
    fn test_status_serializes_as_upper_case_strings() {
        let json = serde_json::to_string(&EntryStatus::Published).unwrap();
        assert_eq!(json, "\"PUBLISHED\"");

        let parsed: EntryStatus = serde_json::from_str("\"ARCHIVED\"").unwrap();
        assert_eq!(parsed, EntryStatus::Archived);
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        // Field names must match the original schema exactly
        let user = UserInfo {
            id: "u1".into(),
            name: None,
            email: "a@b.c".into(),
            email_verified: None,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("emailVerified").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("email_verified").is_none());
    }

    #[test]
    fn test_authenticator_credential_id_casing() {
        let auth = AuthenticatorInfo {
            credential_id: "cred".into(),
            user_id: "u1".into(),
            credential_public_key: "pk".into(),
            counter: 0,
            credential_device_type: "singleDevice".into(),
            credential_backed_up: false,
            transports: Some("usb,nfc".into()),
        };
        let json = serde_json::to_value(&auth).unwrap();
        // Upstream schema spells this one "credentialID", not "credentialId"
        assert!(json.get("credentialID").is_some());
        assert!(json.get("credentialId").is_none());
        assert!(json.get("credentialBackedUp").is_some());
    }

    #[test]
    fn test_share_wire_shape() {
        let share = JournalShareInfo {
            id: "s1".into(),
            journal_id: "j1".into(),
            shared_by_user_id: "u1".into(),
            shared_with_user_id: "u2".into(),
            allow_edit: true,
            allow_view_analysis: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&share).unwrap();
        assert!(json.get("journalId").is_some());
        assert!(json.get("allowViewAnalysis").is_some());
        assert_eq!(json.get("allowEdit").unwrap(), true);
    }

    #[test]
    fn test_entry_access_rules() {
        assert!(EntryAccess::Owner.can_edit());
        assert!(EntryAccess::Editor.can_edit());
        assert!(!EntryAccess::Viewer.can_edit());
    }
}
