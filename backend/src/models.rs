use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shared::{
    AuthenticatorInfo, EntryAnalysisInfo, EntryStatus, JournalEntryInfo, JournalShareInfo, UserInfo,
};

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub email_verified: Option<NaiveDateTime>,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

impl From<User> for UserInfo {
    fn from(u: User) -> Self {
        UserInfo {
            id: u.id,
            name: u.name,
            email: u.email,
            email_verified: u.email_verified.map(|t| t.and_utc()),
            image: u.image,
            created_at: u.created_at.and_utc(),
            updated_at: u.updated_at.and_utc(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    pub provider: String,
    pub provider_account_id: String,
    pub user_id: String,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub expires_at: Option<i32>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::accounts)]
pub struct NewAccount {
    pub provider: String,
    pub provider_account_id: String,
    pub user_id: String,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub expires_at: Option<i32>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub session_token: String,
    pub user_id: String,
    pub expires: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession {
    pub session_token: String,
    pub user_id: String,
    pub expires: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::verification_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VerificationToken {
    pub identifier: String,
    pub token: String,
    pub expires: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::verification_tokens)]
pub struct NewVerificationToken {
    pub identifier: String,
    pub token: String,
    pub expires: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::authenticators)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Authenticator {
    pub credential_id: String,
    pub user_id: String,
    pub credential_public_key: String,
    pub counter: i32,
    pub credential_device_type: String,
    pub credential_backed_up: bool,
    pub transports: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::authenticators)]
pub struct NewAuthenticator {
    pub credential_id: String,
    pub user_id: String,
    pub credential_public_key: String,
    pub counter: i32,
    pub credential_device_type: String,
    pub credential_backed_up: bool,
    pub transports: Option<String>,
}

impl From<Authenticator> for AuthenticatorInfo {
    fn from(a: Authenticator) -> Self {
        AuthenticatorInfo {
            credential_id: a.credential_id,
            user_id: a.user_id,
            credential_public_key: a.credential_public_key,
            counter: a.counter,
            credential_device_type: a.credential_device_type,
            credential_backed_up: a.credential_backed_up,
            transports: a.transports,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::journal_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub content: String,
    pub mood: Option<String>,
    pub color: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl JournalEntry {
    /// Status column decoded to the shared enum.
    /// Rows can only hold the three known strings (CHECK constraint).
    pub fn status(&self) -> EntryStatus {
        EntryStatus::parse(&self.status).unwrap_or_default()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::journal_entries)]
pub struct NewJournalEntry {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub content: String,
    pub mood: Option<String>,
    pub color: Option<String>,
    pub status: String,
}

/// Partial update for a journal entry; None fields are left untouched
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = crate::schema::journal_entries)]
pub struct JournalEntryChangeset {
    pub subject: Option<String>,
    pub content: Option<String>,
    pub mood: Option<String>,
    pub color: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<JournalEntry> for JournalEntryInfo {
    fn from(e: JournalEntry) -> Self {
        let status = e.status();
        JournalEntryInfo {
            id: e.id,
            user_id: e.user_id,
            subject: e.subject,
            content: e.content,
            mood: e.mood,
            color: e.color,
            status,
            created_at: e.created_at.and_utc(),
            updated_at: e.updated_at.and_utc(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::entry_analyses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EntryAnalysis {
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
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::entry_analyses)]
pub struct NewEntryAnalysis {
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
}

impl From<EntryAnalysis> for EntryAnalysisInfo {
    fn from(a: EntryAnalysis) -> Self {
        EntryAnalysisInfo {
            id: a.id,
            entry_id: a.entry_id,
            user_id: a.user_id,
            openness: a.openness,
            conscientiousness: a.conscientiousness,
            extraversion: a.extraversion,
            agreeableness: a.agreeableness,
            neuroticism: a.neuroticism,
            mbti_type: a.mbti_type,
            mbti_description: a.mbti_description,
            strengths: a.strengths,
            growth_areas: a.growth_areas,
            career_suggestions: a.career_suggestions,
            created_at: a.created_at.and_utc(),
            updated_at: a.updated_at.and_utc(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::journal_shares)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JournalShare {
    pub id: String,
    pub journal_id: String,
    pub shared_by_user_id: String,
    pub shared_with_user_id: String,
    pub allow_edit: bool,
    pub allow_view_analysis: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::journal_shares)]
pub struct NewJournalShare {
    pub id: String,
    pub journal_id: String,
    pub shared_by_user_id: String,
    pub shared_with_user_id: String,
    pub allow_edit: bool,
    pub allow_view_analysis: bool,
}

impl From<JournalShare> for JournalShareInfo {
    fn from(s: JournalShare) -> Self {
        JournalShareInfo {
            id: s.id,
            journal_id: s.journal_id,
            shared_by_user_id: s.shared_by_user_id,
            shared_with_user_id: s.shared_with_user_id,
            allow_edit: s.allow_edit,
            allow_view_analysis: s.allow_view_analysis,
            created_at: s.created_at.and_utc(),
        }
    }
}

/// Generate a fresh string primary key.
/// All row ids are UUIDv4 rendered as text; the schema keys on VARCHAR.
pub fn new_row_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_status_decoding() {
        let mut entry = JournalEntry {
            id: "e1".into(),
            user_id: "u1".into(),
            subject: "s".into(),
            content: "c".into(),
            mood: None,
            color: None,
            status: "PUBLISHED".into(),
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: chrono::Utc::now().naive_utc(),
        };
        assert_eq!(entry.status(), EntryStatus::Published);

        entry.status = "ARCHIVED".into();
        assert_eq!(entry.status(), EntryStatus::Archived);
    }

    #[test]
    fn test_new_row_ids_are_unique() {
        let a = new_row_id();
        let b = new_row_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
