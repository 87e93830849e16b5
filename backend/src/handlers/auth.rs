use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse};
use serde::{Deserialize, Serialize};
use shared::protocol::{SESSION_COOKIE_NAME, VERIFICATION_TOKEN_TTL_HOURS};
use shared::UserInfo;
use std::sync::Arc;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use tracing::{error, info};

use crate::{
    auth::{create_session, destroy_session, generate_session_token},
    models::{new_row_id, NewAccount, NewUser, NewVerificationToken, User, VerificationToken},
    AppState,
};

pub async fn login(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let client = match &app_state.oauth_basic_client {
        Some(c) => c,
        None => return Redirect::temporary("/auth/dev-login").into_response(),
    };

    let (auth_url, _csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .url();

    Redirect::temporary(auth_url.as_str()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    code: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

pub async fn callback(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(query): Query<AuthCallbackQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let client = app_state
        .oauth_basic_client
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    // Exchange code for token
    let token: oauth2::StandardTokenResponse<
        oauth2::EmptyExtraTokenFields,
        oauth2::basic::BasicTokenType,
    > = client
        .exchange_code(AuthorizationCode::new(query.code))
        .request_async(oauth2::reqwest::async_http_client)
        .await
        .map_err(|e| {
            error!("Failed to exchange code: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // Fetch user info from Google
    let http = reqwest::Client::new();
    let user_info: GoogleUserInfo = http
        .get("https://www.googleapis.com/oauth2/v3/userinfo")
        .bearer_auth(token.access_token().secret())
        .send()
        .await
        .map_err(|e| {
            error!("Failed to fetch user info: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .json()
        .await
        .map_err(|e| {
            error!("Failed to parse user info: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!("User authenticated: {}", user_info.email);

    // Check email access control
    if let Err(redirect) = check_email_allowed(&app_state, &user_info.email) {
        return Ok(redirect);
    }

    let mut conn = app_state.db_pool.get().map_err(|e| {
        error!("Failed to get db connection: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let user = upsert_oauth_user(&mut conn, &user_info, &token).map_err(|e| {
        error!("Failed to persist OAuth user: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // Create a DB session and hand the raw token to the browser
    let session_token = create_session(&mut conn, &user.id).map_err(|e| {
        error!("Failed to create session: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    set_session_cookie(&app_state, &cookies, session_token);

    Ok(Redirect::temporary("/journal"))
}

/// Resolve the Google identity to a user row, linking or refreshing the
/// account row keyed by (provider, provider_account_id).
fn upsert_oauth_user(
    conn: &mut PgConnection,
    user_info: &GoogleUserInfo,
    token: &oauth2::StandardTokenResponse<
        oauth2::EmptyExtraTokenFields,
        oauth2::basic::BasicTokenType,
    >,
) -> Result<User, diesel::result::Error> {
    use crate::schema::{accounts, users};

    // Existing account for this provider identity?
    let linked_user_id: Option<String> = accounts::table
        .find(("google", &user_info.sub))
        .select(accounts::user_id)
        .first::<String>(conn)
        .optional()?;

    let user = match linked_user_id {
        Some(uid) => users::table.find(uid).first::<User>(conn)?,
        None => {
            // Fall back to an existing user with the same email, else create one
            let existing = users::table
                .filter(users::email.eq(&user_info.email))
                .first::<User>(conn)
                .optional()?;

            match existing {
                Some(user) => user,
                None => {
                    let new_user = NewUser {
                        id: new_row_id(),
                        name: user_info.name.clone(),
                        email: user_info.email.clone(),
                        image: user_info.picture.clone(),
                    };

                    diesel::insert_into(users::table)
                        .values(&new_user)
                        .get_result::<User>(conn)?
                }
            }
        }
    };

    let expires_at = token
        .expires_in()
        .map(|d| (Utc::now().timestamp() + d.as_secs() as i64) as i32);

    let new_account = NewAccount {
        provider: "google".to_string(),
        provider_account_id: user_info.sub.clone(),
        user_id: user.id.clone(),
        refresh_token: token.refresh_token().map(|t| t.secret().clone()),
        access_token: Some(token.access_token().secret().clone()),
        expires_at,
        token_type: Some("bearer".to_string()),
        scope: token
            .scopes()
            .map(|s| s.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ")),
        id_token: None,
        session_state: None,
    };

    // Refresh stored tokens on every sign-in
    use diesel::upsert::excluded;
    diesel::insert_into(accounts::table)
        .values(&new_account)
        .on_conflict((accounts::provider, accounts::provider_account_id))
        .do_update()
        .set((
            accounts::access_token.eq(excluded(accounts::access_token)),
            accounts::refresh_token.eq(excluded(accounts::refresh_token)),
            accounts::expires_at.eq(excluded(accounts::expires_at)),
            accounts::scope.eq(excluded(accounts::scope)),
        ))
        .execute(conn)?;

    Ok(user)
}

fn set_session_cookie(app_state: &AppState, cookies: &Cookies, token: String) {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(!app_state.dev_mode); // Don't require HTTPS in dev mode
    cookie.set_same_site(SameSite::Lax);
    cookies.signed(&app_state.cookie_key).add(cookie);
}

pub async fn me(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<UserInfo>, StatusCode> {
    let user_id = super::helpers::extract_user_id(&app_state, &cookies)?;

    use crate::schema::users;
    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = users::table
        .find(&user_id)
        .first::<User>(&mut conn)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(Json(user.into()))
}

pub async fn logout(State(app_state): State<Arc<AppState>>, cookies: Cookies) -> impl IntoResponse {
    // Drop the DB session behind the cookie, if any
    if let Some(cookie) = cookies.signed(&app_state.cookie_key).get(SESSION_COOKIE_NAME) {
        if let Ok(mut conn) = app_state.db_pool.get() {
            if let Err(e) = destroy_session(&mut conn, cookie.value()) {
                error!("Failed to destroy session: {}", e);
            }
        }
    }

    // Remove session cookie by setting it with empty value and immediate expiry
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(tower_cookies::cookie::time::Duration::ZERO);
    cookies.signed(&app_state.cookie_key).add(cookie);

    info!("User logged out");
    Redirect::temporary("/")
}

// Development mode handlers (bypass OAuth)
pub async fn dev_login(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, StatusCode> {
    use crate::schema::users;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = users::table
        .filter(users::email.eq("testing@testing.local"))
        .first::<User>(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("Dev mode: auto-logged in as testing@testing.local");

    let session_token = create_session(&mut conn, &user.id).map_err(|e| {
        error!("Failed to create session: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    set_session_cookie(&app_state, &cookies, session_token);

    Ok(Redirect::temporary("/journal"))
}

/// DELETE /auth/me - delete the caller's account and everything it owns
pub async fn delete_me(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<StatusCode, StatusCode> {
    let user_id = super::helpers::extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let (entries, shares) = super::helpers::delete_user_with_data(&mut conn, &user_id)
        .map_err(|e| {
            error!("Failed to delete user {}: {:?}", user_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!(
        "Deleted user {} ({} entries, {} shares)",
        user_id, entries, shares
    );

    // The cookie is now dangling; expire it
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(tower_cookies::cookie::time::Duration::ZERO);
    cookies.signed(&app_state.cookie_key).add(cookie);

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct VerificationIssuedResponse {
    pub identifier: String,
    pub expires: String,
    /// Raw token, exposed in dev mode only; production delivery is external
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// POST /auth/verify-email/request - issue a verification token for the
/// signed-in user's email address
pub async fn request_email_verification(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<VerificationIssuedResponse>, StatusCode> {
    let user_id = super::helpers::extract_user_id(&app_state, &cookies)?;

    use crate::schema::{users, verification_tokens};

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = users::table
        .find(&user_id)
        .first::<User>(&mut conn)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    if user.email_verified.is_some() {
        return Err(StatusCode::CONFLICT);
    }

    // A fresh request invalidates any earlier token for the same address
    diesel::delete(
        verification_tokens::table.filter(verification_tokens::identifier.eq(&user.email)),
    )
    .execute(&mut conn)
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let token = generate_session_token();
    let expires = (Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS)).naive_utc();

    let new_token = NewVerificationToken {
        identifier: user.email.clone(),
        token: token.clone(),
        expires,
    };

    diesel::insert_into(verification_tokens::table)
        .values(&new_token)
        .execute(&mut conn)
        .map_err(|e| {
            error!("Failed to store verification token: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // No mailer is wired up; the confirm link is surfaced via logs
    info!(
        "Verification token issued for {}: /auth/verify-email/confirm?identifier={}&token={}",
        user.email, user.email, token
    );

    Ok(Json(VerificationIssuedResponse {
        identifier: user.email,
        expires: expires.and_utc().to_rfc3339(),
        token: app_state.dev_mode.then_some(token),
    }))
}

/// POST /auth/verify-email/confirm - consume a verification token and stamp
/// the user's email_verified timestamp
pub async fn confirm_email_verification(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<shared::api::ConfirmVerificationRequest>,
) -> Result<StatusCode, StatusCode> {
    use crate::schema::{users, verification_tokens};

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let stored = verification_tokens::table
        .find((&req.identifier, &req.token))
        .first::<VerificationToken>(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    // Single use either way
    diesel::delete(verification_tokens::table.find((&req.identifier, &req.token)))
        .execute(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if stored.expires < Utc::now().naive_utc() {
        return Err(StatusCode::GONE);
    }

    let updated = diesel::update(users::table.filter(users::email.eq(&req.identifier)))
        .set((
            users::email_verified.eq(Utc::now().naive_utc()),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if updated == 0 {
        return Err(StatusCode::NOT_FOUND);
    }

    info!("Email verified: {}", req.identifier);
    Ok(StatusCode::OK)
}

/// Check if an email is allowed based on ALLOWED_EMAIL_DOMAIN and ALLOWED_EMAILS
///
/// Returns Ok(()) if allowed, or Err(Redirect) to the access denied page
fn check_email_allowed(app_state: &AppState, email: &str) -> Result<(), Redirect> {
    let email_lower = email.to_lowercase();

    // If no restrictions are set, allow all
    if app_state.allowed_email_domain.is_none() && app_state.allowed_emails.is_none() {
        return Ok(());
    }

    // Check domain allowlist
    if let Some(ref domain) = app_state.allowed_email_domain {
        let domain_lower = domain.to_lowercase();
        if email_lower.ends_with(&format!("@{}", domain_lower)) {
            return Ok(());
        }
    }

    // Check specific email allowlist
    if let Some(ref emails) = app_state.allowed_emails {
        if emails.contains(&email_lower) {
            return Ok(());
        }
    }

    // Access denied
    info!("Access denied for email: {} (not in allowlist)", email);
    Err(Redirect::temporary("/access-denied"))
}
