//! WebAuthn Credential Handlers
//!
//! CRUD endpoints for the authenticator registry. Attestation and assertion
//! ceremonies happen in the application layer; this registry only stores
//! credential records per user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use shared::api::{AuthenticatorListResponse, RegisterAuthenticatorRequest};
use shared::AuthenticatorInfo;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::{error, info};

use crate::{
    models::{Authenticator, NewAuthenticator},
    schema::authenticators,
    AppState,
};

use super::helpers::extract_user_id;

/// GET /api/authenticators - list the caller's registered credentials
pub async fn list_authenticators(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<AuthenticatorListResponse>, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let rows: Vec<Authenticator> = authenticators::table
        .filter(authenticators::user_id.eq(&user_id))
        .order(authenticators::credential_id.asc())
        .load(&mut conn)
        .map_err(|e| {
            error!("Failed to list authenticators: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(AuthenticatorListResponse {
        authenticators: rows.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/authenticators - register a credential for the caller
pub async fn register_authenticator(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<RegisterAuthenticatorRequest>,
) -> Result<(StatusCode, Json<AuthenticatorInfo>), StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    if req.credential_id.is_empty() || req.credential_public_key.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // credential_id is globally unique
    let existing = authenticators::table
        .find(&req.credential_id)
        .first::<Authenticator>(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if existing.is_some() {
        return Err(StatusCode::CONFLICT);
    }

    let new_authenticator = NewAuthenticator {
        credential_id: req.credential_id,
        user_id,
        credential_public_key: req.credential_public_key,
        counter: req.counter,
        credential_device_type: req.credential_device_type,
        credential_backed_up: req.credential_backed_up,
        transports: req.transports,
    };

    let saved: Authenticator = diesel::insert_into(authenticators::table)
        .values(&new_authenticator)
        .get_result(&mut conn)
        .map_err(|e| {
            error!("Failed to register authenticator: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!(
        "Registered authenticator {} for user {}",
        saved.credential_id, saved.user_id
    );

    Ok((StatusCode::CREATED, Json(saved.into())))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCounterRequest {
    pub counter: i32,
}

/// PUT /api/authenticators/:credential_id - bump the signature counter.
/// WebAuthn counters are monotonic; a lower value is rejected.
pub async fn update_counter(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(credential_id): Path<String>,
    Json(req): Json<UpdateCounterRequest>,
) -> Result<StatusCode, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let authenticator = authenticators::table
        .find(&credential_id)
        .filter(authenticators::user_id.eq(&user_id))
        .first::<Authenticator>(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if req.counter <= authenticator.counter {
        return Err(StatusCode::BAD_REQUEST);
    }

    diesel::update(authenticators::table.find(&credential_id))
        .set(authenticators::counter.eq(req.counter))
        .execute(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::OK)
}

/// DELETE /api/authenticators/:credential_id - remove one of the caller's credentials
pub async fn delete_authenticator(
    State(app_state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(credential_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let user_id = extract_user_id(&app_state, &cookies)?;

    let mut conn = app_state
        .db_pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let deleted = diesel::delete(
        authenticators::table
            .filter(authenticators::credential_id.eq(&credential_id))
            .filter(authenticators::user_id.eq(&user_id)),
    )
    .execute(&mut conn)
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted == 0 {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}
