// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: login, confirmation, profile, settings, removal, mail
//! hand-off and API keys.

use super::extract::ValidatedJson;
use super::SuccessResponse;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::UserProfile;
use crate::services::{ProfileUpdate, SettingsUpdate};
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login_user", post(login_user))
        .route("/verify", post(verify))
        .route("/complete_user", post(complete_user))
        .route("/settings_user", post(settings_user))
        .route("/remove_user", post(remove_user))
        .route("/send_email", post(send_email))
        .route("/api_key", post(api_key))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    /// Deterministic ciphertext of the email under the caller's session
    pub email: String,
}

/// Register the email if needed and send a confirmation link.
async fn login_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let cipher = state.cipher_for(&user)?;
    state
        .accounts
        .login(&cipher, &body.email, chrono::Utc::now())
        .await?;

    Ok(Json(LoginResponse {
        email: cipher.encrypt(body.email.trim())?,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

/// Redeem a confirmation token and return the profile.
async fn verify(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<VerifyRequest>,
) -> Result<Json<UserProfile>> {
    let cipher = state.cipher_for(&user)?;
    let profile = state.accounts.verify(&cipher, &body.token).await?;
    Ok(Json(profile))
}

// ─── Profile & Settings ──────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub fname: String,
    #[validate(length(min = 1))]
    pub id_user: String,
    #[serde(default)]
    pub photo: Option<String>,
}

async fn complete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CompleteUserRequest>,
) -> Result<Json<UserProfile>> {
    let cipher = state.cipher_for(&user)?;
    let profile = state
        .accounts
        .complete_profile(
            &cipher,
            ProfileUpdate {
                email: body.email,
                name: body.name,
                fname: body.fname,
                id_user: body.id_user,
                photo: body.photo,
            },
        )
        .await?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    #[serde(rename = "id_user")]
    #[validate(length(min = 1))]
    pub id_user: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub remote_day: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

async fn settings_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<SettingsRequest>,
) -> Result<Json<SuccessResponse>> {
    let cipher = state.cipher_for(&user)?;
    state
        .accounts
        .update_settings(
            &cipher,
            SettingsUpdate {
                id_user: body.id_user,
                photo: body.photo,
                remote_day: body.remote_day,
                start_date: body.start_date,
                end_date: body.end_date,
            },
        )
        .await?;

    Ok(Json(SuccessResponse::default()))
}

// ─── Removal ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RemoveUserRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub fname: String,
}

async fn remove_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<RemoveUserRequest>,
) -> Result<Json<SuccessResponse>> {
    let cipher = state.cipher_for(&user)?;
    state
        .accounts
        .remove_user(&cipher, &body.name, &body.fname)
        .await?;

    Ok(Json(SuccessResponse::default()))
}

// ─── Mail ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SendEmailRequest {
    #[validate(email)]
    pub to: String,
    #[validate(length(min = 1))]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Hand a message to the mail sender. Delivery failures are logged only.
async fn send_email(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<SendEmailRequest>,
) -> Result<Json<SuccessResponse>> {
    if let Err(e) = state.mail.send(&body.to, &body.subject, &body.body).await {
        tracing::warn!(error = %e, "Failed to send email");
    }
    Ok(Json(SuccessResponse::default()))
}

// ─── API Keys ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ApiKeyRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ApiKeyResponse {
    pub name: String,
    /// Shown once; only its digest is stored.
    pub key: String,
}

async fn api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<ApiKeyRequest>,
) -> Result<Json<ApiKeyResponse>> {
    let cipher = state.cipher_for(&user)?;
    let key = state
        .accounts
        .issue_api_key(&cipher, &body.name, &body.email, chrono::Utc::now())
        .await?;

    Ok(Json(ApiKeyResponse {
        name: body.name,
        key,
    }))
}
