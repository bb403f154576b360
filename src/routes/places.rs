// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place booking routes.

use super::extract::ValidatedJson;
use super::SuccessResponse;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::ClaimOutcome;
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const PLACE_TAKEN: &str = "Place successfully assigned to user";
const PLACE_LEFT: &str = "User successfully left the place";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/take_place", post(take_place))
        .route("/leave_place", post(leave_place))
        .route("/assign_place", post(assign_place))
        .route("/unassign_place", post(unassign_place))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceRequest {
    #[validate(length(min = 1))]
    pub id_place: String,
    #[validate(length(min = 1))]
    pub id_user: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UnassignRequest {
    #[validate(length(min = 1))]
    pub id_place: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlaceResponse {
    pub message: String,
    /// `true` when this request created the place record
    pub created: bool,
}

async fn take_place(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<PlaceRequest>,
) -> Result<Json<PlaceResponse>> {
    let cipher = state.cipher_for(&user)?;
    let outcome = state
        .places
        .take_place(&cipher, &body.id_place, &body.id_user, chrono::Utc::now())
        .await?;

    tracing::info!(id_place = %body.id_place, ?outcome, "Place taken");
    Ok(Json(PlaceResponse {
        message: PLACE_TAKEN.to_string(),
        created: outcome == ClaimOutcome::Created,
    }))
}

async fn leave_place(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<PlaceRequest>,
) -> Result<Json<PlaceResponse>> {
    let cipher = state.cipher_for(&user)?;
    state
        .places
        .leave_place(&cipher, &body.id_place, &body.id_user, chrono::Utc::now())
        .await?;

    Ok(Json(PlaceResponse {
        message: PLACE_LEFT.to_string(),
        created: false,
    }))
}

/// Make the place semi-flex and owned by `id_user`.
async fn assign_place(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<PlaceRequest>,
) -> Result<Json<SuccessResponse>> {
    let cipher = state.cipher_for(&user)?;
    state
        .places
        .assign_place(&cipher, &body.id_place, &body.id_user)
        .await?;
    Ok(Json(SuccessResponse::default()))
}

async fn unassign_place(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<UnassignRequest>,
) -> Result<Json<SuccessResponse>> {
    state.places.unassign_place(&body.id_place).await?;
    Ok(Json(SuccessResponse::default()))
}
