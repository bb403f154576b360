// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend list routes.

use super::extract::ValidatedJson;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::UserProfile;
use crate::services::FriendInput;
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/add_friend", post(add_friend))
        .route("/remove_friend", post(remove_friend))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddFriendRequest {
    #[validate(length(min = 1))]
    pub id_user: String,
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub id_place: String,
    #[serde(default)]
    pub photo: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RemoveFriendRequest {
    #[validate(length(min = 1))]
    pub id_user: String,
    #[validate(length(min = 1))]
    pub id: String,
}

/// Updated profile after a friend list change.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FriendListResponse {
    pub user: UserProfile,
}

async fn add_friend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<AddFriendRequest>,
) -> Result<Json<FriendListResponse>> {
    let cipher = state.cipher_for(&user)?;
    let profile = state
        .friends
        .add_friend(
            &cipher,
            &body.id_user,
            FriendInput {
                id: body.id,
                name: body.name,
                fname: body.fname,
                id_place: body.id_place,
                photo: body.photo,
            },
        )
        .await?;

    Ok(Json(FriendListResponse { user: profile }))
}

async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<RemoveFriendRequest>,
) -> Result<Json<FriendListResponse>> {
    let cipher = state.cipher_for(&user)?;
    let profile = state
        .friends
        .remove_friend(&cipher, &body.id_user, &body.id)
        .await?;

    Ok(Json(FriendListResponse { user: profile }))
}
