// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friend list management.

use crate::db::Store;
use crate::error::{messages, AppError, Result};
use crate::models::{Friend, User, UserProfile};
use crate::services::cipher::FieldCipher;
use std::sync::Arc;

/// Friend snapshot as submitted by the client.
#[derive(Debug, Clone)]
pub struct FriendInput {
    pub id: String,
    pub name: String,
    pub fname: String,
    pub id_place: String,
    pub photo: String,
}

#[derive(Clone)]
pub struct FriendService {
    db: Arc<dyn Store>,
}

impl FriendService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Append a friend snapshot to the user's list.
    ///
    /// Entries are not de-duplicated: adding an id twice keeps both.
    pub async fn add_friend(
        &self,
        cipher: &FieldCipher,
        id_user: &str,
        friend: FriendInput,
    ) -> Result<UserProfile> {
        if friend.id.trim().is_empty() {
            return Err(AppError::invalid_arguments());
        }
        let mut user = self.load(cipher, id_user).await?;

        user.friend.push(Friend {
            id: cipher.seal(&friend.id)?,
            name: cipher.seal(&friend.name)?,
            fname: cipher.seal(&friend.fname)?,
            id_place: friend.id_place,
            photo: friend.photo,
        });
        self.db.upsert_user(&user).await?;

        Ok(user.to_profile(cipher)?)
    }

    /// Drop every entry with the given friend id.
    pub async fn remove_friend(
        &self,
        cipher: &FieldCipher,
        id_user: &str,
        friend_id: &str,
    ) -> Result<UserProfile> {
        if friend_id.trim().is_empty() {
            return Err(AppError::invalid_arguments());
        }
        let mut user = self.load(cipher, id_user).await?;

        let friend_index = cipher.blind_index(friend_id)?;
        let before = user.friend.len();
        user.friend.retain(|f| f.id.index != friend_index);
        tracing::debug!(removed = before - user.friend.len(), "Friend entries removed");

        self.db.upsert_user(&user).await?;
        Ok(user.to_profile(cipher)?)
    }

    async fn load(&self, cipher: &FieldCipher, id_user: &str) -> Result<User> {
        if id_user.trim().is_empty() {
            return Err(AppError::invalid_arguments());
        }
        self.db
            .find_user_by_id(&cipher.blind_index(id_user)?)
            .await?
            .ok_or(AppError::NotFound(messages::USER_FIND))
    }
}
