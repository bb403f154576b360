// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers talk to a [`Store`]; Firestore backs it in production and
//! [`MemoryDb`] serves local development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{ApiCredential, Place, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PLACES: &str = "places";
    pub const API_KEYS: &str = "api_keys";
}

/// Field paths used in equality queries.
pub mod fields {
    pub const USER_ID_INDEX: &str = "id.index";
    pub const USER_NAME_INDEX: &str = "name.index";
    pub const USER_FNAME_INDEX: &str = "fname.index";
    pub const PLACE_OWNER: &str = "id_owner";
}

/// Document store over users, places and API credentials.
///
/// Writes are whole-document upserts; there is no optimistic locking.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get a user by the index of their email (document ID).
    async fn get_user_by_email(&self, email_index: &str) -> Result<Option<User>, AppError>;

    /// Find a user by the index of their identifier.
    async fn find_user_by_id(&self, id_index: &str) -> Result<Option<User>, AppError>;

    /// Find a user by the indexes of their last and first names.
    async fn find_user_by_name(
        &self,
        name_index: &str,
        fname_index: &str,
    ) -> Result<Option<User>, AppError>;

    /// Create or replace a user.
    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    /// Delete a user.
    async fn delete_user(&self, email_index: &str) -> Result<(), AppError>;

    /// Get a place by its identifier.
    async fn get_place(&self, id_place: &str) -> Result<Option<Place>, AppError>;

    /// All places owned by a user.
    async fn find_places_by_owner(&self, owner_index: &str) -> Result<Vec<Place>, AppError>;

    /// Create or replace a place.
    async fn upsert_place(&self, place: &Place) -> Result<(), AppError>;

    /// Store a newly issued API credential.
    async fn insert_api_credential(&self, credential: &ApiCredential) -> Result<(), AppError>;

    /// Get an API credential by key digest.
    async fn get_api_credential(&self, key_digest: &str)
        -> Result<Option<ApiCredential>, AppError>;
}
