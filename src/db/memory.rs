// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.

use super::Store;
use crate::error::AppError;
use crate::models::{ApiCredential, Place, User};
use async_trait::async_trait;
use dashmap::DashMap;

/// Store backed by concurrent hash maps. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    places: DashMap<String, Place>,
    api_keys: DashMap<String, ApiCredential>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn find_user<F>(&self, predicate: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl Store for MemoryDb {
    async fn get_user_by_email(&self, email_index: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(email_index).map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, id_index: &str) -> Result<Option<User>, AppError> {
        Ok(self.find_user(|u| u.id.as_ref().is_some_and(|f| f.index == id_index)))
    }

    async fn find_user_by_name(
        &self,
        name_index: &str,
        fname_index: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self.find_user(|u| {
            u.name.as_ref().is_some_and(|f| f.index == name_index)
                && u.fname.as_ref().is_some_and(|f| f.index == fname_index)
        }))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.users
            .insert(user.document_id().to_string(), user.clone());
        Ok(())
    }

    async fn delete_user(&self, email_index: &str) -> Result<(), AppError> {
        self.users.remove(email_index);
        Ok(())
    }

    async fn get_place(&self, id_place: &str) -> Result<Option<Place>, AppError> {
        Ok(self.places.get(id_place).map(|p| p.clone()))
    }

    async fn find_places_by_owner(&self, owner_index: &str) -> Result<Vec<Place>, AppError> {
        let mut places: Vec<Place> = self
            .places
            .iter()
            .filter(|entry| entry.value().id_owner == owner_index)
            .map(|entry| entry.value().clone())
            .collect();
        places.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(places)
    }

    async fn upsert_place(&self, place: &Place) -> Result<(), AppError> {
        self.places.insert(place.id.clone(), place.clone());
        Ok(())
    }

    async fn insert_api_credential(&self, credential: &ApiCredential) -> Result<(), AppError> {
        self.api_keys
            .insert(credential.key_digest.clone(), credential.clone());
        Ok(())
    }

    async fn get_api_credential(
        &self,
        key_digest: &str,
    ) -> Result<Option<ApiCredential>, AppError> {
        Ok(self.api_keys.get(key_digest).map(|c| c.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cipher::FieldCipher;
    use chrono::Utc;

    #[tokio::test]
    async fn test_user_lookups_by_index() {
        let c = FieldCipher::derive(b"pepper", "session").unwrap();
        let db = MemoryDb::new();

        let mut user = User::new(c.seal("jane@example.com").unwrap(), Utc::now());
        user.id = Some(c.seal("jdoe").unwrap());
        user.name = Some(c.seal("Doe").unwrap());
        user.fname = Some(c.seal("Jane").unwrap());
        db.upsert_user(&user).await.unwrap();

        let email_index = c.blind_index("jane@example.com").unwrap();
        assert!(db.get_user_by_email(&email_index).await.unwrap().is_some());

        let by_id = db
            .find_user_by_id(&c.blind_index("jdoe").unwrap())
            .await
            .unwrap();
        assert!(by_id.is_some());

        let by_name = db
            .find_user_by_name(
                &c.blind_index("Doe").unwrap(),
                &c.blind_index("Jane").unwrap(),
            )
            .await
            .unwrap();
        assert!(by_name.is_some());

        let swapped = db
            .find_user_by_name(
                &c.blind_index("Jane").unwrap(),
                &c.blind_index("Doe").unwrap(),
            )
            .await
            .unwrap();
        assert!(swapped.is_none());

        db.delete_user(&email_index).await.unwrap();
        assert_eq!(db.user_count(), 0);
    }

    #[tokio::test]
    async fn test_places_by_owner() {
        let db = MemoryDb::new();
        for (id, owner) in [("B", "o1"), ("A", "o1"), ("C", "o2")] {
            let mut place = Place::vacant(id);
            place.id_owner = owner.to_string();
            db.upsert_place(&place).await.unwrap();
        }

        let owned = db.find_places_by_owner("o1").await.unwrap();
        let ids: Vec<&str> = owned.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
    }
}
