// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (keyed by email index, protected fields stored as maps)
//! - Places (keyed by place identifier)
//! - API credentials (keyed by key digest)

use super::{collections, fields, Store};
use crate::error::AppError;
use crate::models::{ApiCredential, Place, User};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator does not accept real credentials.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation returns a database error.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Run an equality query on the users collection and return the first hit.
    async fn query_one_user(
        &self,
        filters: Vec<(&'static str, String)>,
    ) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                q.for_all(
                    filters
                        .iter()
                        .map(|(field, value)| q.field(*field).eq(value.clone())),
                )
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user_by_email(&self, email_index: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(email_index)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_id(&self, id_index: &str) -> Result<Option<User>, AppError> {
        self.query_one_user(vec![(fields::USER_ID_INDEX, id_index.to_string())])
            .await
    }

    async fn find_user_by_name(
        &self,
        name_index: &str,
        fname_index: &str,
    ) -> Result<Option<User>, AppError> {
        self.query_one_user(vec![
            (fields::USER_NAME_INDEX, name_index.to_string()),
            (fields::USER_FNAME_INDEX, fname_index.to_string()),
        ])
        .await
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.document_id())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_user(&self, email_index: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(email_index)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Place Operations ────────────────────────────────────────

    async fn get_place(&self, id_place: &str) -> Result<Option<Place>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PLACES)
            .obj()
            .one(id_place)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_places_by_owner(&self, owner_index: &str) -> Result<Vec<Place>, AppError> {
        let owner_index = owner_index.to_string();
        let mut places: Vec<Place> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PLACES)
            .filter(move |q| q.for_all([q.field(fields::PLACE_OWNER).eq(owner_index.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here to avoid needing a composite index.
        places.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(places)
    }

    async fn upsert_place(&self, place: &Place) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PLACES)
            .document_id(&place.id)
            .object(place)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── API Credential Operations ───────────────────────────────

    async fn insert_api_credential(&self, credential: &ApiCredential) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::API_KEYS)
            .document_id(&credential.key_digest)
            .object(credential)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_api_credential(
        &self,
        key_digest: &str,
    ) -> Result<Option<ApiCredential>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::API_KEYS)
            .obj()
            .one(key_digest)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
