// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST). Records use unique ids so runs do not collide.

use chrono::Utc;
use flexdesk::db::{FirestoreDb, Store};
use flexdesk::error::AppError;
use flexdesk::models::{ApiCredential, Place, User};
use flexdesk::services::FieldCipher;

mod common;
use common::test_db;

fn unique(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}")
}

fn test_user(cipher: &FieldCipher, id: &str) -> User {
    let mut user = User::new(cipher.seal(&format!("{id}@example.com")).unwrap(), Utc::now());
    user.id = Some(cipher.seal(id).unwrap());
    user.name = Some(cipher.seal(&format!("{id}-name")).unwrap());
    user.fname = Some(cipher.seal("Test").unwrap());
    user
}

#[tokio::test]
async fn test_offline_client_reports_database_error() {
    let db = FirestoreDb::new_offline();
    let result = db.get_place("A1").await;
    assert!(matches!(result, Err(AppError::Database(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_round_trip_and_lookups() {
    require_emulator!();

    let db = test_db().await;
    let cipher = FieldCipher::derive(b"pepper", &unique("session")).unwrap();
    let id = unique("user");
    let user = test_user(&cipher, &id);

    assert!(db.get_user_by_email(user.document_id()).await.unwrap().is_none());
    db.upsert_user(&user).await.unwrap();

    let by_email = db.get_user_by_email(user.document_id()).await.unwrap().unwrap();
    assert_eq!(cipher.open(&by_email.email).unwrap(), format!("{id}@example.com"));

    let by_id = db
        .find_user_by_id(&cipher.blind_index(&id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_id.document_id(), user.document_id());

    let by_name = db
        .find_user_by_name(
            &cipher.blind_index(&format!("{id}-name")).unwrap(),
            &cipher.blind_index("Test").unwrap(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_name.document_id(), user.document_id());

    db.delete_user(user.document_id()).await.unwrap();
    assert!(db.get_user_by_email(user.document_id()).await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// PLACE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_places_by_owner() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique("owner");

    for suffix in ["b", "a"] {
        let mut place = Place::vacant(&unique(&format!("place-{suffix}")));
        place.id_owner = owner.clone();
        place.semi_flex = true;
        db.upsert_place(&place).await.unwrap();
    }
    db.upsert_place(&Place::occupied(&unique("other"), "someone"))
        .await
        .unwrap();

    let owned = db.find_places_by_owner(&owner).await.unwrap();
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().all(|p| p.semi_flex));
    assert!(owned[0].id < owned[1].id);
}

#[tokio::test]
async fn test_api_credential_insert_and_get() {
    require_emulator!();

    let db = test_db().await;
    let cipher = FieldCipher::derive(b"pepper", "session").unwrap();
    let digest = unique("digest");

    let credential = ApiCredential {
        name: "reporting".to_string(),
        email: cipher.seal("ops@example.com").unwrap(),
        key_digest: digest.clone(),
        creation: Utc::now(),
    };
    db.insert_api_credential(&credential).await.unwrap();

    let stored = db.get_api_credential(&digest).await.unwrap().unwrap();
    assert_eq!(stored.name, "reporting");

    // Inserting the same digest twice is rejected
    assert!(db.insert_api_credential(&credential).await.is_err());
}
