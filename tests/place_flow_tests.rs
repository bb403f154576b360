// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end place booking through the HTTP surface.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use flexdesk::config::{AvailabilityCheck, Config};
use flexdesk::db::Store;
use serde_json::json;

mod common;
use common::{create_test_app, create_test_app_with, TestApp, SESSION};

async fn two_users() -> TestApp {
    let app = create_test_app();
    app.register(SESSION, "alice", "Doe", "Jane").await;
    app.register(SESSION, "bob", "Smith", "John").await;
    app
}

fn settings_window(days_before: i64, days_after: i64) -> (String, String) {
    let today = Utc::now().date_naive();
    (
        (today - Duration::days(days_before))
            .format("%d/%m/%Y")
            .to_string(),
        (today + Duration::days(days_after))
            .format("%d/%m/%Y")
            .to_string(),
    )
}

#[tokio::test]
async fn test_claiming_unknown_place_creates_it() {
    let app = two_users().await;
    let cipher = app.cipher(SESSION);

    let (status, body) = app
        .post("/take_place", SESSION, json!({ "id_place": "A1", "id_user": "alice" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Place successfully assigned to user");
    assert_eq!(body["created"], true);

    let alice_index = cipher.blind_index("alice").unwrap();
    let place = app.db.get_place("A1").await.unwrap().unwrap();
    assert!(place.using);
    assert_eq!(place.id_user, alice_index);

    let alice = app.db.find_user_by_id(&alice_index).await.unwrap().unwrap();
    assert_eq!(alice.id_place, "A1");
    let last = alice.historical.last().unwrap();
    assert_eq!(last.id_place, "A1");
    assert_eq!(last.end, "");
}

#[tokio::test]
async fn test_claiming_occupied_place_reports_occupant() {
    let app = two_users().await;
    let cipher = app.cipher(SESSION);

    app.post("/take_place", SESSION, json!({ "id_place": "A1", "id_user": "alice" }))
        .await;

    let (status, body) = app
        .post("/take_place", SESSION, json!({ "id_place": "A1", "id_user": "bob" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "place_already_used");
    assert_eq!(body["name"], "Doe");
    assert_eq!(body["fname"], "Jane");
    assert_eq!(body["details"], "Place already used by : Jane Doe");

    // No mutation on either side
    let place = app.db.get_place("A1").await.unwrap().unwrap();
    assert_eq!(place.id_user, cipher.blind_index("alice").unwrap());
    let bob = app
        .db
        .find_user_by_id(&cipher.blind_index("bob").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(bob.historical.is_empty());
    assert!(bob.id_place.is_empty());
}

#[tokio::test]
async fn test_leaving_closes_history_and_frees_place() {
    let app = two_users().await;
    let cipher = app.cipher(SESSION);

    app.post("/take_place", SESSION, json!({ "id_place": "A1", "id_user": "alice" }))
        .await;
    let (status, body) = app
        .post("/leave_place", SESSION, json!({ "id_place": "A1", "id_user": "alice" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User successfully left the place");

    let place = app.db.get_place("A1").await.unwrap().unwrap();
    assert!(!place.using);
    assert!(place.id_user.is_empty());

    let alice = app
        .db
        .find_user_by_id(&cipher.blind_index("alice").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(alice.id_place.is_empty());
    assert!(!alice.historical.last().unwrap().end.is_empty());

    // Free again for someone else
    let (status, body) = app
        .post("/take_place", SESSION, json!({ "id_place": "A1", "id_user": "bob" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
}

#[tokio::test]
async fn test_cannot_leave_place_held_by_other_user() {
    let app = two_users().await;

    app.post("/take_place", SESSION, json!({ "id_place": "A1", "id_user": "alice" }))
        .await;
    let (status, body) = app
        .post("/leave_place", SESSION, json!({ "id_place": "A1", "id_user": "bob" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "User's ID not matching user's info");
    assert!(app.db.get_place("A1").await.unwrap().unwrap().using);
}

#[tokio::test]
async fn test_leaving_place_not_held_keeps_current_claim() {
    let app = two_users().await;
    let cipher = app.cipher(SESSION);

    app.post("/take_place", SESSION, json!({ "id_place": "B2", "id_user": "alice" }))
        .await;

    let (status, body) = app
        .post("/leave_place", SESSION, json!({ "id_place": "ZZ", "id_user": "alice" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Error finding the place");

    // A free place someone else left
    app.post("/take_place", SESSION, json!({ "id_place": "C3", "id_user": "bob" }))
        .await;
    app.post("/leave_place", SESSION, json!({ "id_place": "C3", "id_user": "bob" }))
        .await;
    let (status, body) = app
        .post("/leave_place", SESSION, json!({ "id_place": "C3", "id_user": "alice" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "User's ID not matching user's info");

    let alice_index = cipher.blind_index("alice").unwrap();
    let place = app.db.get_place("B2").await.unwrap().unwrap();
    assert!(place.using);
    assert_eq!(place.id_user, alice_index);

    let alice = app.db.find_user_by_id(&alice_index).await.unwrap().unwrap();
    assert_eq!(alice.id_place, "B2");
    assert!(alice.historical.last().unwrap().is_open());
}

#[tokio::test]
async fn test_conflict_across_sessions_is_still_a_conflict() {
    let app = create_test_app();
    app.register("alice-session", "alice", "Doe", "Jane").await;
    app.register("bob-session", "bob", "Smith", "John").await;

    app.post("/take_place", "alice-session", json!({ "id_place": "A1", "id_user": "alice" }))
        .await;
    let (status, body) = app
        .post("/take_place", "bob-session", json!({ "id_place": "A1", "id_user": "bob" }))
        .await;

    // Bob's key cannot open Alice's name, so it is left blank
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "place_already_used");
    assert_eq!(body["name"], "");
    assert_eq!(body["fname"], "");

    let place = app.db.get_place("A1").await.unwrap().unwrap();
    assert_eq!(
        place.id_user,
        app.cipher("alice-session").blind_index("alice").unwrap()
    );
}

#[tokio::test]
async fn test_moving_to_new_place_releases_old_one() {
    let app = two_users().await;
    let cipher = app.cipher(SESSION);

    app.post("/take_place", SESSION, json!({ "id_place": "A1", "id_user": "alice" }))
        .await;
    app.post("/take_place", SESSION, json!({ "id_place": "B2", "id_user": "alice" }))
        .await;

    assert!(!app.db.get_place("A1").await.unwrap().unwrap().using);
    assert!(app.db.get_place("B2").await.unwrap().unwrap().using);

    let alice = app
        .db
        .find_user_by_id(&cipher.blind_index("alice").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alice.historical.len(), 2);
    assert!(!alice.historical[0].end.is_empty());
    assert_eq!(alice.historical[1].id_place, "B2");
    assert!(alice.historical[1].is_open());
}

#[tokio::test]
async fn test_unknown_user_cannot_claim() {
    let app = create_test_app();

    let (status, body) = app
        .post("/take_place", SESSION, json!({ "id_place": "A1", "id_user": "ghost" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Error finding the user");
    assert!(app.db.get_place("A1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_semi_flex_place_follows_owner_window() {
    let app = two_users().await;

    let (status, _) = app
        .post("/assign_place", SESSION, json!({ "id_place": "S1", "id_user": "alice" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    // No window: the owner is the only one allowed in
    let (status, body) = app
        .post("/take_place", SESSION, json!({ "id_place": "S1", "id_user": "bob" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["name"], "Doe");

    let (start, end) = settings_window(1, 1);
    let (status, _) = app
        .post(
            "/settings_user",
            SESSION,
            json!({ "id_user": "alice", "startDate": start, "endDate": end }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let place = app.db.get_place("S1").await.unwrap().unwrap();
    assert!(place.start_date.is_some());
    assert!(place.end_date.is_some());

    let (status, _) = app
        .post("/take_place", SESSION, json!({ "id_place": "S1", "id_user": "bob" }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_availability_mode() {
    let config = Config {
        availability_check: AvailabilityCheck::Owner,
        ..Config::test_default()
    };
    let app = create_test_app_with(config);
    app.register(SESSION, "alice", "Doe", "Jane").await;
    app.register(SESSION, "bob", "Smith", "John").await;

    app.post("/assign_place", SESSION, json!({ "id_place": "S1", "id_user": "alice" }))
        .await;

    // A window in the past does not open the place
    let (start, end) = settings_window(10, -5);
    app.post(
        "/settings_user",
        SESSION,
        json!({ "id_user": "alice", "startDate": start, "endDate": end }),
    )
    .await;
    let (status, _) = app
        .post("/take_place", SESSION, json!({ "id_place": "S1", "id_user": "bob" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (start, end) = settings_window(0, 3);
    app.post(
        "/settings_user",
        SESSION,
        json!({ "id_user": "alice", "startDate": start, "endDate": end }),
    )
    .await;
    let (status, _) = app
        .post("/take_place", SESSION, json!({ "id_place": "S1", "id_user": "bob" }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unassign_place() {
    let app = two_users().await;

    let (status, body) = app
        .post("/unassign_place", SESSION, json!({ "id_place": "nowhere" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Error finding the place");

    app.post("/assign_place", SESSION, json!({ "id_place": "S1", "id_user": "alice" }))
        .await;
    let (status, body) = app
        .post("/unassign_place", SESSION, json!({ "id_place": "S1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "success");

    let place = app.db.get_place("S1").await.unwrap().unwrap();
    assert!(!place.semi_flex);
    assert!(place.id_owner.is_empty());

    // Plain flex desk again
    let (status, _) = app
        .post("/take_place", SESSION, json!({ "id_place": "S1", "id_user": "bob" }))
        .await;
    assert_eq!(status, StatusCode::OK);
}
