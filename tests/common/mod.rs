// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use flexdesk::config::Config;
use flexdesk::db::{FirestoreDb, MemoryDb};
use flexdesk::middleware::auth::{create_session_jwt, AuthUser};
use flexdesk::routes::create_router;
use flexdesk::services::FieldCipher;
use flexdesk::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Session subject shared by most tests.
#[allow(dead_code)]
pub const SESSION: &str = "kiosk-session";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Router plus handles for inspecting state behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
}

/// Create a test app over an in-memory store with offline mail and images.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let state = Arc::new(AppState::new(config, db.clone()).expect("valid test config"));
    TestApp {
        router: create_router(state.clone()),
        state,
        db,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Signed session token for a subject.
    pub fn token(&self, subject: &str) -> String {
        create_session_jwt(subject, &self.state.config.jwt_signing_key).unwrap()
    }

    /// Cipher the server derives for a session subject.
    pub fn cipher(&self, subject: &str) -> FieldCipher {
        self.state
            .cipher_for(&AuthUser {
                session_secret: subject.to_string(),
            })
            .unwrap()
    }

    /// POST a JSON body with a bearer session and decode the JSON reply.
    pub async fn post(&self, path: &str, subject: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header(header::AUTHORIZATION, format!("Bearer {}", self.token(subject)))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Log in, redeem the mailed token and complete the profile.
    pub async fn register(&self, subject: &str, id_user: &str, name: &str, fname: &str) {
        let email = format!("{id_user}@example.com");

        let (status, _) = self
            .post("/login_user", subject, json!({ "email": email }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let token = self.last_confirmation_token().await;
        let (status, _) = self.post("/verify", subject, json!({ "token": token })).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .post(
                "/complete_user",
                subject,
                json!({
                    "email": email,
                    "name": name,
                    "fname": fname,
                    "id_user": id_user,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "complete_user failed: {body}");
    }

    /// Token embedded in the most recent confirmation mail.
    pub async fn last_confirmation_token(&self) -> String {
        let sent = self.state.mail.sent().await;
        let mail = sent.last().expect("no mail sent");
        let encoded = mail
            .text
            .split("token=")
            .nth(1)
            .expect("no token in mail")
            .split_whitespace()
            .next()
            .unwrap();
        urlencoding::decode(encoded).unwrap().into_owned()
    }
}
