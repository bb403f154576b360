// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! The booking API exposes three status classes: 200, 400 for anything the
//! caller got wrong (including unknown users and undecryptable values), and
//! 500 for state conflicts and backend failures.

use crate::services::cipher::CipherError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Fixed client-facing messages.
pub mod messages {
    pub const INVALID_ARGUMENTS: &str = "Invalid arguments";
    pub const INVALID_CODE: &str = "Invalid confirmation code";
    pub const USER_FIND: &str = "Error finding the user";
    pub const PLACE_FIND: &str = "Error finding the place";
    pub const USER_ID_MATCH: &str = "User's ID not matching user's info";
    pub const PLACE_ALREADY_USED: &str = "Place already used by : ";
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{}", messages::INVALID_CODE)]
    InvalidConfirmation,

    /// Target place is held by someone else. Names are already decrypted.
    #[error("{}{fname} {name}", messages::PLACE_ALREADY_USED)]
    Conflict { name: String, fname: String },

    #[error("Resource not found: {0}")]
    NotFound(&'static str),

    #[error("Decryption failed: {0}")]
    Decryption(#[from] CipherError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Upstream service error: {0}")]
    Dependency(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for the fixed "Invalid arguments" validation error.
    pub fn invalid_arguments() -> Self {
        AppError::Validation(messages::INVALID_ARGUMENTS.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fname: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut name = None;
        let mut fname = None;

        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::InvalidConfirmation => (
                StatusCode::BAD_REQUEST,
                "invalid_code",
                Some(messages::INVALID_CODE.to_string()),
            ),
            AppError::Conflict {
                name: occupant_name,
                fname: occupant_fname,
            } => {
                tracing::info!("Place already used");
                name = Some(occupant_name.clone());
                fname = Some(occupant_fname.clone());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "place_already_used",
                    Some(self.to_string()),
                )
            }
            AppError::NotFound(msg) => {
                tracing::warn!(error = %msg, "Referenced resource not found");
                (StatusCode::BAD_REQUEST, "not_found", Some(msg.to_string()))
            }
            AppError::Decryption(err) => {
                tracing::warn!(error = %err, "Field decryption failed");
                (StatusCode::BAD_REQUEST, "decryption_failed", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Dependency(msg) => {
                tracing::error!(error = %msg, "Upstream service error");
                (StatusCode::INTERNAL_SERVER_ERROR, "dependency_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            name,
            fname,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
