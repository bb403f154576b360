// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment (or a
//! local `.env` file) and read once at startup.

use std::env;
use std::str::FromStr;

/// Default pattern accepted for user identifiers at profile completion.
pub const DEFAULT_LOGIN_REGEX: &str = r"^[A-Za-z0-9._-]{1,64}$";

/// Which persistence backend to connect at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND")),
        }
    }
}

/// Where the availability window of a semi-flex place is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityCheck {
    /// Window stored on the place itself; no extra read.
    Place,
    /// Window read from the owner's user record.
    Owner,
}

impl FromStr for AvailabilityCheck {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "place" | "sync" => Ok(Self::Place),
            "owner" | "async" => Ok(Self::Owner),
            _ => Err(ConfigError::Invalid("AVAILABILITY_CHECK")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL used for CORS and confirmation links
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Persistence backend
    pub store_backend: StoreBackend,
    /// Pattern a user identifier must match
    pub login_regex: String,
    /// Upload base64 photos to the image host
    pub photo_upload: bool,
    /// Semi-flex availability source
    pub availability_check: AvailabilityCheck,
    /// Mail API endpoint (offline mock when unset)
    pub mail_api_url: Option<String>,
    /// Sender address for outgoing mail
    pub mail_from: String,
    /// Image host upload endpoint (offline mock when unset)
    pub image_host_url: Option<String>,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Signing key for confirmation tokens
    pub api_secret: Vec<u8>,
    /// HKDF salt for field encryption keys
    pub field_key_pepper: Vec<u8>,
    /// Mail API bearer key
    pub mail_api_key: String,
    /// Image host client ID
    pub image_host_client_id: String,
}

impl Config {
    /// Config for tests: in-memory store and offline mail/image clients.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            login_regex: DEFAULT_LOGIN_REGEX.to_string(),
            photo_upload: true,
            availability_check: AvailabilityCheck::Place,
            mail_api_url: None,
            mail_from: "noreply@flexdesk.test".to_string(),
            image_host_url: None,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            api_secret: b"test_api_secret_32_bytes_minimum".to_vec(),
            field_key_pepper: b"test_field_pepper".to_vec(),
            mail_api_key: String::new(),
            image_host_client_id: String::new(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            login_regex: env::var("LOGIN_REGEX")
                .unwrap_or_else(|_| DEFAULT_LOGIN_REGEX.to_string()),
            photo_upload: parse_bool("PHOTO_UPLOAD", true)?,
            availability_check: env::var("AVAILABILITY_CHECK")
                .unwrap_or_else(|_| "place".to_string())
                .parse()?,
            mail_api_url: optional("MAIL_API_URL"),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@flexdesk.local".to_string()),
            image_host_url: optional("IMAGE_HOST_URL"),

            jwt_signing_key: required("JWT_SIGNING_KEY")?.into_bytes(),
            api_secret: required("API_SECRET")?.into_bytes(),
            field_key_pepper: required("FIELD_KEY_PEPPER")?.into_bytes(),
            mail_api_key: env::var("MAIL_API_KEY")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            image_host_client_id: env::var("IMAGE_HOST_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "enabled" => Ok(true),
            "0" | "false" | "no" | "disabled" => Ok(false),
            _ => Err(ConfigError::Invalid(name)),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
