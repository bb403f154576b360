// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Photo upload to an Imgur-style image host.

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Host used for offline-mode URLs.
const OFFLINE_HOST: &str = "https://images.invalid";

#[derive(Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Deserialize)]
struct UploadData {
    link: String,
}

/// Image host client.
#[derive(Clone)]
pub struct ImageHost {
    http: reqwest::Client,
    endpoint: Option<String>,
    client_id: String,
}

impl ImageHost {
    pub fn new(endpoint: String, client_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: Some(endpoint),
            client_id,
        }
    }

    /// Offline mode: returns a stable content-addressed URL without uploading.
    pub fn new_offline() -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: None,
            client_id: String::new(),
        }
    }

    /// Upload base64 image data and return its durable URL.
    ///
    /// A `data:` URL prefix is accepted and stripped.
    pub async fn upload(&self, image_b64: &str) -> Result<String, AppError> {
        let payload = strip_data_url(image_b64);
        let bytes = BASE64
            .decode(payload)
            .map_err(|_| AppError::Validation("Photo is not valid base64".to_string()))?;

        let Some(endpoint) = self.endpoint.as_deref() else {
            let digest = hex::encode(Sha256::digest(&bytes));
            return Ok(format!("{}/{}.png", OFFLINE_HOST, &digest[..16]));
        };

        let response = self
            .http
            .post(endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Client-ID {}", self.client_id),
            )
            .form(&[("image", payload), ("type", "base64")])
            .send()
            .await
            .map_err(|e| AppError::Dependency(format!("Image upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Dependency(format!(
                "Image host returned {}",
                status
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Dependency(format!("Invalid image host response: {}", e)))?;

        tracing::info!(url = %uploaded.data.link, "Photo uploaded");
        Ok(uploaded.data.link)
    }
}

fn strip_data_url(value: &str) -> &str {
    match value.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => value,
    }
}
