// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing mail through a JSON HTTP mail API.
//!
//! When no endpoint is configured the service runs offline and records
//! messages in an in-process outbox instead of sending them.

use crate::error::AppError;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Messages kept by the offline outbox; older ones are dropped.
pub const OUTBOX_CAPACITY: usize = 64;

/// A message handed to the mail API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Mail delivery service.
#[derive(Clone)]
pub struct MailService {
    http: reqwest::Client,
    endpoint: Option<String>,
    api_key: String,
    from: String,
    frontend_url: String,
    outbox: Arc<Mutex<VecDeque<OutgoingMail>>>,
}

impl MailService {
    /// Create a mail service posting to `endpoint`.
    pub fn new(endpoint: String, api_key: String, from: String, frontend_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: Some(endpoint),
            api_key,
            from,
            frontend_url,
            outbox: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Create an offline mail service that only records messages.
    pub fn new_offline(from: String, frontend_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: None,
            api_key: String::new(),
            from,
            frontend_url,
            outbox: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Messages recorded in offline mode, oldest first.
    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox.lock().await.iter().cloned().collect()
    }

    /// Send a free-form message.
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), AppError> {
        let mail = OutgoingMail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        };

        let Some(endpoint) = self.endpoint.as_deref() else {
            tracing::debug!(subject = %mail.subject, "Mail recorded (offline mode)");
            let mut outbox = self.outbox.lock().await;
            if outbox.len() == OUTBOX_CAPACITY {
                outbox.pop_front();
            }
            outbox.push_back(mail);
            return Ok(());
        };

        let response = self
            .http
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(&mail)
            .send()
            .await
            .map_err(|e| AppError::Dependency(format!("Mail request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Dependency(format!(
                "Mail API returned {}: {}",
                status, body
            )));
        }

        tracing::info!("Mail delivered to mail API");
        Ok(())
    }

    /// Send the login confirmation link.
    pub async fn send_confirmation(&self, to: &str, token: &str) -> Result<(), AppError> {
        let link = format!(
            "{}/verify?token={}",
            self.frontend_url.trim_end_matches('/'),
            urlencoding::encode(token)
        );
        let text = format!(
            "Click the link below to confirm your email address. \
             It is valid for a few minutes.\n\n{}\n",
            link
        );
        self.send(to, "Confirm your email", &text).await
    }
}
