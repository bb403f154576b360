// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flexdesk: desk booking backend.
//!
//! Users register by email, claim and release places, keep a friend list,
//! and receive confirmation emails. Personal fields are encrypted with a
//! key derived from the caller's verified session.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::{Config, ConfigError, StoreBackend};
use db::Store;
use error::AppError;
use middleware::auth::AuthUser;
use services::{AccountService, FieldCipher, FriendService, ImageHost, MailService, PlaceService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub mail: MailService,
    pub places: PlaceService,
    pub accounts: AccountService,
    pub friends: FriendService,
}

impl AppState {
    /// Wire services from configuration. Mail and image clients run offline
    /// when their endpoints are not configured; offline mail is only allowed
    /// with the in-memory store.
    pub fn new(config: Config, db: Arc<dyn Store>) -> Result<Self, ConfigError> {
        let mail = match &config.mail_api_url {
            Some(url) => MailService::new(
                url.clone(),
                config.mail_api_key.clone(),
                config.mail_from.clone(),
                config.frontend_url.clone(),
            ),
            None if config.store_backend != StoreBackend::Memory => {
                return Err(ConfigError::Missing("MAIL_API_URL"));
            }
            None => {
                tracing::warn!("MAIL_API_URL not set, mail is recorded but not sent");
                MailService::new_offline(config.mail_from.clone(), config.frontend_url.clone())
            }
        };
        let images = match &config.image_host_url {
            Some(url) => ImageHost::new(url.clone(), config.image_host_client_id.clone()),
            None => ImageHost::new_offline(),
        };

        let places = PlaceService::new(db.clone(), config.availability_check);
        let accounts = AccountService::new(
            db.clone(),
            places.clone(),
            mail.clone(),
            images,
            config.api_secret.clone(),
            &config.login_regex,
            config.photo_upload,
        )
        .map_err(|_| ConfigError::Invalid("LOGIN_REGEX"))?;
        let friends = FriendService::new(db.clone());

        Ok(Self {
            config,
            db,
            mail,
            places,
            accounts,
            friends,
        })
    }

    /// Field cipher for the authenticated caller's session.
    pub fn cipher_for(&self, user: &AuthUser) -> Result<FieldCipher, AppError> {
        Ok(FieldCipher::derive(
            &self.config.field_key_pepper,
            &user.session_secret,
        )?)
    }
}
