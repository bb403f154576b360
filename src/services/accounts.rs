// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle: login by email, confirmation, profile completion,
//! settings, removal, and API credential issuance.

use crate::db::Store;
use crate::error::{messages, AppError, Result};
use crate::models::{ApiCredential, User, UserProfile};
use crate::services::cipher::FieldCipher;
use crate::services::confirmation::{create_confirmation_token, verify_confirmation_token};
use crate::services::image_host::ImageHost;
use crate::services::mail::MailService;
use crate::services::places::PlaceService;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures_util::{stream, StreamExt};
use regex::Regex;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

const MAX_CONCURRENT_DB_OPS: usize = 10;
const SETTINGS_DATE_FORMAT: &str = "%d/%m/%Y";
const API_KEY_BYTES: usize = 32;

/// Photo values that are already hosted.
const HTTPS_PATTERN: &str = r"^https?://(.*)";

/// Profile completion input.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub email: String,
    pub name: String,
    pub fname: String,
    pub id_user: String,
    pub photo: Option<String>,
}

/// Settings input. Empty strings mean "unchanged".
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub id_user: String,
    pub photo: Option<String>,
    pub remote_day: Option<String>,
    /// `DD/MM/YYYY`
    pub start_date: Option<String>,
    /// `DD/MM/YYYY`
    pub end_date: Option<String>,
}

/// Account service.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<dyn Store>,
    places: PlaceService,
    mail: MailService,
    images: ImageHost,
    api_secret: Vec<u8>,
    login_regex: Regex,
    hosted_photo: Regex,
    photo_upload: bool,
    rng: SystemRandom,
}

impl AccountService {
    pub fn new(
        db: Arc<dyn Store>,
        places: PlaceService,
        mail: MailService,
        images: ImageHost,
        api_secret: Vec<u8>,
        login_regex: &str,
        photo_upload: bool,
    ) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            db,
            places,
            mail,
            images,
            api_secret,
            login_regex: Regex::new(login_regex)?,
            hosted_photo: Regex::new(HTTPS_PATTERN)?,
            photo_upload,
            rng: SystemRandom::new(),
        })
    }

    /// Register the email if unknown, then issue and mail a confirmation token.
    ///
    /// Mail delivery failures are logged and do not fail the login.
    pub async fn login(&self, cipher: &FieldCipher, email: &str, now: DateTime<Utc>) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::invalid_arguments());
        }

        let email_index = cipher.blind_index(email)?;
        let mut user = match self.db.get_user_by_email(&email_index).await? {
            Some(user) => user,
            None => {
                tracing::info!("Registering new user");
                User::new(cipher.seal(email)?, now)
            }
        };

        let token = create_confirmation_token(&cipher.encrypt(email)?, &self.api_secret)?;
        user.confirmation_token = token.clone();
        self.db.upsert_user(&user).await?;

        if let Err(e) = self.mail.send_confirmation(email, &token).await {
            tracing::warn!(error = %e, "Failed to send confirmation email");
        }
        Ok(())
    }

    /// Redeem a confirmation token. Single use.
    pub async fn verify(&self, cipher: &FieldCipher, token: &str) -> Result<UserProfile> {
        let subject = verify_confirmation_token(token, &self.api_secret).map_err(|e| {
            tracing::debug!(error = %e, "Confirmation token rejected");
            AppError::InvalidConfirmation
        })?;
        let email = cipher.decrypt(&subject)?;

        let mut user = self
            .db
            .get_user_by_email(&cipher.blind_index(&email)?)
            .await?
            .ok_or(AppError::InvalidConfirmation)?;

        let matches: bool = user
            .confirmation_token
            .as_bytes()
            .ct_eq(token.as_bytes())
            .into();
        if user.confirmation_token.is_empty() || !matches {
            return Err(AppError::InvalidConfirmation);
        }

        user.confirmation_token.clear();
        self.db.upsert_user(&user).await?;

        Ok(user.to_profile(cipher)?)
    }

    /// Attach identifier, names and photo to a registered email.
    pub async fn complete_profile(
        &self,
        cipher: &FieldCipher,
        update: ProfileUpdate,
    ) -> Result<UserProfile> {
        if [&update.email, &update.name, &update.fname]
            .iter()
            .any(|v| v.trim().is_empty())
            || !self.login_regex.is_match(&update.id_user)
        {
            return Err(AppError::invalid_arguments());
        }

        let mut user = self
            .db
            .get_user_by_email(&cipher.blind_index(update.email.trim())?)
            .await?
            .ok_or(AppError::NotFound(messages::USER_FIND))?;

        let id_index = cipher.blind_index(&update.id_user)?;
        if let Some(other) = self.db.find_user_by_id(&id_index).await? {
            if other.document_id() != user.document_id() {
                return Err(AppError::Validation(messages::USER_ID_MATCH.to_string()));
            }
        }

        user.id = Some(cipher.seal(&update.id_user)?);
        user.name = Some(cipher.seal(update.name.trim())?);
        user.fname = Some(cipher.seal(update.fname.trim())?);
        if let Some(url) = self.resolve_photo(update.photo.as_deref()).await {
            user.photo = url;
        }
        self.db.upsert_user(&user).await?;

        Ok(user.to_profile(cipher)?)
    }

    /// Update photo, remote day and the sharing window.
    ///
    /// The window is written to the user and to every place they own.
    pub async fn update_settings(&self, cipher: &FieldCipher, update: SettingsUpdate) -> Result<()> {
        if update.id_user.trim().is_empty() {
            return Err(AppError::invalid_arguments());
        }
        let window = parse_window(update.start_date.as_deref(), update.end_date.as_deref())?;

        let id_index = cipher.blind_index(&update.id_user)?;
        let mut user = self
            .db
            .find_user_by_id(&id_index)
            .await?
            .ok_or(AppError::NotFound(messages::USER_FIND))?;

        if let Some(url) = self.resolve_photo(update.photo.as_deref()).await {
            user.photo = url;
        }
        if let Some(day) = update.remote_day.filter(|d| !d.is_empty()) {
            user.remote_day = day;
        }

        if let Some((start, end)) = window {
            user.start_date = Some(start);
            user.end_date = Some(end);

            let owned = self.db.find_places_by_owner(&id_index).await?;
            tracing::debug!(count = owned.len(), "Updating window on owned places");

            let db = &self.db;
            stream::iter(owned)
                .map(|mut place| async move {
                    place.start_date = Some(start);
                    place.end_date = Some(end);
                    db.upsert_place(&place).await
                })
                .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                .collect::<Vec<Result<()>>>()
                .await
                .into_iter()
                .collect::<Result<Vec<()>>>()?;
        }

        self.db.upsert_user(&user).await
    }

    /// Delete the user with the given last and first name, freeing their place.
    pub async fn remove_user(&self, cipher: &FieldCipher, name: &str, fname: &str) -> Result<()> {
        if name.trim().is_empty() || fname.trim().is_empty() {
            return Err(AppError::invalid_arguments());
        }

        let user = self
            .db
            .find_user_by_name(
                &cipher.blind_index(name.trim())?,
                &cipher.blind_index(fname.trim())?,
            )
            .await?
            .ok_or(AppError::NotFound(messages::USER_FIND))?;

        if !user.id_place.is_empty() {
            self.places
                .release_if_held(&user.id_place, user.id_index())
                .await?;
        }
        self.db.delete_user(user.document_id()).await?;

        tracing::info!("User removed");
        Ok(())
    }

    /// Issue a new API credential. The returned key is not recoverable later.
    pub async fn issue_api_key(
        &self,
        cipher: &FieldCipher,
        name: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(AppError::invalid_arguments());
        }

        let mut raw = [0u8; API_KEY_BYTES];
        self.rng
            .fill(&mut raw)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        let api_key = hex::encode(raw);

        let credential = ApiCredential {
            name: name.trim().to_string(),
            email: cipher.seal(email.trim())?,
            key_digest: api_key_digest(&api_key),
            creation: now,
        };
        self.db.insert_api_credential(&credential).await?;

        tracing::info!(name = %credential.name, "API key issued");
        Ok(api_key)
    }

    /// Turn a photo field into a URL to store, if any.
    ///
    /// Hosted URLs are kept; anything else is uploaded as base64 image data
    /// when uploads are enabled. Upload failures are logged and dropped.
    async fn resolve_photo(&self, photo: Option<&str>) -> Option<String> {
        let photo = photo.map(str::trim).filter(|p| !p.is_empty())?;

        if self.hosted_photo.is_match(photo) {
            return Some(photo.to_string());
        }
        if !self.photo_upload {
            tracing::debug!("Photo upload disabled, ignoring inline photo");
            return None;
        }

        match self.images.upload(photo).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "Photo upload failed");
                None
            }
        }
    }
}

/// Digest under which an API key is stored.
pub fn api_key_digest(api_key: &str) -> String {
    hex::encode(Sha256::digest(api_key.as_bytes()))
}

/// Parse a `DD/MM/YYYY` window. Both bounds or neither; the end is inclusive.
fn parse_window(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let start = start.map(str::trim).filter(|s| !s.is_empty());
    let end = end.map(str::trim).filter(|s| !s.is_empty());

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (None, None) => return Ok(None),
        _ => return Err(AppError::invalid_arguments()),
    };

    let parse = |value: &str| {
        NaiveDate::parse_from_str(value, SETTINGS_DATE_FORMAT)
            .map_err(|_| AppError::invalid_arguments())
    };
    let start = parse(start)?.and_time(NaiveTime::MIN).and_utc();
    let end = parse(end)?
        .and_hms_opt(23, 59, 59)
        .ok_or_else(AppError::invalid_arguments)?
        .and_utc();

    if start > end {
        return Err(AppError::invalid_arguments());
    }
    Ok(Some((start, end)))
}
