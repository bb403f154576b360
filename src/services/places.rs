// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place booking: claim, release, and semi-flex ownership.
//!
//! A semi-flex place belongs to an owner and may be claimed by anyone else
//! only while its availability window is open. Depending on configuration
//! the window is read from the place itself or from the owner's record.

use crate::config::AvailabilityCheck;
use crate::db::Store;
use crate::error::{messages, AppError, Result};
use crate::models::{HistoricalEntry, Place, User};
use crate::services::cipher::{FieldCipher, ProtectedField};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Outcome of a successful claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The place did not exist and was created.
    Created,
    /// An existing free place was taken.
    Taken,
    /// The caller already held the place; nothing changed.
    AlreadyHeld,
}

/// Place booking service.
#[derive(Clone)]
pub struct PlaceService {
    db: Arc<dyn Store>,
    availability: AvailabilityCheck,
}

impl PlaceService {
    pub fn new(db: Arc<dyn Store>, availability: AvailabilityCheck) -> Self {
        Self { db, availability }
    }

    /// Assign a place to a user.
    ///
    /// On conflict nothing is written and the error carries the decrypted
    /// name of whoever holds the place (or owns it, for a closed semi-flex
    /// window).
    pub async fn take_place(
        &self,
        cipher: &FieldCipher,
        id_place: &str,
        id_user: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        require_non_empty(&[id_place, id_user])?;
        let user_index = cipher.blind_index(id_user)?;

        let existing = self.db.get_place(id_place).await?;
        if let Some(place) = &existing {
            if place.using && place.id_user == user_index {
                tracing::debug!(id_place, "Place already held by caller");
                return Ok(ClaimOutcome::AlreadyHeld);
            }
            if !self.is_available(place, &user_index, now).await? {
                let holder = if place.using {
                    &place.id_user
                } else {
                    &place.id_owner
                };
                return Err(self.conflict(cipher, holder).await?);
            }
        }

        let mut user = self
            .db
            .find_user_by_id(&user_index)
            .await?
            .ok_or(AppError::NotFound(messages::USER_FIND))?;

        if !user.id_place.is_empty() && user.id_place != id_place {
            tracing::info!(
                from = %user.id_place,
                to = id_place,
                "User moves to another place, releasing previous one"
            );
            let previous = user.id_place.clone();
            self.release_if_held(&previous, &user_index).await?;
        }
        close_open_entry(&mut user, now);

        let outcome = match existing {
            None => {
                tracing::info!(id_place, "Place doesn't exist, creating it");
                self.db
                    .upsert_place(&Place::occupied(id_place, &user_index))
                    .await?;
                ClaimOutcome::Created
            }
            Some(mut place) => {
                tracing::info!(id_place, "Place exists and is free");
                place.occupy(&user_index);
                self.db.upsert_place(&place).await?;
                ClaimOutcome::Taken
            }
        };

        user.id_place = id_place.to_string();
        user.historical.push(HistoricalEntry {
            id_place: id_place.to_string(),
            begin: format_utc_rfc3339(now),
            end: String::new(),
        });
        self.db.upsert_user(&user).await?;

        Ok(outcome)
    }

    /// Release a place held by the user and close their open history entry.
    pub async fn leave_place(
        &self,
        cipher: &FieldCipher,
        id_place: &str,
        id_user: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        require_non_empty(&[id_place, id_user])?;
        let user_index = cipher.blind_index(id_user)?;

        let mut user = self
            .db
            .find_user_by_id(&user_index)
            .await?
            .ok_or(AppError::NotFound(messages::USER_FIND))?;

        let mut place = self
            .db
            .get_place(id_place)
            .await?
            .ok_or(AppError::NotFound(messages::PLACE_FIND))?;

        // A free place may only be left by the user recorded as sitting there
        let holds = place.using && place.id_user == user_index;
        if !holds && (place.using || user.id_place != id_place) {
            return Err(AppError::Validation(messages::USER_ID_MATCH.to_string()));
        }
        if holds {
            place.release();
            self.db.upsert_place(&place).await?;
        }

        if !close_open_entry(&mut user, now) {
            tracing::warn!(id_place, "No open history entry to close");
        }
        user.id_place.clear();
        self.db.upsert_user(&user).await?;

        Ok(())
    }

    /// Make a place semi-flex, owned by the given user. The window is reset.
    pub async fn assign_place(
        &self,
        cipher: &FieldCipher,
        id_place: &str,
        id_user: &str,
    ) -> Result<()> {
        require_non_empty(&[id_place, id_user])?;
        let owner_index = cipher.blind_index(id_user)?;

        let mut place = self
            .db
            .get_place(id_place)
            .await?
            .unwrap_or_else(|| Place::vacant(id_place));
        place.id_owner = owner_index;
        place.semi_flex = true;
        place.start_date = None;
        place.end_date = None;

        self.db.upsert_place(&place).await
    }

    /// Remove ownership from a place, making it a regular flex desk.
    pub async fn unassign_place(&self, id_place: &str) -> Result<()> {
        require_non_empty(&[id_place])?;

        let mut place = self
            .db
            .get_place(id_place)
            .await?
            .ok_or(AppError::NotFound(messages::PLACE_FIND))?;
        place.id_owner.clear();
        place.semi_flex = false;
        place.start_date = None;
        place.end_date = None;

        self.db.upsert_place(&place).await
    }

    /// Free a place if the given user is its occupant.
    pub(crate) async fn release_if_held(&self, id_place: &str, user_index: &str) -> Result<()> {
        if let Some(mut place) = self.db.get_place(id_place).await? {
            if place.id_user == user_index {
                place.release();
                self.db.upsert_place(&place).await?;
            }
        }
        Ok(())
    }

    async fn is_available(
        &self,
        place: &Place,
        claimant_index: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if place.using {
            return Ok(false);
        }
        if !place.semi_flex || place.id_owner == claimant_index {
            return Ok(true);
        }

        match self.availability {
            AvailabilityCheck::Place => Ok(place.window_contains(now)),
            AvailabilityCheck::Owner => Ok(self
                .db
                .find_user_by_id(&place.id_owner)
                .await?
                .is_some_and(|owner| owner.window_contains(now))),
        }
    }

    async fn conflict(&self, cipher: &FieldCipher, holder_index: &str) -> Result<AppError> {
        let holder = if holder_index.is_empty() {
            None
        } else {
            self.db.find_user_by_id(holder_index).await?
        };

        let Some(holder) = holder else {
            tracing::warn!("Place holder not found");
            return Ok(AppError::Conflict {
                name: String::new(),
                fname: String::new(),
            });
        };

        // Fields sealed under another session's key cannot be opened here
        let names = open_optional(cipher, holder.name.as_ref()).and_then(|name| {
            open_optional(cipher, holder.fname.as_ref()).map(|fname| (name, fname))
        });
        let (name, fname) = names.unwrap_or_else(|e| {
            tracing::info!(error = %e, "Place holder name not readable with this session");
            (String::new(), String::new())
        });

        Ok(AppError::Conflict { name, fname })
    }
}

fn open_optional(cipher: &FieldCipher, field: Option<&ProtectedField>) -> Result<String> {
    match field {
        Some(value) => Ok(cipher.open(value)?),
        None => Ok(String::new()),
    }
}

/// Close the last history entry if it is open. Returns whether one was closed.
fn close_open_entry(user: &mut User, now: DateTime<Utc>) -> bool {
    match user.open_history_entry() {
        Some(i) => {
            user.historical[i].end = format_utc_rfc3339(now);
            true
        }
        None => false,
    }
}

fn require_non_empty(values: &[&str]) -> Result<()> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(AppError::invalid_arguments());
    }
    Ok(())
}
