// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::services::cipher::{CipherError, FieldCipher, ProtectedField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in Firestore.
///
/// Document ID is `email.index`, which is known from the first login; the
/// identifier is only set once the profile is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Email address (protected)
    pub email: ProtectedField,
    /// User identifier chosen at profile completion (protected)
    #[serde(default)]
    pub id: Option<ProtectedField>,
    /// Last name (protected)
    #[serde(default)]
    pub name: Option<ProtectedField>,
    /// First name (protected)
    #[serde(default)]
    pub fname: Option<ProtectedField>,
    /// Pending confirmation JWT, empty once verified
    #[serde(default)]
    pub confirmation_token: String,
    /// Currently occupied place, empty if none
    #[serde(default)]
    pub id_place: String,
    /// Place assignment history, oldest first
    #[serde(default)]
    pub historical: Vec<HistoricalEntry>,
    /// Friend snapshots
    #[serde(default)]
    pub friend: Vec<Friend>,
    /// Profile photo URL
    #[serde(default)]
    pub photo: String,
    /// Preferred remote working day
    #[serde(default)]
    pub remote_day: String,
    /// Start of the window during which the user's own desk is shared
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// End of that window
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// When the user first logged in
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A freshly registered user known only by email.
    pub fn new(email: ProtectedField, now: DateTime<Utc>) -> Self {
        Self {
            email,
            id: None,
            name: None,
            fname: None,
            confirmation_token: String::new(),
            id_place: String::new(),
            historical: Vec::new(),
            friend: Vec::new(),
            photo: String::new(),
            remote_day: String::new(),
            start_date: None,
            end_date: None,
            created_at: now,
        }
    }

    /// Storage key.
    pub fn document_id(&self) -> &str {
        &self.email.index
    }

    /// Lookup index of the identifier, empty if the profile is incomplete.
    pub fn id_index(&self) -> &str {
        self.id.as_ref().map(|f| f.index.as_str()).unwrap_or("")
    }

    /// Index of the last history entry if it is still open.
    pub fn open_history_entry(&self) -> Option<usize> {
        self.historical
            .last()
            .filter(|entry| entry.is_open())
            .map(|_| self.historical.len() - 1)
    }

    /// Whether `now` falls inside the user's sharing window.
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        matches!((self.start_date, self.end_date), (Some(start), Some(end)) if start <= now && now <= end)
    }

    /// Decrypt into the API representation.
    pub fn to_profile(&self, cipher: &FieldCipher) -> Result<UserProfile, CipherError> {
        let open = |field: &Option<ProtectedField>| -> Result<String, CipherError> {
            field.as_ref().map(|f| cipher.open(f)).transpose().map(Option::unwrap_or_default)
        };

        Ok(UserProfile {
            id: open(&self.id)?,
            email: cipher.open(&self.email)?,
            name: open(&self.name)?,
            fname: open(&self.fname)?,
            id_place: self.id_place.clone(),
            historical: self.historical.clone(),
            friend: self
                .friend
                .iter()
                .map(|f| f.to_profile(cipher))
                .collect::<Result<_, _>>()?,
            photo: self.photo.clone(),
            remote_day: self.remote_day.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// One claim-to-release interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoricalEntry {
    pub id_place: String,
    /// RFC 3339 claim time
    pub begin: String,
    /// RFC 3339 release time, empty while the place is held
    pub end: String,
}

impl HistoricalEntry {
    pub fn is_open(&self) -> bool {
        self.end.is_empty()
    }
}

/// Denormalized snapshot of another user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friend {
    pub id: ProtectedField,
    pub name: ProtectedField,
    pub fname: ProtectedField,
    #[serde(default)]
    pub id_place: String,
    #[serde(default)]
    pub photo: String,
}

impl Friend {
    fn to_profile(&self, cipher: &FieldCipher) -> Result<FriendProfile, CipherError> {
        Ok(FriendProfile {
            id: cipher.open(&self.id)?,
            name: cipher.open(&self.name)?,
            fname: cipher.open(&self.fname)?,
            id_place: self.id_place.clone(),
            photo: self.photo.clone(),
        })
    }
}

/// Decrypted user returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub fname: String,
    pub id_place: String,
    pub historical: Vec<HistoricalEntry>,
    pub friend: Vec<FriendProfile>,
    pub photo: String,
    pub remote_day: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub start_date: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub end_date: Option<DateTime<Utc>>,
}

/// Decrypted friend entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FriendProfile {
    pub id: String,
    pub name: String,
    pub fname: String,
    pub id_place: String,
    pub photo: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cipher() -> FieldCipher {
        FieldCipher::derive(b"pepper", "session").unwrap()
    }

    #[test]
    fn test_open_history_entry() {
        let c = cipher();
        let mut user = User::new(c.seal("a@b.c").unwrap(), Utc::now());
        assert_eq!(user.open_history_entry(), None);

        user.historical.push(HistoricalEntry {
            id_place: "A".into(),
            begin: "2026-01-01T08:00:00Z".into(),
            end: "2026-01-01T18:00:00Z".into(),
        });
        assert_eq!(user.open_history_entry(), None);

        user.historical.push(HistoricalEntry {
            id_place: "B".into(),
            begin: "2026-01-02T08:00:00Z".into(),
            end: String::new(),
        });
        assert_eq!(user.open_history_entry(), Some(1));
    }

    #[test]
    fn test_window_contains() {
        let c = cipher();
        let mut user = User::new(c.seal("a@b.c").unwrap(), Utc::now());
        let inside = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert!(!user.window_contains(inside));

        user.start_date = Some(Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());
        user.end_date = Some(Utc.with_ymd_and_hms(2026, 3, 12, 0, 0, 0).unwrap());
        assert!(user.window_contains(inside));
        assert!(!user.window_contains(Utc.with_ymd_and_hms(2026, 3, 13, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_profile_decrypts_fields() {
        let c = cipher();
        let mut user = User::new(c.seal("jane@example.com").unwrap(), Utc::now());
        user.name = Some(c.seal("Doe").unwrap());
        user.fname = Some(c.seal("Jane").unwrap());

        let profile = user.to_profile(&c).unwrap();
        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.name, "Doe");
        assert_eq!(profile.fname, "Jane");
        assert_eq!(profile.id, "");
    }

    #[test]
    fn test_profile_with_wrong_session_fails() {
        let user = User::new(cipher().seal("jane@example.com").unwrap(), Utc::now());
        let other = FieldCipher::derive(b"pepper", "other-session").unwrap();
        assert!(user.to_profile(&other).is_err());
    }
}
