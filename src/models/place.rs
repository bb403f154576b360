// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place (desk) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A physical desk, keyed by its plain identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Place {
    /// Place identifier (also used as document ID)
    pub id: String,
    /// Whether someone currently occupies the place
    #[serde(default)]
    pub using: bool,
    /// Identifier index of the occupant, empty when free
    #[serde(default)]
    pub id_user: String,
    /// Identifier index of the owner of a semi-flex place
    #[serde(default)]
    pub id_owner: String,
    #[serde(default)]
    pub semi_flex: bool,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub end_date: Option<DateTime<Utc>>,
}

impl Place {
    /// A place created by its first claim.
    pub fn occupied(id: &str, occupant: &str) -> Self {
        Self {
            id: id.to_string(),
            using: true,
            id_user: occupant.to_string(),
            id_owner: String::new(),
            semi_flex: false,
            start_date: None,
            end_date: None,
        }
    }

    /// A free, unowned place.
    pub fn vacant(id: &str) -> Self {
        Self {
            using: false,
            id_user: String::new(),
            ..Self::occupied(id, "")
        }
    }

    pub fn occupy(&mut self, occupant: &str) {
        self.using = true;
        self.id_user = occupant.to_string();
    }

    pub fn release(&mut self) {
        self.using = false;
        self.id_user.clear();
    }

    /// Whether `now` falls inside the place's own sharing window.
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        matches!((self.start_date, self.end_date), (Some(start), Some(end)) if start <= now && now <= end)
    }
}
