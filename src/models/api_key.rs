// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API credential model.

use crate::services::cipher::ProtectedField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse API credential. The opaque key itself is never stored; the
/// document is keyed by its SHA-256 digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredential {
    pub name: String,
    pub email: ProtectedField,
    /// Hex SHA-256 of the issued key
    pub key_digest: String,
    pub creation: DateTime<Utc>,
}
