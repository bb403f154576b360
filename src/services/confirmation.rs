// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Short-lived email confirmation tokens.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifetime of a confirmation token in seconds.
pub const CONFIRMATION_TTL_SECS: usize = 360;

/// Confirmation token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConfirmationClaims {
    /// Deterministic ciphertext of the email under the issuing session
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Sign a confirmation token for an encrypted email.
pub fn create_confirmation_token(email_ciphertext: &str, secret: &[u8]) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = ConfirmationClaims {
        sub: email_ciphertext.to_string(),
        iat: now,
        exp: now + CONFIRMATION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

/// Check signature and expiry, returning the encrypted email subject.
pub fn verify_confirmation_token(
    token: &str,
    secret: &[u8],
) -> Result<String, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<ConfirmationClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims.sub)
}
