// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field-level encryption for personal data (names, emails, identifiers).
//!
//! Keys are derived per request from the verified session subject and a
//! server-side pepper, so the same plaintext encrypted for two different
//! sessions never produces the same output.
//!
//! Two storage forms are provided:
//! - [`FieldCipher::encrypt`] is deterministic (synthetic nonce) and is used
//!   where a stable ciphertext is itself the value, e.g. token subjects.
//! - [`FieldCipher::seal`] produces a [`ProtectedField`]: a randomized
//!   ciphertext for storage plus a keyed-hash index for equality lookups.
//!
//! Both use AES-256-GCM-SIV and share the `hex(nonce || ciphertext || tag)`
//! layout, so [`FieldCipher::decrypt`] opens either.

use aes_gcm_siv::{
    aead::{Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Byte length of each derived key.
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce.
pub const NONCE_LEN: usize = 12;

/// Byte length of the AEAD authentication tag.
pub const TAG_LEN: usize = 16;

const ENC_INFO: &[u8] = b"flexdesk/field/enc/v1";
const NONCE_INFO: &[u8] = b"flexdesk/field/nonce/v1";
const INDEX_INFO: &[u8] = b"flexdesk/field/index/v1";

/// Errors produced by the cipher layer.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("ciphertext is not valid hex")]
    MalformedHex,

    #[error("ciphertext is too short")]
    Truncated,

    /// Wrong key or corrupted stream.
    #[error("ciphertext failed authentication")]
    Authentication,

    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,

    #[error("key derivation failed")]
    KeyDerivation,

    #[error("aead operation failed")]
    AeadFailure,
}

/// A sensitive value as persisted: randomized ciphertext plus lookup index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedField {
    /// `hex(nonce || ciphertext || tag)` with a random nonce
    pub ciphertext: String,
    /// Hex HMAC-SHA256 of the plaintext under the session's index key
    pub index: String,
}

/// Per-session field cipher.
#[derive(Clone)]
pub struct FieldCipher {
    enc_key: [u8; KEY_LEN],
    nonce_key: [u8; KEY_LEN],
    index_key: [u8; KEY_LEN],
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Derive the cipher for a session secret.
    ///
    /// The pepper is the HKDF salt; the session secret is the input keying
    /// material.
    pub fn derive(pepper: &[u8], session_secret: &str) -> Result<Self, CipherError> {
        let hk = Hkdf::<Sha256>::new(Some(pepper), session_secret.as_bytes());

        let mut enc_key = [0u8; KEY_LEN];
        let mut nonce_key = [0u8; KEY_LEN];
        let mut index_key = [0u8; KEY_LEN];
        hk.expand(ENC_INFO, &mut enc_key)
            .map_err(|_| CipherError::KeyDerivation)?;
        hk.expand(NONCE_INFO, &mut nonce_key)
            .map_err(|_| CipherError::KeyDerivation)?;
        hk.expand(INDEX_INFO, &mut index_key)
            .map_err(|_| CipherError::KeyDerivation)?;

        Ok(Self {
            enc_key,
            nonce_key,
            index_key,
        })
    }

    /// Deterministically encrypt a plaintext string.
    ///
    /// Same plaintext and key always yield the same hex string.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let digest = self.mac(&self.nonce_key, plaintext.as_bytes())?;
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        self.encrypt_with_nonce(plaintext, nonce)
    }

    /// Decrypt a hex ciphertext produced by [`encrypt`](Self::encrypt) or
    /// [`seal`](Self::seal) under this key.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let bytes = hex::decode(ciphertext).map_err(|_| CipherError::MalformedHex)?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Truncated);
        }

        let (nonce, body) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .aead()?
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| CipherError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }

    /// Encrypt a value for storage with a fresh random nonce, alongside its
    /// deterministic lookup index.
    pub fn seal(&self, plaintext: &str) -> Result<ProtectedField, CipherError> {
        use aes_gcm_siv::aead::rand_core::RngCore;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        Ok(ProtectedField {
            ciphertext: self.encrypt_with_nonce(plaintext, nonce)?,
            index: self.blind_index(plaintext)?,
        })
    }

    /// Recover the plaintext of a stored field.
    pub fn open(&self, field: &ProtectedField) -> Result<String, CipherError> {
        self.decrypt(&field.ciphertext)
    }

    /// Keyed hash used as the equality-lookup column for a value.
    pub fn blind_index(&self, plaintext: &str) -> Result<String, CipherError> {
        Ok(hex::encode(self.mac(&self.index_key, plaintext.as_bytes())?))
    }

    fn encrypt_with_nonce(
        &self,
        plaintext: &str,
        nonce: [u8; NONCE_LEN],
    ) -> Result<String, CipherError> {
        let sealed = self
            .aead()?
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::AeadFailure)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(hex::encode(out))
    }

    fn aead(&self) -> Result<Aes256GcmSiv, CipherError> {
        <Aes256GcmSiv as KeyInit>::new_from_slice(&self.enc_key)
            .map_err(|_| CipherError::KeyDerivation)
    }

    fn mac(&self, key: &[u8], data: &[u8]) -> Result<[u8; 32], CipherError> {
        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| CipherError::KeyDerivation)?;
        mac.update(data);
        let mut out = [0u8; 32];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }
}
