// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod cipher;
pub mod confirmation;
pub mod friends;
pub mod image_host;
pub mod mail;
pub mod places;

pub use accounts::{AccountService, ProfileUpdate, SettingsUpdate};
pub use cipher::{CipherError, FieldCipher, ProtectedField};
pub use friends::{FriendInput, FriendService};
pub use image_host::ImageHost;
pub use mail::{MailService, OutgoingMail};
pub use places::{ClaimOutcome, PlaceService};
