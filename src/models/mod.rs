// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod api_key;
pub mod place;
pub mod user;

pub use api_key::ApiCredential;
pub use place::Place;
pub use user::{Friend, FriendProfile, HistoricalEntry, User, UserProfile};
