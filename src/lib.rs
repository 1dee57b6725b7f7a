// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Referral service: phone-number authentication and invite codes
//!
//! Users authenticate with a phone number, verify a one-time code, and can
//! activate another user's invite code to record a referral.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::ReferralService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub referral_service: ReferralService,
}
