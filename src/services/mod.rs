// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod codes;
pub mod referral;
pub mod sms;

pub use referral::ReferralService;
pub use sms::{CodeSender, LogCodeSender, SmsError, TwilioCodeSender};
