//! User model for storage and API.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User record stored in the `users` collection, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier (UUID v4)
    pub id: String,
    /// Phone number (also used as document ID)
    pub phone_number: String,
    /// Most recently issued one-time auth code
    #[serde(default)]
    pub auth_code: Option<String>,
    /// This user's own invite code, generated once
    #[serde(default)]
    pub invite_code: Option<String>,
    /// Invite code this user redeemed from someone else
    #[serde(default)]
    pub activated_invite_code: Option<String>,
    /// When the record was created (RFC3339, UTC)
    pub created_at: String,
}

impl User {
    /// A fresh record for `phone_number` carrying its initial invite code.
    pub fn new(phone_number: &str, invite_code: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phone_number: phone_number.to_string(),
            auth_code: None,
            invite_code: Some(invite_code),
            activated_invite_code: None,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Public view of a user and their referral downline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub phone: String,
    pub invite_code: Option<String>,
    pub activated_invite_code: Option<String>,
    /// Phone numbers of users who activated this user's invite code
    pub used_by: Vec<String>,
}
