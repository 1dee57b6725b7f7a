//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file is honored for local
//! development.

use std::env;
use std::time::Duration;

/// Default simulated delay for the log-only code sender.
pub const DEFAULT_DISPATCH_DELAY_MS: u64 = 1000;

/// Which `UserStore` implementation to wire up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Firestore,
}

/// Twilio credentials for SMS delivery of auth codes.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// Rules for invite activation that the base flow leaves open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferralPolicy {
    /// Allow a user to activate their own invite code.
    pub allow_self_referral: bool,
    /// Allow overwriting a previously activated invite code.
    pub allow_reactivation: bool,
}

impl Default for ReferralPolicy {
    fn default() -> Self {
        Self {
            allow_self_referral: true,
            allow_reactivation: true,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Storage backend for user records
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Delay the log-only sender waits before "delivering" a code
    pub dispatch_delay: Duration,
    /// SMS delivery via Twilio; `None` falls back to the log sender
    pub twilio: Option<TwilioConfig>,
    pub referral_policy: ReferralPolicy,
}

impl Config {
    /// Config for tests: in-memory store, no dispatch delay.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            dispatch_delay: Duration::ZERO,
            twilio: None,
            referral_policy: ReferralPolicy::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("USER_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("memory") => StoreBackend::Memory,
            Some("firestore") => StoreBackend::Firestore,
            Some(_) => return Err(ConfigError::Invalid("USER_STORE")),
        };

        let gcp_project_id = match (store_backend, lookup("GCP_PROJECT_ID")) {
            (_, Some(id)) if !id.trim().is_empty() => id.trim().to_string(),
            (StoreBackend::Firestore, _) => return Err(ConfigError::Missing("GCP_PROJECT_ID")),
            (StoreBackend::Memory, _) => "local-dev".to_string(),
        };

        let twilio = match (
            lookup("TWILIO_ACCOUNT_SID"),
            lookup("TWILIO_AUTH_TOKEN"),
            lookup("TWILIO_FROM_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioConfig {
                account_sid: account_sid.trim().to_string(),
                auth_token: auth_token.trim().to_string(),
                from_number: from_number.trim().to_string(),
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::Invalid("TWILIO_*")),
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", 8080)?,
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            store_backend,
            gcp_project_id,
            dispatch_delay: Duration::from_millis(parse_or(
                &lookup,
                "CODE_DISPATCH_DELAY_MS",
                DEFAULT_DISPATCH_DELAY_MS,
            )?),
            twilio,
            referral_policy: ReferralPolicy {
                allow_self_referral: parse_or(&lookup, "ALLOW_SELF_REFERRAL", true)?,
                allow_reactivation: parse_or(&lookup, "ALLOW_INVITE_REACTIVATION", true)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
