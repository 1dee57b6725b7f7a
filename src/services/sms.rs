// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth code delivery.
//!
//! Handles:
//! - Simulated delivery that waits a fixed delay and logs the code
//! - SMS delivery through the Twilio Messages API

use crate::config::TwilioConfig;
use crate::error::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// Delivers one-time auth codes to a phone number.
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_auth_code(&self, phone_number: &str, code: &str) -> Result<(), SmsError>;
}

/// Errors from code delivery.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS request failed: {0}")]
    Http(String),

    #[error("SMS provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },
}

impl From<SmsError> for AppError {
    fn from(err: SmsError) -> Self {
        AppError::CodeDispatch(err.to_string())
    }
}

/// Sender that stands in for an SMS gateway: waits `delay`, then logs.
#[derive(Debug, Clone)]
pub struct LogCodeSender {
    delay: Duration,
}

impl LogCodeSender {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send_auth_code(&self, phone_number: &str, code: &str) -> Result<(), SmsError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::debug!(phone = phone_number, code, "Auth code issued (log delivery)");
        Ok(())
    }
}

/// Twilio Messages API sender.
#[derive(Clone)]
pub struct TwilioCodeSender {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioCodeSender {
    pub fn new(config: &TwilioConfig) -> Self {
        Self::with_base_url(config, "https://api.twilio.com")
    }

    /// Point the sender at a different API host (used by tests).
    pub fn with_base_url(config: &TwilioConfig, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        }
    }
}

#[async_trait]
impl CodeSender for TwilioCodeSender {
    async fn send_auth_code(&self, phone_number: &str, code: &str) -> Result<(), SmsError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let body = format!("Your verification code is {}", code);
        let form = [
            ("To", phone_number),
            ("From", self.from_number.as_str()),
            ("Body", body.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| SmsError::Http(e.to_string()))?;

        if response.status().is_success() {
            tracing::info!("Auth code sent via Twilio");
            return Ok(());
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(SmsError::Provider { status, body })
    }
}
