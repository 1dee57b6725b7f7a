// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Phone authentication and invite-code referral logic.

use crate::config::ReferralPolicy;
use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{User, UserProfile};
use crate::services::codes;
use crate::services::sms::CodeSender;
use std::sync::Arc;

/// Attempts at drawing an invite code not already owned by another user.
const MAX_INVITE_CODE_ATTEMPTS: usize = 5;

/// Stateless operations over user records.
#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn UserStore>,
    sender: Arc<dyn CodeSender>,
    policy: ReferralPolicy,
}

impl ReferralService {
    pub fn new(
        store: Arc<dyn UserStore>,
        sender: Arc<dyn CodeSender>,
        policy: ReferralPolicy,
    ) -> Self {
        Self {
            store,
            sender,
            policy,
        }
    }

    /// Look up a user by phone number.
    pub async fn get_user(&self, phone_number: &str) -> Result<User> {
        self.store
            .get_user(phone_number)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Get or create the user, make sure it has an invite code, then issue
    /// and dispatch a fresh auth code.
    ///
    /// Repeated calls for the same phone number return the same user and
    /// invite code.
    pub async fn authenticate(&self, phone_number: &str) -> Result<User> {
        let user = match self.store.get_user(phone_number).await? {
            Some(user) => user,
            None => {
                let invite_code = self.new_invite_code().await?;
                let (user, created) = self
                    .store
                    .get_or_create_user(User::new(phone_number, invite_code))
                    .await?;
                if created {
                    tracing::info!(user_id = %user.id, "New user registered");
                }
                user
            }
        };

        if user.invite_code.is_none() {
            let invite_code = self.new_invite_code().await?;
            self.store
                .set_invite_code_if_absent(phone_number, &invite_code)
                .await?;
        }

        let auth_code = codes::generate_auth_code()?;
        let user = self.store.set_auth_code(phone_number, &auth_code).await?;

        self.sender.send_auth_code(phone_number, &auth_code).await?;
        tracing::info!(user_id = %user.id, "Auth code dispatched");

        Ok(user)
    }

    /// Check `code` against the user's current auth code.
    pub fn verify_auth_code<'a>(&self, user: &'a User, code: &str) -> Result<&'a User> {
        match user.auth_code.as_deref() {
            Some(expected) if expected == code => {
                tracing::info!(user_id = %user.id, "Auth code verified");
                Ok(user)
            }
            _ => {
                tracing::debug!(user_id = %user.id, "Auth code mismatch");
                Err(AppError::InvalidCode("Invalid auth code".to_string()))
            }
        }
    }

    /// Redeem another user's invite code for `user`.
    pub async fn activate_invite_code(&self, user: &User, code: &str) -> Result<User> {
        let owner = self
            .store
            .find_by_invite_code(code)
            .await?
            .ok_or_else(|| AppError::InvalidCode("Invalid invite code".to_string()))?;

        if !self.policy.allow_self_referral && owner.phone_number == user.phone_number {
            return Err(AppError::InvalidCode(
                "Cannot activate your own invite code".to_string(),
            ));
        }

        // `user` may be stale; the stored record decides whether a code was
        // already activated.
        let updated = if self.policy.allow_reactivation {
            self.store
                .set_activated_invite_code(&user.phone_number, code)
                .await?
        } else {
            let (updated, written) = self
                .store
                .set_activated_invite_code_if_absent(&user.phone_number, code)
                .await?;
            if !written {
                return Err(AppError::InvalidCode(
                    "An invite code has already been activated".to_string(),
                ));
            }
            updated
        };

        tracing::info!(
            user_id = %updated.id,
            referrer_id = %owner.id,
            "Invite code activated"
        );

        Ok(updated)
    }

    /// Profile with the user's downline.
    pub async fn get_user_profile(&self, user: &User) -> Result<UserProfile> {
        let used_by = match user.invite_code.as_deref() {
            Some(code) => self
                .store
                .find_by_activated_invite_code(code)
                .await?
                .into_iter()
                .map(|u| u.phone_number)
                .collect(),
            None => Vec::new(),
        };

        Ok(UserProfile {
            phone: user.phone_number.clone(),
            invite_code: user.invite_code.clone(),
            activated_invite_code: user.activated_invite_code.clone(),
            used_by,
        })
    }

    /// Draw an invite code, retrying while it collides with an existing one.
    ///
    /// Uniqueness is best-effort: the lookup and the later write are not
    /// atomic, so two concurrent registrations can still draw the same code.
    async fn new_invite_code(&self) -> Result<String> {
        let mut candidate = codes::generate_invite_code()?;
        for attempt in 1..MAX_INVITE_CODE_ATTEMPTS {
            if self.store.find_by_invite_code(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            tracing::debug!(attempt, "Invite code collision, regenerating");
            candidate = codes::generate_invite_code()?;
        }
        Ok(candidate)
    }
}
