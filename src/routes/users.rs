// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and invite activation routes.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{
    required, validate, validate_phone, validated_json, MessageResponse, MAX_CODE_LEN,
    MAX_PHONE_LEN,
};
use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/activate-invite", post(activate_invite))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileQuery {
    #[validate(
        required(message = "Phone number is required"),
        length(min = 1, max = MAX_PHONE_LEN),
        custom(function = "validate_phone")
    )]
    phone: Option<String>,
}

/// Get a user's invite codes and the phones that used their code.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<Json<UserProfile>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let phone = required(validate(query)?.phone, "phone")?;

    let user = state.referral_service.get_user(&phone).await?;
    let profile = state.referral_service.get_user_profile(&user).await?;

    Ok(Json(profile))
}

// ─── Invite Activation ───────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ActivateInviteRequest {
    #[serde(default)]
    #[validate(
        required(message = "Phone number is required"),
        length(min = 1, max = MAX_PHONE_LEN),
        custom(function = "validate_phone")
    )]
    phone: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Invite code is required"),
        length(min = 1, max = MAX_CODE_LEN)
    )]
    code: Option<String>,
}

/// Redeem another user's invite code.
async fn activate_invite(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ActivateInviteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let body = validated_json(payload)?;
    let phone = required(body.phone, "phone")?;
    let code = required(body.code, "code")?;

    let user = state.referral_service.get_user(&phone).await?;
    state
        .referral_service
        .activate_invite_code(&user, &code)
        .await?;

    Ok(MessageResponse::new("Invite code activated successfully"))
}
