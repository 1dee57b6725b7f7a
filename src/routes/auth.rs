// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Phone authentication routes.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use super::{
    required, validate_phone, validated_json, MessageResponse, MAX_CODE_LEN, MAX_PHONE_LEN,
};
use crate::error::Result;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth", post(authenticate))
        .route("/api/verify-code", post(verify_code))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AuthRequest {
    #[serde(default)]
    #[validate(
        required(message = "Phone number is required"),
        length(min = 1, max = MAX_PHONE_LEN),
        custom(function = "validate_phone")
    )]
    phone: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub message: String,
    pub user_id: String,
    pub invite_code: String,
}

/// Start (or restart) phone authentication and dispatch a one-time code.
async fn authenticate(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let body = validated_json(payload)?;
    let phone = required(body.phone, "phone")?;

    let user = state.referral_service.authenticate(&phone).await?;

    Ok(Json(AuthResponse {
        message: "Authentication successful".to_string(),
        user_id: user.id,
        invite_code: user.invite_code.unwrap_or_default(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    #[validate(
        required(message = "Phone number is required"),
        length(min = 1, max = MAX_PHONE_LEN),
        custom(function = "validate_phone")
    )]
    phone: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Auth code is required"),
        length(min = 1, max = MAX_CODE_LEN)
    )]
    auth_code: Option<String>,
}

/// Check a one-time code for a known phone number.
async fn verify_code(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<VerifyCodeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let body = validated_json(payload)?;
    let phone = required(body.phone, "phone")?;
    let code = required(body.auth_code, "auth_code")?;

    let user = state.referral_service.get_user(&phone).await?;
    state.referral_service.verify_auth_code(&user, &code)?;

    Ok(MessageResponse::new("Code verified successfully"))
}
