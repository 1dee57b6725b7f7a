// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use referral_service::error::AppError;

#[test]
fn test_error_status_mapping() {
    let cases = [
        (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
        (AppError::InvalidCode("x".into()), StatusCode::BAD_REQUEST),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::CodeDispatch("x".into()), StatusCode::BAD_GATEWAY),
        (
            AppError::Database("x".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AppError::Internal(anyhow::anyhow!("x")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        assert_eq!(err.status(), status, "{err}");
        assert_eq!(err.into_response().status(), status);
    }
}

#[tokio::test]
async fn test_internal_details_not_exposed() {
    let response = AppError::Database("connection string with secrets".into()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let response = AppError::InvalidCode("Invalid invite code".into()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "invalid_code");
    assert_eq!(body["details"], "Invalid invite code");
}
