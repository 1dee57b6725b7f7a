// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use referral_service::config::{Config, ReferralPolicy};
use referral_service::db::{FirestoreDb, MemoryStore};
use referral_service::routes::create_router;
use referral_service::services::{CodeSender, ReferralService, SmsError};
use referral_service::AppState;
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Sender that remembers every code it was asked to deliver.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

#[allow(dead_code)]
impl RecordingSender {
    /// Most recent code sent to `phone`.
    pub fn last_code_for(&self, phone: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(p, _)| p == phone)
            .map(|(_, code)| code.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl CodeSender for RecordingSender {
    async fn send_auth_code(&self, phone_number: &str, code: &str) -> Result<(), SmsError> {
        self.sent
            .lock()
            .unwrap()
            .push((phone_number.to_string(), code.to_string()));
        Ok(())
    }
}

/// Sender that always fails, for dispatch error paths.
#[allow(dead_code)]
pub struct FailingSender;

#[async_trait]
impl CodeSender for FailingSender {
    async fn send_auth_code(&self, _phone_number: &str, _code: &str) -> Result<(), SmsError> {
        Err(SmsError::Provider {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

/// Service plus handles on its in-memory collaborators.
#[allow(dead_code)]
pub struct TestService {
    pub service: ReferralService,
    pub store: MemoryStore,
    pub sender: Arc<RecordingSender>,
}

#[allow(dead_code)]
pub fn test_service_with_policy(policy: ReferralPolicy) -> TestService {
    let store = MemoryStore::new();
    let sender = Arc::new(RecordingSender::default());
    let service = ReferralService::new(Arc::new(store.clone()), sender.clone(), policy);
    TestService {
        service,
        store,
        sender,
    }
}

#[allow(dead_code)]
pub fn test_service() -> TestService {
    test_service_with_policy(ReferralPolicy::default())
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the recording sender.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<RecordingSender>) {
    let config = Config::test_default();
    let TestService {
        service, sender, ..
    } = test_service_with_policy(config.referral_policy);

    let state = Arc::new(AppState {
        config,
        referral_service: service,
    });

    (create_router(state), sender)
}

/// Build a JSON POST request.
#[allow(dead_code)]
pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request.
#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
