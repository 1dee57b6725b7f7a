// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed `UserStore`.
//!
//! User documents live in the `users` collection with the phone number as
//! document ID, so the document key enforces one record per phone number.

use super::{collections, user_not_found, UserStore};
use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{paths, FirestoreConsistencySelector, FirestoreTransaction};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn require_user(&self, phone_number: &str) -> Result<User, AppError> {
        self.get_user(phone_number)
            .await?
            .ok_or_else(|| user_not_found(phone_number))
    }

    /// Set one optional field of a user document unless it already holds a
    /// value, as a single read-check-write transaction.
    ///
    /// The read goes through the transaction, so a concurrent writer of the
    /// same document makes the commit fail instead of being overwritten.
    /// Returns the stored record and whether this call wrote the field.
    async fn set_field_if_absent(
        &self,
        phone_number: &str,
        field_paths: Vec<String>,
        field: fn(&mut User) -> &mut Option<String>,
        value: &str,
    ) -> Result<(User, bool), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let read: Result<Option<User>, FirestoreError> = client
            .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ))
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(phone_number)
            .await;

        let mut user = match read {
            Ok(Some(user)) => user,
            Ok(None) => {
                rollback(transaction).await;
                return Err(user_not_found(phone_number));
            }
            Err(e) => {
                rollback(transaction).await;
                return Err(AppError::Database(format!(
                    "Failed to read user in transaction: {}",
                    e
                )));
            }
        };

        if field(&mut user).is_some() {
            rollback(transaction).await;
            return Ok((user, false));
        }
        *field(&mut user) = Some(value.to_string());

        let added = client
            .fluent()
            .update()
            .fields(field_paths)
            .in_col(collections::USERS)
            .document_id(phone_number)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map(|_| ());
        if let Err(e) = added {
            rollback(transaction).await;
            return Err(AppError::Database(format!(
                "Failed to add update to transaction: {}",
                e
            )));
        }

        match transaction.commit().await {
            Ok(_) => Ok((user, true)),
            Err(e) => {
                // Lost to a concurrent writer: report the value that won.
                let mut current = self.require_user(phone_number).await?;
                if field(&mut current).is_some() {
                    tracing::debug!(user_id = %current.id, "Field set by concurrent transaction");
                    Ok((current, false))
                } else {
                    Err(AppError::Database(format!("Transaction commit failed: {}", e)))
                }
            }
        }
    }
}

/// Abandon a transaction, logging rather than masking a failed rollback.
async fn rollback(transaction: FirestoreTransaction<'_>) {
    if let Err(e) = transaction.rollback().await {
        tracing::warn!(error = %e, "Transaction rollback failed");
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn get_user(&self, phone_number: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(phone_number)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_or_create_user(&self, new_user: User) -> Result<(User, bool), AppError> {
        // Create-only insert: if another request created the document first,
        // Firestore rejects this write and we read the winner's record.
        let inserted: Result<User, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&new_user.phone_number)
            .object(&new_user)
            .execute()
            .await;

        match inserted {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "Created user document");
                Ok((user, true))
            }
            Err(FirestoreError::DataConflictError(_)) => {
                let existing = self.require_user(&new_user.phone_number).await?;
                Ok((existing, false))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn set_auth_code(&self, phone_number: &str, code: &str) -> Result<User, AppError> {
        let mut user = self.require_user(phone_number).await?;
        user.auth_code = Some(code.to_string());

        self.get_client()?
            .fluent()
            .update()
            .fields(paths!(User::{auth_code}))
            .in_col(collections::USERS)
            .document_id(phone_number)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_invite_code_if_absent(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<User, AppError> {
        let (user, written) = self
            .set_field_if_absent(
                phone_number,
                paths!(User::{invite_code}),
                |user| &mut user.invite_code,
                code,
            )
            .await?;

        if written {
            tracing::info!(user_id = %user.id, "Backfilled missing invite code");
        }
        Ok(user)
    }

    async fn set_activated_invite_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<User, AppError> {
        let mut user = self.require_user(phone_number).await?;
        user.activated_invite_code = Some(code.to_string());

        self.get_client()?
            .fluent()
            .update()
            .fields(paths!(User::{activated_invite_code}))
            .in_col(collections::USERS)
            .document_id(phone_number)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_activated_invite_code_if_absent(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<(User, bool), AppError> {
        self.set_field_if_absent(
            phone_number,
            paths!(User::{activated_invite_code}),
            |user| &mut user.activated_invite_code,
            code,
        )
        .await
    }

    async fn find_by_invite_code(&self, invite_code: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("invite_code").eq(invite_code)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    async fn find_by_activated_invite_code(
        &self,
        invite_code: &str,
    ) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("activated_invite_code").eq(invite_code)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here rather than with order_by to avoid a composite index.
        users.sort_by(|a, b| a.phone_number.cmp(&b.phone_number));
        Ok(users)
    }
}
