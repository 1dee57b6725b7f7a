//! Database layer: the `UserStore` contract and its backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Persistence for user records, keyed by phone number.
///
/// Every update method fails with `AppError::NotFound` when no record exists
/// for the phone number.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by phone number.
    async fn get_user(&self, phone_number: &str) -> Result<Option<User>, AppError>;

    /// Insert `new_user` unless a record for its phone number already exists.
    ///
    /// Returns the stored record and whether it was created by this call. At
    /// most one concurrent caller observes `true` for a given phone number.
    async fn get_or_create_user(&self, new_user: User) -> Result<(User, bool), AppError>;

    /// Replace the user's auth code.
    async fn set_auth_code(&self, phone_number: &str, code: &str) -> Result<User, AppError>;

    /// Set the user's invite code if it has none; an existing code is kept.
    async fn set_invite_code_if_absent(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<User, AppError>;

    /// Record the invite code this user redeemed.
    async fn set_activated_invite_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<User, AppError>;

    /// Record the redeemed invite code only if the user has none yet.
    ///
    /// The check and the write are atomic. Returns the stored record and
    /// whether this call wrote the code; at most one concurrent caller
    /// observes `true` for a given phone number.
    async fn set_activated_invite_code_if_absent(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<(User, bool), AppError>;

    /// Find the user owning `invite_code`, if any.
    async fn find_by_invite_code(&self, invite_code: &str) -> Result<Option<User>, AppError>;

    /// All users who activated `invite_code`.
    async fn find_by_activated_invite_code(
        &self,
        invite_code: &str,
    ) -> Result<Vec<User>, AppError>;
}

pub(crate) fn user_not_found(phone_number: &str) -> AppError {
    AppError::NotFound(format!("User with phone {} not found", phone_number))
}
