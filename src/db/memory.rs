//! In-memory `UserStore` for tests and local development.

use super::{user_not_found, UserStore};
use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Process-local user store. Clones share the same records.
#[derive(Default, Clone)]
pub struct MemoryStore {
    users: Arc<DashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn update<F>(&self, phone_number: &str, apply: F) -> Result<User, AppError>
    where
        F: FnOnce(&mut User),
    {
        let mut user = self
            .users
            .get_mut(phone_number)
            .ok_or_else(|| user_not_found(phone_number))?;
        apply(user.value_mut());
        Ok(user.value().clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, phone_number: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(phone_number).map(|u| u.value().clone()))
    }

    async fn get_or_create_user(&self, new_user: User) -> Result<(User, bool), AppError> {
        // The entry holds the shard lock, so check-and-insert is atomic.
        match self.users.entry(new_user.phone_number.clone()) {
            Entry::Occupied(existing) => Ok((existing.get().clone(), false)),
            Entry::Vacant(slot) => {
                let inserted = slot.insert(new_user);
                Ok((inserted.value().clone(), true))
            }
        }
    }

    async fn set_auth_code(&self, phone_number: &str, code: &str) -> Result<User, AppError> {
        self.update(phone_number, |user| user.auth_code = Some(code.to_string()))
    }

    async fn set_invite_code_if_absent(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<User, AppError> {
        self.update(phone_number, |user| {
            if user.invite_code.is_none() {
                user.invite_code = Some(code.to_string());
            }
        })
    }

    async fn set_activated_invite_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<User, AppError> {
        self.update(phone_number, |user| {
            user.activated_invite_code = Some(code.to_string())
        })
    }

    async fn set_activated_invite_code_if_absent(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<(User, bool), AppError> {
        let mut written = false;
        let user = self.update(phone_number, |user| {
            if user.activated_invite_code.is_none() {
                user.activated_invite_code = Some(code.to_string());
                written = true;
            }
        })?;
        Ok((user, written))
    }

    async fn find_by_invite_code(&self, invite_code: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.invite_code.as_deref() == Some(invite_code))
            .map(|u| u.value().clone()))
    }

    async fn find_by_activated_invite_code(
        &self,
        invite_code: &str,
    ) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.activated_invite_code.as_deref() == Some(invite_code))
            .map(|u| u.value().clone())
            .collect();
        users.sort_by(|a, b| a.phone_number.cmp(&b.phone_number));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryStore::new();

        let (first, created) = store
            .get_or_create_user(User::new("+1000", "AAAAAA".to_string()))
            .await
            .unwrap();
        assert!(created);

        let (second, created) = store
            .get_or_create_user(User::new("+1000", "BBBBBB".to_string()))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.invite_code.as_deref(), Some("AAAAAA"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_updates_on_missing_user_fail() {
        let store = MemoryStore::new();

        let err = store.set_auth_code("+404", "1234").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_invite_code_kept_when_present() {
        let store = MemoryStore::new();
        store
            .get_or_create_user(User::new("+1000", "AAAAAA".to_string()))
            .await
            .unwrap();

        let user = store
            .set_invite_code_if_absent("+1000", "ZZZZZZ")
            .await
            .unwrap();
        assert_eq!(user.invite_code.as_deref(), Some("AAAAAA"));
    }

    #[tokio::test]
    async fn test_activated_invite_code_set_only_once() {
        let store = MemoryStore::new();
        store
            .get_or_create_user(User::new("+1000", "AAAAAA".to_string()))
            .await
            .unwrap();

        let (user, written) = store
            .set_activated_invite_code_if_absent("+1000", "BBBBBB")
            .await
            .unwrap();
        assert!(written);
        assert_eq!(user.activated_invite_code.as_deref(), Some("BBBBBB"));

        let (user, written) = store
            .set_activated_invite_code_if_absent("+1000", "CCCCCC")
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(user.activated_invite_code.as_deref(), Some("BBBBBB"));

        let err = store
            .set_activated_invite_code_if_absent("+404", "BBBBBB")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_by_activated_invite_code_sorted() {
        let store = MemoryStore::new();
        for phone in ["+3", "+1", "+2"] {
            store
                .get_or_create_user(User::new(phone, format!("CODE{}", &phone[1..])))
                .await
                .unwrap();
        }
        store.set_activated_invite_code("+3", "CODE1").await.unwrap();
        store.set_activated_invite_code("+2", "CODE1").await.unwrap();

        let phones: Vec<String> = store
            .find_by_activated_invite_code("CODE1")
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.phone_number)
            .collect();
        assert_eq!(phones, vec!["+2", "+3"]);

        let owner = store.find_by_invite_code("CODE1").await.unwrap().unwrap();
        assert_eq!(owner.phone_number, "+1");
    }
}
