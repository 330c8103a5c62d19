use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::account::errors::StoreError;
use crate::account::models::EmailAddress;
use crate::account::models::User;
use crate::account::models::UserId;
use crate::account::ports::CredentialStore;

/// Credential store kept in process memory.
///
/// Used when no database is configured and by the test suites. Deleted
/// users stay in the map with `deleted_at` set.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        for existing in users.values().filter(|u| !u.is_deleted()) {
            if existing.email == user.email {
                return Err(StoreError::DuplicateEmail(user.email.to_string()));
            }
            if existing.username == user.username {
                return Err(StoreError::DuplicateUsername(user.username.to_string()));
            }
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| !u.is_deleted() && &u.email == email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, StoreError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .get(id)
            .filter(|u| !u.is_deleted())
            .cloned())
    }

    async fn exists_by_id(&self, id: &UserId) -> Result<bool, StoreError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        user.password_hash = password_hash.to_string();
        user.updated_at = updated_at;
        Ok(())
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut live: Vec<&User> = users.values().filter(|u| !u.is_deleted()).collect();
        live.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });

        Ok(live
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        user.deleted_at = Some(deleted_at);
        user.updated_at = deleted_at;
        Ok(())
    }
}
