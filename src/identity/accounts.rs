use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{BackendError, StoreResult};

/// Credential record owned by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub disabled: bool,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;
    /// Fails with `auth/email-already-in-use` when the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Account>;
}

pub(crate) fn email_in_use() -> BackendError {
    BackendError::new(
        "auth/email-already-in-use",
        "The email address is already in use by another account.",
    )
}

#[derive(Default)]
pub struct MemoryAccounts {
    by_email: RwLock<HashMap<String, Account>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_disabled(&self, email: &str, disabled: bool) {
        if let Some(account) = self.by_email.write().await.get_mut(email) {
            account.disabled = disabled;
        }
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self.by_email.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self
            .by_email
            .read()
            .await
            .values()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Account> {
        let mut guard = self.by_email.write().await;
        if guard.contains_key(email) {
            return Err(email_in_use().into());
        }
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            disabled: false,
        };
        guard.insert(email.to_string(), account.clone());
        Ok(account)
    }
}
