//! Identity collaborator: email/password accounts and the current session.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::StoreResult;

pub mod accounts;
pub mod password;
pub mod postgres;
pub mod service;
pub mod tokens;

pub use accounts::{Account, AccountRepository, MemoryAccounts};
pub use postgres::PgAccounts;
pub use service::PasswordIdentity;

pub type MemoryIdentity = PasswordIdentity<MemoryAccounts>;
pub type PgIdentity = PasswordIdentity<PgAccounts>;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[async_trait]
pub trait Identity: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> StoreResult<Session>;
    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<Session>;
    async fn sign_out(&self) -> StoreResult<()>;
    /// Exchanges the current refresh token for a new token pair.
    async fn refresh_session(&self) -> StoreResult<Session>;
    fn current_session(&self) -> Option<Session>;
    /// The receiver yields the current value immediately, then every change.
    fn observe_session(&self) -> watch::Receiver<Option<Session>>;
}

/// Holds the current session and notifies observers on change.
pub struct SessionCell {
    tx: watch::Sender<Option<Session>>,
}

impl Default for SessionCell {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }
}

impl SessionCell {
    pub fn get(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn set(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod session_cell_tests {
    use super::*;

    #[tokio::test]
    async fn observers_see_current_value_then_changes() {
        let cell = SessionCell::default();
        let mut rx = cell.subscribe();
        assert!(rx.borrow_and_update().is_none());

        cell.set(Some(Session {
            uid: "u1".into(),
            email: "a@b.co".into(),
            access_token: "a".into(),
            refresh_token: "r".into(),
        }));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|s| s.uid.as_str()), Some("u1"));

        let late = cell.subscribe();
        assert!(late.borrow().is_some());
    }
}
