use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use super::accounts::{Account, AccountRepository};
use super::password::{hash_password, verify_password};
use super::tokens::SessionKeys;
use super::{Identity, Session, SessionCell};
use crate::config::AppConfig;
use crate::error::{BackendError, StoreResult};
use crate::validation::{validate_email, validate_password};

/// Email/password identity provider over an account repository.
pub struct PasswordIdentity<R> {
    accounts: R,
    keys: SessionKeys,
    session: SessionCell,
    max_failed_sign_ins: u32,
    lockout: Duration,
    failures: Mutex<HashMap<String, FailedSignIns>>,
}

/// Consecutive wrong-password attempts for one email.
#[derive(Debug, Clone, Copy)]
struct FailedSignIns {
    count: u32,
    last: OffsetDateTime,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl<R: AccountRepository> PasswordIdentity<R> {
    pub fn new(accounts: R, config: &AppConfig) -> Self {
        Self {
            accounts,
            keys: SessionKeys::from_config(&config.session),
            session: SessionCell::default(),
            max_failed_sign_ins: config.max_failed_sign_ins,
            lockout: Duration::minutes(config.sign_in_lockout_minutes),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn accounts(&self) -> &R {
        &self.accounts
    }

    fn issue(&self, account: &Account) -> StoreResult<Session> {
        let session = Session {
            uid: account.id.to_string(),
            email: account.email.clone(),
            access_token: self.keys.sign_access(account.id)?,
            refresh_token: self.keys.sign_refresh(account.id)?,
        };
        self.session.set(Some(session.clone()));
        Ok(session)
    }

    /// Failures still inside the lockout window; stale counters are dropped.
    fn failure_count(&self, email: &str) -> u32 {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        match failures.get(email).copied() {
            Some(f) if OffsetDateTime::now_utc() - f.last < self.lockout => f.count,
            Some(_) => {
                failures.remove(email);
                0
            }
            None => 0,
        }
    }

    fn record_failure(&self, email: &str) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = failures.entry(email.to_string()).or_insert(FailedSignIns {
            count: 0,
            last: OffsetDateTime::now_utc(),
        });
        entry.count += 1;
        entry.last = OffsetDateTime::now_utc();
    }

    fn clear_failures(&self, email: &str) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        failures.remove(email);
    }

    #[cfg(test)]
    fn age_failures(&self, by: Duration) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        for f in failures.values_mut() {
            f.last -= by;
        }
    }
}

#[async_trait]
impl<R: AccountRepository> Identity for PasswordIdentity<R> {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> StoreResult<Session> {
        let email = normalize_email(email);
        if !validate_email(&email) {
            return Err(BackendError::new(
                "auth/invalid-email",
                "The email address is badly formatted.",
            )
            .into());
        }
        if !validate_password(password) {
            return Err(BackendError::new(
                "auth/weak-password",
                "The given password is invalid.",
            )
            .into());
        }

        let hash = hash_password(password)?;
        let account = self.accounts.create(&email, &hash).await.map_err(|e| {
            warn!(email = %email, error = %e, "sign up rejected");
            e
        })?;
        info!(uid = %account.id, email = %account.email, "account created");
        self.issue(&account)
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<Session> {
        let email = normalize_email(email);
        if self.failure_count(&email) >= self.max_failed_sign_ins {
            warn!(email = %email, "sign in throttled");
            return Err(BackendError::new(
                "auth/too-many-requests",
                "Access to this account has been temporarily disabled due to many failed login attempts.",
            )
            .into());
        }

        let account = match self.accounts.find_by_email(&email).await? {
            Some(a) => a,
            None => {
                warn!(email = %email, "sign in unknown email");
                return Err(BackendError::new(
                    "auth/user-not-found",
                    "There is no user record corresponding to this identifier.",
                )
                .into());
            }
        };

        if account.disabled {
            return Err(BackendError::new(
                "auth/user-disabled",
                "The user account has been disabled by an administrator.",
            )
            .into());
        }

        if !verify_password(password, &account.password_hash)? {
            self.record_failure(&email);
            warn!(email = %email, uid = %account.id, "sign in invalid password");
            return Err(BackendError::new(
                "auth/wrong-password",
                "The password is invalid for the given email.",
            )
            .into());
        }

        self.clear_failures(&email);
        info!(uid = %account.id, "signed in");
        self.issue(&account)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        if let Some(session) = self.session.get() {
            info!(uid = %session.uid, "signed out");
        }
        self.session.set(None);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn refresh_session(&self) -> StoreResult<Session> {
        let current = self.session.get().ok_or_else(|| {
            BackendError::new("auth/no-current-user", "No user currently signed in.")
        })?;

        let claims = match self.keys.verify_refresh(&current.refresh_token) {
            Ok(c) => c,
            Err(e) => {
                warn!(uid = %current.uid, "refresh token rejected; clearing session");
                self.session.set(None);
                return Err(e);
            }
        };

        let account = self.accounts.find_by_id(claims.sub).await?.ok_or_else(|| {
            BackendError::new(
                "auth/user-not-found",
                "There is no user record corresponding to this identifier.",
            )
        })?;
        if account.disabled {
            self.session.set(None);
            return Err(BackendError::new(
                "auth/user-disabled",
                "The user account has been disabled by an administrator.",
            )
            .into());
        }
        self.issue(&account)
    }

    fn current_session(&self) -> Option<Session> {
        self.session.get()
    }

    fn observe_session(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}
