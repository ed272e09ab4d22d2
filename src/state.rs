use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::identity::{Identity, MemoryAccounts, PasswordIdentity, PgAccounts};
use crate::jobs::JobsStore;
use crate::notifications::{NotificationPermissions, PermissionStatus, StaticPermissions};
use crate::storage::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::users::UserStore;

/// Collaborators and stores shared with the screens.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn Identity>,
    pub notifications: Arc<dyn NotificationPermissions>,
    pub users: Arc<UserStore>,
    pub jobs: Arc<JobsStore>,
}

impl AppState {
    /// Connects the PostgreSQL-backed collaborators and applies migrations.
    pub async fn init(notifications: Arc<dyn NotificationPermissions>) -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let documents = Arc::new(PgDocumentStore::new(db.clone())) as Arc<dyn DocumentStore>;
        let identity =
            Arc::new(PasswordIdentity::new(PgAccounts::new(db), &config)) as Arc<dyn Identity>;

        Ok(Self::from_parts(config, documents, identity, notifications))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn Identity>,
        notifications: Arc<dyn NotificationPermissions>,
    ) -> Self {
        let users = Arc::new(UserStore::new(documents.clone(), identity.clone()));
        let jobs = Arc::new(JobsStore::new(documents.clone()));
        Self {
            config,
            documents,
            identity,
            notifications,
            users,
            jobs,
        }
    }

    pub fn fake() -> Self {
        Self::fake_with_store(Arc::new(MemoryDocumentStore::new()))
    }

    /// In-memory collaborators around a caller-held document store.
    pub fn fake_with_store(documents: Arc<MemoryDocumentStore>) -> Self {
        let config = Arc::new(AppConfig::for_tests());
        let identity = Arc::new(PasswordIdentity::new(MemoryAccounts::new(), &config));
        let notifications = Arc::new(StaticPermissions::new(
            PermissionStatus::Undetermined,
            PermissionStatus::Granted,
        ));
        Self::from_parts(config, documents, identity, notifications)
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;
    use crate::notifications::ensure_notification_permission;

    #[tokio::test]
    async fn fake_state_shares_collaborators_with_stores() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let st = AppState::fake_with_store(documents.clone());
        st.jobs.initialize().await.unwrap();
        assert_eq!(documents.read_count(), 1);

        let cloned = st.clone();
        assert!(Arc::ptr_eq(&st.jobs, &cloned.jobs));
    }

    #[tokio::test]
    async fn fake_notifications_grant_on_request() {
        let st = AppState::fake();
        let status = ensure_notification_permission(st.notifications.as_ref())
            .await
            .unwrap();
        assert_eq!(status, PermissionStatus::Granted);
    }
}
