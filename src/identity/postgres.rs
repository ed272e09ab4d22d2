use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::accounts::{email_in_use, Account, AccountRepository};
use crate::error::{StoreError, StoreResult};

#[derive(Clone)]
pub struct PgAccounts {
    db: PgPool,
}

impl PgAccounts {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for PgAccounts {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, disabled
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"SELECT id, email, password_hash, disabled FROM accounts WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Account> {
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, disabled
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match created {
            Ok(account) => Ok(account),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Backend(email_in_use()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
