use async_trait::async_trait;
use chrono::Utc;
use quest_core::model::UserId;
use sqlx::Row;

use super::{SqliteStore, map_sqlx};
use crate::repository::{AccountRepository, StorageError, StoredAccount};

#[async_trait]
impl AccountRepository for SqliteStore {
    async fn find_account(&self, email: &str) -> Result<Option<StoredAccount>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT email, user_id, password_hash
            FROM accounts
            WHERE email = ?1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let column = |name: &str| -> Result<String, StorageError> {
            row.try_get(name)
                .map_err(|err| StorageError::Serialization(err.to_string()))
        };
        let user_id = UserId::new(column("user_id")?)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(StoredAccount {
            email: column("email")?,
            user_id,
            password_hash: column("password_hash")?,
        }))
    }

    async fn insert_account(&self, account: &StoredAccount) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO accounts (email, user_id, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(&account.email)
        .bind(account.user_id.as_str())
        .bind(&account.password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}
