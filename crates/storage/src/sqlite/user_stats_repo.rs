use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quest_core::model::{UserId, UserStats};
use sqlx::Row;

use super::{SqliteStore, map_sqlx};
use super::mapping::{decode_stats, encode_stats};
use crate::repository::{StorageError, UserStatsRepository};

#[async_trait]
impl UserStatsRepository for SqliteStore {
    async fn read_stats(&self, user: &UserId) -> Result<Option<UserStats>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT document
            FROM user_stats
            WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let document: String = row
            .try_get("document")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        decode_stats(&document).map(Some)
    }

    async fn write_stats(&self, user: &UserId, stats: &UserStats) -> Result<(), StorageError> {
        let document = encode_stats(stats)?;
        let updated_at: DateTime<Utc> = stats.last_activity_at;

        sqlx::query(
            r"
            INSERT INTO user_stats (user_id, document, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.as_str())
        .bind(document)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}
