use async_trait::async_trait;
use quest_core::model::{UserId, UserStats};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// A registered account as the store keeps it. Never holds a raw password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccount {
    /// Normalized (trimmed, lower-cased) email; the lookup key.
    pub email: String,
    pub user_id: UserId,
    pub password_hash: String,
}

/// Per-user stats document store.
///
/// Documents are addressed by user id. Writes replace the whole document
/// (last writer wins); there is no partial update and no concurrency token.
#[async_trait]
pub trait UserStatsRepository: Send + Sync {
    /// Fetch the stats document for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the document is corrupt.
    /// An absent document is `Ok(None)`, not an error.
    async fn read_stats(&self, user: &UserId) -> Result<Option<UserStats>, StorageError>;

    /// Replace the stats document for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn write_stats(&self, user: &UserId, stats: &UserStats) -> Result<(), StorageError>;
}

/// Registered accounts, keyed by normalized email.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn find_account(&self, email: &str) -> Result<Option<StoredAccount>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email or user id is taken.
    async fn insert_account(&self, account: &StoredAccount) -> Result<(), StorageError>;
}

/// Simple in-memory store for tests and offline play.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    stats: Arc<Mutex<HashMap<UserId, UserStats>>>,
    accounts: Arc<Mutex<HashMap<String, StoredAccount>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn document_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl UserStatsRepository for InMemoryRepository {
    async fn read_stats(&self, user: &UserId) -> Result<Option<UserStats>, StorageError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(user).cloned())
    }

    async fn write_stats(&self, user: &UserId, stats: &UserStats) -> Result<(), StorageError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(user.clone(), stats.clone());
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for InMemoryRepository {
    async fn find_account(&self, email: &str) -> Result<Option<StoredAccount>, StorageError> {
        let guard = self
            .accounts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(email).cloned())
    }

    async fn insert_account(&self, account: &StoredAccount) -> Result<(), StorageError> {
        let mut guard = self
            .accounts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&account.email)
            || guard.values().any(|a| a.user_id == account.user_id)
        {
            return Err(StorageError::Conflict(account.email.clone()));
        }
        guard.insert(account.email.clone(), account.clone());
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub user_stats: Arc<dyn UserStatsRepository>,
    pub accounts: Arc<dyn AccountRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            user_stats: Arc::new(repo.clone()),
            accounts: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::{LessonId, LevelRecord};
    use quest_core::time::fixed_now;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.read_stats(&user("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_replaces_whole_document() {
        let repo = InMemoryRepository::new();
        let uid = user("u1");

        let mut first = UserStats::new(fixed_now());
        first.star_count = 3;
        first
            .level_progress
            .insert(LessonId::new("level-1").unwrap(), LevelRecord::answered(true));
        repo.write_stats(&uid, &first).await.unwrap();

        let second = UserStats::new(fixed_now());
        repo.write_stats(&uid, &second).await.unwrap();

        let stored = repo.read_stats(&uid).await.unwrap().unwrap();
        assert_eq!(stored, second);
        assert!(stored.level_progress.is_empty());
        assert_eq!(repo.document_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn storage_aggregate_uses_in_memory_backend() {
        let storage = Storage::in_memory();
        let uid = user("u2");
        storage
            .user_stats
            .write_stats(&uid, &UserStats::new(fixed_now()))
            .await
            .unwrap();
        assert!(storage.user_stats.read_stats(&uid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn accounts_are_unique_by_email() {
        let repo = InMemoryRepository::new();
        let account = StoredAccount {
            email: "ana@example.com".into(),
            user_id: user("u-ana"),
            password_hash: "$2b$04$hash".into(),
        };
        repo.insert_account(&account).await.unwrap();

        let again = StoredAccount {
            user_id: user("u-other"),
            ..account.clone()
        };
        assert!(matches!(
            repo.insert_account(&again).await,
            Err(StorageError::Conflict(_))
        ));
        assert_eq!(
            repo.find_account("ana@example.com").await.unwrap(),
            Some(account)
        );
        assert!(repo.find_account("bo@example.com").await.unwrap().is_none());
    }
}
