use std::sync::Arc;

use quest_core::model::{UserId, UserStats};
use storage::repository::{StorageError, UserStatsRepository};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A stats write that a submission still owes the store.
///
/// Submissions update in-memory stats first and hand back one of these.
/// The caller either awaits it (`run`, retryable) or queues it on a
/// `WriteQueue`. Nothing is retried automatically and there is no timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    user_id: UserId,
    stats: UserStats,
    attempts: u32,
}

impl PendingWrite {
    #[must_use]
    pub fn new(user_id: UserId, stats: UserStats) -> Self {
        Self {
            user_id,
            stats,
            attempts: 0,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The full document this write will store.
    #[must_use]
    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    /// How many times `run` has been attempted.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Perform one full-document write.
    ///
    /// # Errors
    ///
    /// Returns the store's `StorageError`; the write can be run again.
    pub async fn run(&mut self, store: &dyn UserStatsRepository) -> Result<(), StorageError> {
        self.attempts = self.attempts.saturating_add(1);
        store.write_stats(&self.user_id, &self.stats).await
    }

    async fn run_logged(&mut self, store: &dyn UserStatsRepository) {
        match self.run(store).await {
            Ok(()) => tracing::debug!(user = %self.user_id, "stats saved"),
            Err(err) => tracing::warn!(
                user = %self.user_id,
                error = %err,
                "failed to save stats; in-memory progress kept"
            ),
        }
    }
}

enum Command {
    Write(PendingWrite),
    Flush(oneshot::Sender<()>),
}

/// Background writer for one store.
///
/// Writes land in the order they were pushed, so a slow write can never be
/// overtaken by a newer document. Each write is attempted once and a failure
/// is logged. Dropping the queue aborts writes that have not landed.
pub struct WriteQueue {
    tx: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl WriteQueue {
    /// Spawn the writer task on the current tokio runtime.
    #[must_use]
    pub fn start(store: Arc<dyn UserStatsRepository>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Write(mut write) => write.run_logged(store.as_ref()).await,
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { tx, worker }
    }

    /// Queue `write` behind every write pushed before it. Does not wait.
    pub fn push(&self, write: PendingWrite) {
        if let Err(rejected) = self.tx.send(Command::Write(write)) {
            if let Command::Write(write) = rejected.0 {
                tracing::warn!(user = %write.user_id, "write queue stopped; stats write dropped");
            }
        }
    }

    /// Wait until every write pushed so far has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use quest_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    use super::*;

    /// Store whose writes take longer the smaller the star count.
    #[derive(Default)]
    struct SlowFirstStore {
        inner: InMemoryRepository,
    }

    #[async_trait]
    impl UserStatsRepository for SlowFirstStore {
        async fn read_stats(&self, user: &UserId) -> Result<Option<UserStats>, StorageError> {
            self.inner.read_stats(user).await
        }

        async fn write_stats(&self, user: &UserId, stats: &UserStats) -> Result<(), StorageError> {
            let delay = 60_u64.saturating_sub(u64::from(stats.star_count) * 20);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.inner.write_stats(user, stats).await
        }
    }

    fn stats_with_stars(stars: u32) -> UserStats {
        let mut stats = UserStats::new(fixed_now());
        stats.star_count = stars;
        stats
    }

    #[tokio::test]
    async fn queued_writes_land_in_push_order() {
        let store = Arc::new(SlowFirstStore::default());
        let queue = WriteQueue::start(Arc::clone(&store) as Arc<dyn UserStatsRepository>);
        let user = UserId::new("u-order").unwrap();

        for stars in 1..=3 {
            queue.push(PendingWrite::new(user.clone(), stats_with_stars(stars)));
        }
        queue.flush().await;

        let stored = store.inner.read_stats(&user).await.unwrap().unwrap();
        assert_eq!(stored.star_count, 3);
    }

    #[tokio::test]
    async fn dropping_the_queue_cancels_unfinished_writes() {
        let store = Arc::new(SlowFirstStore::default());
        let queue = WriteQueue::start(Arc::clone(&store) as Arc<dyn UserStatsRepository>);
        let user = UserId::new("u-cancel").unwrap();

        queue.push(PendingWrite::new(user.clone(), stats_with_stars(0)));
        drop(queue);
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(store.inner.read_stats(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn run_counts_attempts() {
        let store = InMemoryRepository::new();
        let user = UserId::new("u-run").unwrap();
        let mut write = PendingWrite::new(user.clone(), stats_with_stars(1));

        write.run(&store).await.unwrap();
        write.run(&store).await.unwrap();
        assert_eq!(write.attempts(), 2);
        assert_eq!(store.read_stats(&user).await.unwrap().unwrap().star_count, 1);
    }
}
