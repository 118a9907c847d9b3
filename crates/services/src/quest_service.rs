use std::sync::{Arc, OnceLock};

use quest_core::model::{
    Catalog, SessionPhase, SessionState, SubmissionResult, UserId, UserStats,
};
use quest_core::ProgressionEngine;
use storage::repository::UserStatsRepository;

use crate::Clock;
use crate::error::QuestError;
use crate::identity::{Identity, IdentityProvider};
use crate::persistence::{PendingWrite, WriteQueue};

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A signed-in player's quiz session: who they are, where they are in the
/// catalog, and their in-memory stats.
///
/// The stats here are updated optimistically on every submission and may run
/// ahead of the stored copy until the pending write lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestSession {
    identity: Identity,
    state: SessionState,
    stats: UserStats,
}

impl QuestSession {
    #[must_use]
    pub fn new(identity: Identity, stats: UserStats) -> Self {
        Self {
            identity,
            state: SessionState::new(),
            stats,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.identity.user_id
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    #[must_use]
    pub fn level_index(&self) -> usize {
        self.state.level_index()
    }

    #[must_use]
    pub fn pending_selection(&self) -> Option<usize> {
        self.state.pending_selection()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&SubmissionResult> {
        self.state.last_result()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }
}

/// What `QuestService::submit` hands back: the result to show right away and
/// the write that still has to reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub result: SubmissionResult,
    pub write: PendingWrite,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates sign-in, stats loading, quiz intents and stats persistence.
///
/// Clones share one write queue, so queued writes keep their order.
#[derive(Clone)]
pub struct QuestService {
    clock: Clock,
    engine: Arc<ProgressionEngine>,
    identity: Arc<dyn IdentityProvider>,
    stats: Arc<dyn UserStatsRepository>,
    writes: Arc<OnceLock<WriteQueue>>,
}

impl QuestService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Catalog,
        identity: Arc<dyn IdentityProvider>,
        stats: Arc<dyn UserStatsRepository>,
    ) -> Self {
        Self {
            clock,
            engine: Arc::new(ProgressionEngine::new(catalog)),
            identity,
            stats,
            writes: Arc::new(OnceLock::new()),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.engine.catalog()
    }

    #[must_use]
    pub fn identity_provider(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.identity)
    }

    /// Sign in and open a session for the account.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Auth` with `InvalidCredentials` on a failed sign-in.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<QuestSession, QuestError> {
        let identity = self.identity.sign_in(email, password).await?;
        Ok(self.open_session(identity).await)
    }

    /// Create an account, sign it in and open a session for it.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Auth` with `AccountCreation` if the provider refuses.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<QuestSession, QuestError> {
        let identity = self.identity.sign_up(email, password).await?;
        Ok(self.open_session(identity).await)
    }

    /// Open a session for whoever the provider says is signed in.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::NotSignedIn` if nobody is signed in.
    pub async fn resume(&self) -> Result<QuestSession, QuestError> {
        let identity = self
            .identity
            .current_user()
            .ok_or(QuestError::NotSignedIn)?;
        Ok(self.open_session(identity).await)
    }

    /// Read the stored stats for a user.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::PersistenceRead` if the store fails.
    pub async fn load_stats(&self, user: &UserId) -> Result<Option<UserStats>, QuestError> {
        self.stats
            .read_stats(user)
            .await
            .map_err(QuestError::PersistenceRead)
    }

    /// Load (or create) stats and start at level 0.
    ///
    /// A first-time user gets default stats, written immediately. A failed read
    /// or initial write is logged and play continues on defaults.
    pub async fn open_session(&self, identity: Identity) -> QuestSession {
        let stats = match self.load_stats(&identity.user_id).await {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                let stats = UserStats::new(self.clock.now());
                let mut write = PendingWrite::new(identity.user_id.clone(), stats.clone());
                if let Err(err) = self.persist_now(&mut write).await {
                    tracing::warn!(user = %identity.user_id, error = %err, "could not create stats document");
                }
                stats
            }
            Err(err) => {
                tracing::warn!(user = %identity.user_id, error = %err, "using default stats");
                UserStats::new(self.clock.now())
            }
        };

        tracing::info!(
            user = %identity.user_id,
            stars = stats.star_count,
            lives = stats.lives_remaining,
            "quest session opened"
        );
        QuestSession::new(identity, stats)
    }

    /// Choose an option for the current level. Re-selecting overwrites.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Progression` for an out-of-range option or when the
    /// result of this level is already showing.
    pub fn select_option(
        &self,
        session: &mut QuestSession,
        option_index: usize,
    ) -> Result<(), QuestError> {
        session.state = self.engine.select_option(&session.state, option_index)?;
        Ok(())
    }

    /// Grade the pending selection and update the session's stats.
    ///
    /// The returned `Submission::write` must be handed to `persist` or
    /// `persist_now`; the session does not wait for it.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Progression` with `NoSelection` or `ResultShowing`.
    pub fn submit(&self, session: &mut QuestSession) -> Result<Submission, QuestError> {
        let transition =
            self.engine
                .submit_session(&session.state, &session.stats, self.clock.now())?;

        tracing::debug!(
            user = %session.identity.user_id,
            level = %transition.result.level_id,
            correct = transition.result.is_correct,
            "answer submitted"
        );

        session.state = transition.state;
        session.stats = transition.stats;
        Ok(Submission {
            result: transition.result,
            write: PendingWrite::new(session.identity.user_id.clone(), session.stats.clone()),
        })
    }

    /// Move to the next level (or back to level 0 after the last).
    pub fn advance(&self, session: &mut QuestSession) -> usize {
        session.state = self.engine.advance_session(&session.state);
        session.state.level_index()
    }

    #[must_use]
    pub fn progress_fraction(&self, session: &QuestSession) -> f64 {
        self.engine.progress_fraction(&session.stats)
    }

    /// Queue a pending write behind earlier ones without waiting for it.
    ///
    /// The writer task starts on first use, so call this inside a tokio
    /// runtime. Failures are logged and dropped.
    pub fn persist(&self, write: PendingWrite) {
        self.writes
            .get_or_init(|| WriteQueue::start(Arc::clone(&self.stats)))
            .push(write);
    }

    /// Wait until every write queued by `persist` has been attempted.
    pub async fn flush_writes(&self) {
        if let Some(queue) = self.writes.get() {
            queue.flush().await;
        }
    }

    /// Await a pending write on this service's store.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::PersistenceWrite`; the write can be retried.
    pub async fn persist_now(&self, write: &mut PendingWrite) -> Result<(), QuestError> {
        write
            .run(self.stats.as_ref())
            .await
            .map_err(QuestError::PersistenceWrite)
    }

    /// Wait for queued writes, then sign out and discard the session.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Auth` if the provider fails to sign out.
    pub async fn sign_out(&self, session: QuestSession) -> Result<(), QuestError> {
        self.flush_writes().await;
        self.identity.sign_out().await?;
        tracing::info!(user = %session.identity.user_id, "signed out");
        Ok(())
    }
}
