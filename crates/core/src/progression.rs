//! Lesson progression and scoring.
//!
//! Per level the player moves `Answering → Selected → ShowingResult`, then
//! advances to the next level, wrapping to level 0 after the last one.
//! All operations are pure: they take the current `SessionState`/`UserStats`
//! and return new values.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Catalog, LessonItem, LevelRecord, SessionState, SubmissionResult, UserStats};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("level {level} does not exist (catalog has {len} levels)")]
    InvalidLevel { level: usize, len: usize },

    #[error("option {option} is out of range for level {level} ({len} options)")]
    InvalidSelection {
        level: usize,
        option: usize,
        len: usize,
    },

    #[error("no option selected")]
    NoSelection,

    #[error("result is already showing; advance to the next level first")]
    ResultShowing,
}

//
// ─── TRANSITION ────────────────────────────────────────────────────────────────
//

/// Everything a submission produces: the next session state, the next stats
/// and the result to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub stats: UserStats,
    pub result: SubmissionResult,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Applies quiz intents against a fixed catalog.
#[derive(Debug, Clone)]
pub struct ProgressionEngine {
    catalog: Catalog,
}

impl ProgressionEngine {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Lesson at `level_index`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::InvalidLevel` if the index is past the catalog.
    pub fn lesson(&self, level_index: usize) -> Result<&LessonItem, ProgressionError> {
        self.catalog
            .get(level_index)
            .ok_or(ProgressionError::InvalidLevel {
                level: level_index,
                len: self.catalog.len(),
            })
    }

    fn check_option(
        &self,
        level_index: usize,
        option_index: usize,
    ) -> Result<&LessonItem, ProgressionError> {
        let lesson = self.lesson(level_index)?;
        if option_index >= lesson.option_count() {
            return Err(ProgressionError::InvalidSelection {
                level: level_index,
                option: option_index,
                len: lesson.option_count(),
            });
        }
        Ok(lesson)
    }

    /// Choose (or re-choose) an option for the current level.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::ResultShowing` once the level was submitted,
    /// and `InvalidLevel`/`InvalidSelection` for out-of-range indices.
    pub fn select_option(
        &self,
        state: &SessionState,
        option_index: usize,
    ) -> Result<SessionState, ProgressionError> {
        if state.last_result().is_some() {
            return Err(ProgressionError::ResultShowing);
        }
        self.check_option(state.level_index(), option_index)?;
        Ok(state.with_selection(option_index))
    }

    /// Grade `option_index` for the lesson at `level_index`.
    ///
    /// A correct answer adds a star and keeps lives; a wrong one keeps stars and
    /// costs a life (never below zero). The level record is overwritten either
    /// way, so a replay can leave `star_count` above the sum of awarded stars.
    /// Repeated calls are not guarded here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLevel`/`InvalidSelection` for out-of-range indices.
    pub fn submit(
        &self,
        level_index: usize,
        option_index: usize,
        stats: &UserStats,
        now: DateTime<Utc>,
    ) -> Result<(SubmissionResult, UserStats), ProgressionError> {
        let lesson = self.check_option(level_index, option_index)?;
        let is_correct = lesson.is_correct(option_index);

        let lives_after = if is_correct {
            stats.lives_remaining
        } else {
            stats.lives_remaining.saturating_sub(1)
        };
        let stars_after = if is_correct {
            stats.star_count.saturating_add(1)
        } else {
            stats.star_count
        };

        let mut next = stats.clone();
        next.lives_remaining = lives_after;
        next.star_count = stars_after;
        next.level_progress
            .insert(lesson.id().clone(), LevelRecord::answered(is_correct));
        next.last_activity_at = now;

        let result = SubmissionResult {
            level_id: lesson.id().clone(),
            selected_index: option_index,
            correct_index: lesson.correct_index(),
            is_correct,
            lives_after,
            stars_after,
        };
        Ok((result, next))
    }

    /// Submit the pending selection of `state`.
    ///
    /// # Errors
    ///
    /// Returns `NoSelection` when nothing is selected and `ResultShowing` when
    /// the level was already submitted.
    pub fn submit_session(
        &self,
        state: &SessionState,
        stats: &UserStats,
        now: DateTime<Utc>,
    ) -> Result<Transition, ProgressionError> {
        if state.last_result().is_some() {
            return Err(ProgressionError::ResultShowing);
        }
        let option_index = state
            .pending_selection()
            .ok_or(ProgressionError::NoSelection)?;

        let (result, stats) = self.submit(state.level_index(), option_index, stats, now)?;
        Ok(Transition {
            state: state.with_result(result.clone()),
            stats,
            result,
        })
    }

    /// Next level index, wrapping to 0 after the last level.
    ///
    /// Total over `usize`: an index past the catalog is reduced first.
    #[must_use]
    pub fn advance(&self, level_index: usize) -> usize {
        let len = self.catalog.len();
        (level_index % len + 1) % len
    }

    /// Fresh `Answering` state for the next level. Correctness does not matter.
    #[must_use]
    pub fn advance_session(&self, state: &SessionState) -> SessionState {
        SessionState::at_level(self.advance(state.level_index()))
    }

    /// Number of catalog levels marked completed in `stats`.
    #[must_use]
    pub fn completed_count(&self, stats: &UserStats) -> usize {
        self.catalog.completed_in(stats)
    }

    /// Completed levels over catalog length, for display.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self, stats: &UserStats) -> f64 {
        self.completed_count(stats) as f64 / self.catalog.len() as f64
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
