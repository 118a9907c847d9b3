use serde::{Deserialize, Serialize};

use crate::model::ids::LessonId;

/// Outcome of grading one submission. Lives until the player advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub level_id: LessonId,
    pub selected_index: usize,
    pub correct_index: usize,
    pub is_correct: bool,
    pub lives_after: u32,
    pub stars_after: u32,
}

/// Where the player is within the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No option chosen yet.
    Answering,
    /// An option is chosen but not submitted.
    Selected,
    /// Submitted; feedback is visible until the player advances.
    ShowingResult,
}

/// Explicit per-session quiz state.
///
/// Owned by the caller and threaded through `ProgressionEngine` operations,
/// which return a new value instead of mutating shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    level_index: usize,
    pending_selection: Option<usize>,
    last_result: Option<SubmissionResult>,
}

impl SessionState {
    /// Fresh state at level 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh `Answering` state at the given level.
    #[must_use]
    pub fn at_level(level_index: usize) -> Self {
        Self {
            level_index,
            pending_selection: None,
            last_result: None,
        }
    }

    #[must_use]
    pub fn level_index(&self) -> usize {
        self.level_index
    }

    #[must_use]
    pub fn pending_selection(&self) -> Option<usize> {
        self.pending_selection
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&SubmissionResult> {
        self.last_result.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (&self.last_result, self.pending_selection) {
            (Some(_), _) => SessionPhase::ShowingResult,
            (None, Some(_)) => SessionPhase::Selected,
            (None, None) => SessionPhase::Answering,
        }
    }

    pub(crate) fn with_selection(&self, option_index: usize) -> Self {
        Self {
            level_index: self.level_index,
            pending_selection: Some(option_index),
            last_result: None,
        }
    }

    pub(crate) fn with_result(&self, result: SubmissionResult) -> Self {
        Self {
            level_index: self.level_index,
            pending_selection: Some(result.selected_index),
            last_result: Some(result),
        }
    }
}
