use quest_core::model::{Catalog, SessionPhase};
use url::Url;

use crate::quest_service::QuestSession;

/// How an option should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Plain,
    /// Chosen but not yet graded.
    Selected,
    /// The correct answer, once the result is showing.
    Correct,
    /// The player's wrong pick, once the result is showing.
    Wrong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub index: usize,
    pub label: String,
    pub mark: OptionMark,
}

/// Feedback block shown after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackView {
    pub is_correct: bool,
    pub headline: String,
    pub detail: String,
}

/// Presentation-facing snapshot of a quest session.
///
/// Holds everything a front end needs to draw the current level; it carries
/// no behavior and is rebuilt after every intent.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestView {
    pub email: String,
    /// 1-based level number.
    pub level_number: usize,
    pub prompt: String,
    pub media: Url,
    pub caption: Option<String>,
    pub options: Vec<OptionView>,
    pub stars: u32,
    pub lives: u32,
    pub completed: usize,
    pub total: usize,
    pub progress: f64,
    pub feedback: Option<FeedbackView>,
    pub can_submit: bool,
    pub can_advance: bool,
    pub advance_label: &'static str,
}

impl QuestView {
    /// Build the view for `session`. Returns `None` if the session points past
    /// the catalog.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_session(catalog: &Catalog, session: &QuestSession) -> Option<Self> {
        let level = session.level_index();
        let lesson = catalog.get(level)?;
        let phase = session.phase();
        let result = session.last_result();
        let pending = session.pending_selection();

        let options = lesson
            .options()
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let mark = match (result, pending) {
                    (Some(r), _) if index == r.correct_index => OptionMark::Correct,
                    (Some(r), _) if index == r.selected_index => OptionMark::Wrong,
                    (None, Some(selected)) if index == selected => OptionMark::Selected,
                    _ => OptionMark::Plain,
                };
                OptionView {
                    index,
                    label: label.clone(),
                    mark,
                }
            })
            .collect();

        let feedback = result.map(|r| {
            if r.is_correct {
                FeedbackView {
                    is_correct: true,
                    headline: "Correct!".to_owned(),
                    detail: "You earned 1 star!".to_owned(),
                }
            } else {
                FeedbackView {
                    is_correct: false,
                    headline: "Try again!".to_owned(),
                    detail: format!("The correct answer was: {}", lesson.correct_option()),
                }
            }
        });

        let stats = session.stats();
        let completed = catalog.completed_in(stats);
        let total = catalog.len();

        Some(Self {
            email: session.identity().email.clone(),
            level_number: level + 1,
            prompt: lesson.prompt().to_owned(),
            media: lesson.media().clone(),
            caption: result.map(|_| lesson.caption().to_owned()),
            options,
            stars: stats.star_count,
            lives: stats.lives_remaining,
            completed,
            total,
            progress: completed as f64 / total as f64,
            feedback,
            can_submit: phase == SessionPhase::Selected,
            can_advance: phase == SessionPhase::ShowingResult,
            advance_label: if catalog.is_last(level) {
                "Play Again"
            } else {
                "Next Level"
            },
        })
    }

    /// e.g. `2/3 levels completed`.
    #[must_use]
    pub fn progress_label(&self) -> String {
        format!("{}/{} levels completed", self.completed, self.total)
    }
}
