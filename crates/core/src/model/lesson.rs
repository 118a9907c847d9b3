use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::{IdError, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("lesson prompt cannot be empty")]
    EmptyPrompt,

    #[error("lesson caption cannot be empty")]
    EmptyCaption,

    #[error("a lesson needs at least 2 options, got {0}")]
    TooFewOptions(usize),

    #[error("option {0} is blank")]
    BlankOption(usize),

    #[error("correct index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("invalid media url: {0}")]
    InvalidMedia(String),
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Topic tag of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Animals,
    Food,
    Travel,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Animals => "animals",
            Category::Food => "food",
            Category::Travel => "travel",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── LESSON ITEM ───────────────────────────────────────────────────────────────
//

/// One multiple-choice question about an image.
///
/// Immutable once built: every accessor borrows, and `correct_index` is
/// guaranteed to index into `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonItem {
    id: LessonId,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    media: Url,
    caption: String,
    category: Category,
}

impl LessonItem {
    /// Build a validated lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the id, prompt or caption is blank, if fewer than
    /// two options are given or one of them is blank, if `correct_index` does not
    /// index an option, or if `media` is not a valid URL.
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        media: &str,
        caption: impl Into<String>,
        category: Category,
    ) -> Result<Self, LessonError> {
        let id = LessonId::new(id)?;

        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(LessonError::EmptyPrompt);
        }
        let caption = caption.into();
        if caption.trim().is_empty() {
            return Err(LessonError::EmptyCaption);
        }

        if options.len() < 2 {
            return Err(LessonError::TooFewOptions(options.len()));
        }
        if let Some(blank) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(LessonError::BlankOption(blank));
        }
        if correct_index >= options.len() {
            return Err(LessonError::CorrectIndexOutOfRange {
                index: correct_index,
                len: options.len(),
            });
        }

        let media =
            Url::parse(media.trim()).map_err(|e| LessonError::InvalidMedia(e.to_string()))?;

        Ok(Self {
            id,
            prompt,
            options,
            correct_index,
            media,
            caption,
            category,
        })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn media(&self) -> &Url {
        &self.media
    }

    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn build(options: Vec<String>, correct: usize) -> Result<LessonItem, LessonError> {
        LessonItem::new(
            "level-x",
            "What animal is this?",
            options,
            correct,
            "https://example.com/cat.jpg",
            "This is a cat.",
            Category::Animals,
        )
    }

    #[test]
    fn valid_lesson_exposes_fields() {
        let lesson = build(opts(&["Dog", "Cat"]), 1).unwrap();
        assert_eq!(lesson.id().as_str(), "level-x");
        assert_eq!(lesson.option_count(), 2);
        assert_eq!(lesson.correct_option(), "Cat");
        assert!(lesson.is_correct(1));
        assert!(!lesson.is_correct(0));
        assert_eq!(lesson.media().host_str(), Some("example.com"));
    }

    #[test]
    fn rejects_single_option() {
        let err = build(opts(&["Dog"]), 0).unwrap_err();
        assert_eq!(err, LessonError::TooFewOptions(1));
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let err = build(opts(&["Dog", "Cat"]), 2).unwrap_err();
        assert_eq!(err, LessonError::CorrectIndexOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn rejects_blank_option_and_bad_media() {
        assert_eq!(
            build(opts(&["Dog", "  "]), 0).unwrap_err(),
            LessonError::BlankOption(1)
        );

        let err = LessonItem::new(
            "level-x",
            "Q",
            opts(&["A", "B"]),
            0,
            "not a url",
            "caption",
            Category::Food,
        )
        .unwrap_err();
        assert!(matches!(err, LessonError::InvalidMedia(_)));
    }

    #[test]
    fn category_uses_lowercase_tags() {
        assert_eq!(Category::Travel.to_string(), "travel");
    }
}
