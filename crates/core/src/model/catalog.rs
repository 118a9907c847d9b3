use std::collections::HashSet;
use std::sync::LazyLock;

use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::lesson::{Category, LessonError, LessonItem};
use crate::model::stats::UserStats;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog must contain at least one lesson")]
    Empty,

    #[error("duplicate lesson id: {0}")]
    DuplicateId(LessonId),

    #[error(transparent)]
    Lesson(#[from] LessonError),
}

/// Ordered, fixed sequence of lessons. Position `i` is level `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    lessons: Vec<LessonItem>,
}

impl Catalog {
    /// Build a catalog from lessons in level order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` for an empty list and
    /// `CatalogError::DuplicateId` if two lessons share an id.
    pub fn new(lessons: Vec<LessonItem>) -> Result<Self, CatalogError> {
        if lessons.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(lessons.len());
        for lesson in &lessons {
            if !seen.insert(lesson.id()) {
                return Err(CatalogError::DuplicateId(lesson.id().clone()));
            }
        }
        Ok(Self { lessons })
    }

    /// The three lessons shipped with the app.
    ///
    /// # Panics
    ///
    /// Panics if the compiled-in lesson table is invalid; covered by tests.
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    #[must_use]
    pub fn get(&self, level_index: usize) -> Option<&LessonItem> {
        self.lessons.get(level_index)
    }

    #[must_use]
    pub fn lessons(&self) -> &[LessonItem] {
        &self.lessons
    }

    #[must_use]
    pub fn contains(&self, id: &LessonId) -> bool {
        self.lessons.iter().any(|l| l.id() == id)
    }

    /// Completed levels of `stats` that belong to this catalog.
    ///
    /// Records for ids the catalog no longer has are ignored, so the count
    /// never exceeds `len()`.
    #[must_use]
    pub fn completed_in(&self, stats: &UserStats) -> usize {
        stats
            .level_progress
            .iter()
            .filter(|(id, record)| record.completed && self.contains(id))
            .count()
    }

    #[must_use]
    pub fn is_last(&self, level_index: usize) -> bool {
        level_index + 1 >= self.lessons.len()
    }
}

struct Seed {
    id: &'static str,
    prompt: &'static str,
    options: &'static [&'static str],
    correct: usize,
    image: &'static str,
    caption: &'static str,
    category: Category,
}

const SEEDS: &[Seed] = &[
    Seed {
        id: "level-1",
        prompt: "What animal is this?",
        options: &["Dog", "Cat", "Bird", "Fish"],
        correct: 1,
        image: "https://images.unsplash.com/photo-1495360010541-f48722b34f7d?q=80&w=2672&auto=format&fit=crop&ixlib=rb-4.1.0&ixid=M3wxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8fA%3D%3D",
        caption: "This is a cat.",
        category: Category::Animals,
    },
    Seed {
        id: "level-2",
        prompt: "What food is this?",
        options: &["Apple", "Pizza", "Burger", "Sushi"],
        correct: 0,
        image: "https://images.unsplash.com/photo-1560806887-1e4cd0b6cbd6?q=80&w=2574&auto=format&fit=crop&ixlib=rb-4.1.0&ixid=M3wxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8fA%3D%3D",
        caption: "This is an apple.",
        category: Category::Food,
    },
    Seed {
        id: "level-3",
        prompt: "What place is this?",
        options: &["Beach", "City", "Mountain", "Forest"],
        correct: 2,
        image: "https://images.unsplash.com/photo-1480497490787-505ec076689f?q=80&w=2500&auto=format&fit=crop&ixlib=rb-4.1.0&ixid=M3wxMjA3fDB8MHxwaG90by1wYWdlfHx8fGVufDB8fHx8fA%3D%3D",
        caption: "This is a mountain.",
        category: Category::Travel,
    },
];

fn build_builtin() -> Result<Catalog, CatalogError> {
    let lessons = SEEDS
        .iter()
        .map(|seed| {
            LessonItem::new(
                seed.id,
                seed.prompt,
                seed.options.iter().map(|o| (*o).to_string()).collect(),
                seed.correct,
                seed.image,
                seed.caption,
                seed.category,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    Catalog::new(lessons)
}

static BUILTIN: LazyLock<Catalog> =
    LazyLock::new(|| build_builtin().expect("built-in lesson table should be valid"));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stats::LevelRecord;

    fn lesson(id: &str) -> LessonItem {
        LessonItem::new(
            id,
            "Q",
            vec!["A".into(), "B".into()],
            0,
            "https://example.com/a.png",
            "caption",
            Category::Food,
        )
        .unwrap()
    }

    #[test]
    fn builtin_table_is_valid() {
        let catalog = build_builtin().unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog, Catalog::builtin());
    }

    #[test]
    fn builtin_order_defines_levels() {
        let catalog = Catalog::builtin();
        let ids: Vec<&str> = catalog.lessons().iter().map(|l| l.id().as_str()).collect();
        assert_eq!(ids, ["level-1", "level-2", "level-3"]);
        assert_eq!(catalog.get(0).unwrap().correct_option(), "Cat");
        assert_eq!(catalog.get(1).unwrap().correct_option(), "Apple");
        assert_eq!(catalog.get(2).unwrap().correct_option(), "Mountain");
        assert!(catalog.is_last(2));
        assert!(!catalog.is_last(1));
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert_eq!(Catalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);

        let err = Catalog::new(vec![lesson("a"), lesson("b"), lesson("a")]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId(LessonId::new("a").unwrap()));
    }

    #[test]
    fn builtin_images_keep_full_query() {
        for lesson in Catalog::builtin().lessons() {
            let media = lesson.media();
            assert_eq!(media.host_str(), Some("images.unsplash.com"));
            let keys: Vec<String> = media.query_pairs().map(|(k, _)| k.into_owned()).collect();
            assert!(keys.iter().any(|k| k == "ixlib"), "{media}");
            assert!(keys.iter().any(|k| k == "ixid"), "{media}");
        }
    }

    #[test]
    fn completed_in_ignores_foreign_levels() {
        let catalog = Catalog::new(vec![lesson("a"), lesson("b")]).unwrap();
        let mut stats = UserStats::new(crate::time::fixed_now());
        for id in ["a", "b", "retired-level"] {
            stats
                .level_progress
                .insert(LessonId::new(id).unwrap(), LevelRecord::answered(true));
        }

        assert_eq!(stats.completed_count(), 3);
        assert_eq!(catalog.completed_in(&stats), 2);
        assert!(catalog.contains(&LessonId::new("b").unwrap()));
        assert!(!catalog.contains(&LessonId::new("retired-level").unwrap()));
    }
}
