use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::LessonId;

/// Lives every new user starts with.
pub const DEFAULT_LIVES: u32 = 5;

/// Completion record for one level.
///
/// Stored under the lesson id in the `levels` map. Re-attempting a level
/// replaces the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub completed: bool,
    #[serde(rename = "stars")]
    stars_awarded: u8,
}

impl LevelRecord {
    /// Record for a level that was just answered.
    #[must_use]
    pub fn answered(is_correct: bool) -> Self {
        Self {
            completed: true,
            stars_awarded: u8::from(is_correct),
        }
    }

    /// Stars awarded for the most recent attempt: 0 or 1.
    #[must_use]
    pub fn stars_awarded(&self) -> u8 {
        self.stars_awarded.min(1)
    }
}

/// Durable per-user progression document.
///
/// Field names on the wire are the document keys the store has always used:
/// `stars`, `lives`, `levels`, `lastLogin`.
///
/// `star_count` is an additive counter and is not reconciled with the sum of
/// `stars_awarded` across `level_progress`; replays can make them diverge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(rename = "stars", default)]
    pub star_count: u32,

    #[serde(rename = "lives", default = "default_lives")]
    pub lives_remaining: u32,

    #[serde(rename = "levels", default)]
    pub level_progress: BTreeMap<LessonId, LevelRecord>,

    #[serde(rename = "lastLogin", default = "Utc::now")]
    pub last_activity_at: DateTime<Utc>,
}

fn default_lives() -> u32 {
    DEFAULT_LIVES
}

impl UserStats {
    /// Stats for a user who has never played.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            star_count: 0,
            lives_remaining: DEFAULT_LIVES,
            level_progress: BTreeMap::new(),
            last_activity_at: now,
        }
    }

    #[must_use]
    pub fn level(&self, id: &LessonId) -> Option<&LevelRecord> {
        self.level_progress.get(id)
    }

    /// Number of levels whose record says `completed`.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.level_progress.values().filter(|r| r.completed).count()
    }

    /// Sum of the per-level star flags. Not guaranteed to equal `star_count`.
    #[must_use]
    pub fn awarded_star_sum(&self) -> u32 {
        self.level_progress
            .values()
            .map(|r| u32::from(r.stars_awarded()))
            .sum()
    }
}
