mod catalog;
mod ids;
mod lesson;
mod session;
mod stats;

pub use catalog::{Catalog, CatalogError};
pub use ids::{IdError, LessonId, UserId};
pub use lesson::{Category, LessonError, LessonItem};
pub use session::{SessionPhase, SessionState, SubmissionResult};
pub use stats::{DEFAULT_LIVES, LevelRecord, UserStats};
