use thiserror::Error;

use crate::model::{CatalogError, IdError, LessonError};
use crate::progression::ProgressionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
}
