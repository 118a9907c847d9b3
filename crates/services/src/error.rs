//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::ProgressionError;
use storage::repository::StorageError;

/// Errors reported by an `IdentityProvider`.
///
/// Messages are shown to the user as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Error creating account: {0}")]
    AccountCreation(String),
    #[error("Sign-in is unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by `QuestService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("no user is signed in")]
    NotSignedIn,
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error("failed to load stats: {0}")]
    PersistenceRead(#[source] StorageError),
    #[error("failed to save stats: {0}")]
    PersistenceWrite(#[source] StorageError),
}
