use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when an identifier is blank after trimming.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} cannot be empty")]
pub struct IdError {
    kind: &'static str,
}

impl IdError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

fn trimmed(raw: impl Into<String>, kind: &'static str) -> Result<String, IdError> {
    let raw = raw.into();
    let value = raw.trim();
    if value.is_empty() {
        return Err(IdError { kind });
    }
    Ok(value.to_owned())
}

/// Stable identifier of a lesson in the catalog (e.g. `level-1`).
///
/// Serialized as a bare string so it can key the `levels` map of a stats document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

impl LessonId {
    /// Creates a `LessonId`.
    ///
    /// # Errors
    ///
    /// Returns `IdError` if the value is empty after trimming.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        trimmed(raw, "LessonId").map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity assigned by the identity provider to an authenticated user.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId`.
    ///
    /// # Errors
    ///
    /// Returns `IdError` if the value is empty after trimming.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        trimmed(raw, "UserId").map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

impl FromStr for LessonId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_id_is_trimmed() {
        let id = LessonId::new("  level-1 ").unwrap();
        assert_eq!(id.as_str(), "level-1");
        assert_eq!(id.to_string(), "level-1");
    }

    #[test]
    fn blank_ids_are_rejected() {
        let err = LessonId::new("   ").unwrap_err();
        assert_eq!(err.kind(), "LessonId");
        assert!("".parse::<UserId>().is_err());
    }

    #[test]
    fn user_id_from_str() {
        let id: UserId = "uid-42".parse().unwrap();
        assert_eq!(id, UserId::new("uid-42").unwrap());
        assert_eq!(format!("{id:?}"), "UserId(uid-42)");
    }

    #[test]
    fn lesson_id_serializes_as_plain_string() {
        let id = LessonId::new("level-2").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"level-2\"");
    }
}
