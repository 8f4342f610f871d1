use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A user id that cannot name a directory under the store's `users/` tree.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "Invalid id {value:?}: ids must be a single path segment (no '/', '\\\\', NUL, '.' or '..')"
)]
pub struct IdError {
    value: String,
}

/// Identifier of a user, transaction, category or card.
///
/// Stores mint these on create: [`Id::new`] gives a random uuid, and tests
/// use a sequential generator instead. Legacy documents keep whatever id they
/// were written with. A user id becomes `users/<id>/` in
/// [`JsonFileStore`](crate::storage::JsonFileStore), so that store only
/// accepts ids that pass [`Id::is_path_safe`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Id {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an id read from a document or typed on the command line.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Like [`Id::from_string`], but refuses anything that would escape a
    /// user's data directory.
    pub fn from_string_checked(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if Self::is_path_safe(&value) {
            Ok(Self(value))
        } else {
            Err(IdError { value })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_path_safe(value: &str) -> bool {
        !matches!(value, "" | "." | "..") && !value.contains(['/', '\\', '\0'])
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_do_not_repeat() {
        assert_ne!(Id::new(), Id::new());
    }

    #[test]
    fn legacy_document_ids_are_kept_verbatim() {
        let id: Id = serde_json::from_str("\"-NvX3k9a_Legacy\"").unwrap();
        assert_eq!(id.as_str(), "-NvX3k9a_Legacy");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"-NvX3k9a_Legacy\"");
    }

    #[test]
    fn user_ids_must_stay_inside_the_users_directory() {
        for bad in ["../escape", "..", ".", "", "user/1", "user\\1", "user\0"] {
            assert!(Id::from_string_checked(bad).is_err(), "{bad:?}");
        }
        assert!(Id::from_string_checked("user-1").is_ok());
        assert!(Id::from_string_checked("a..b").is_ok());
    }
}
