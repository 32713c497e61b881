use std::fmt;

use thiserror::Error;

/// Kind of row a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Repository,
    Team,
    Group,
    Collaboration,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Repository => "repository",
            Entity::Team => "team",
            Entity::Group => "group",
            Entity::Collaboration => "collaboration",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("group {0} exceeds the maximum nesting depth")]
    TooDeep(i64),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    TooDeep,
    InvalidOperation,
    Store,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::TooDeep(_) => ErrorKind::TooDeep,
            Error::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Error::Database(_) | Error::Io(_) | Error::Config(_) => ErrorKind::Store,
        }
    }

    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(Error::NotFound(Entity::Group).is(ErrorKind::NotFound));
        assert!(Error::TooDeep(7).is(ErrorKind::TooDeep));
        assert!(Error::invalid("x").is(ErrorKind::InvalidOperation));
        assert!(Error::Config("bad".into()).is(ErrorKind::Store));
        assert!(!Error::TooDeep(7).is(ErrorKind::NotFound));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(Error::NotFound(Entity::Team).to_string(), "team not found");
        assert_eq!(
            Error::TooDeep(3).to_string(),
            "group 3 exceeds the maximum nesting depth"
        );
    }
}
