use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// AccessMode is a totally ordered access level. Owner implies every lower mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    None = 0,
    Read = 1,
    Write = 2,
    Admin = 3,
    Owner = 4,
}

impl AccessMode {
    pub const ALL: [AccessMode; 5] = [
        AccessMode::None,
        AccessMode::Read,
        AccessMode::Write,
        AccessMode::Admin,
        AccessMode::Owner,
    ];

    pub const fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(value: i64) -> Option<AccessMode> {
        Self::ALL.into_iter().find(|m| m.ordinal() == value)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AccessMode::None => "none",
            AccessMode::Read => "read",
            AccessMode::Write => "write",
            AccessMode::Admin => "admin",
            AccessMode::Owner => "owner",
        }
    }

    pub fn parse(s: &str) -> Option<AccessMode> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for AccessMode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.ordinal()))
    }
}

impl FromSql for AccessMode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        AccessMode::from_ordinal(raw).ok_or(FromSqlError::OutOfRange(raw))
    }
}
