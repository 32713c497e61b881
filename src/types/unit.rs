use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// UnitType names a feature area of a repository that carries its own access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Code = 1,
    Issues = 2,
    PullRequests = 3,
    Releases = 4,
    Wiki = 5,
    ExternalWiki = 6,
    ExternalTracker = 7,
    Projects = 8,
    Packages = 9,
    Actions = 10,
}

impl UnitType {
    pub const ALL: [UnitType; 10] = [
        UnitType::Code,
        UnitType::Issues,
        UnitType::PullRequests,
        UnitType::Releases,
        UnitType::Wiki,
        UnitType::ExternalWiki,
        UnitType::ExternalTracker,
        UnitType::Projects,
        UnitType::Packages,
        UnitType::Actions,
    ];

    pub const fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<UnitType> {
        Self::ALL.into_iter().find(|u| u.id() == id)
    }

    pub const fn name(self) -> &'static str {
        match self {
            UnitType::Code => "repo.code",
            UnitType::Issues => "repo.issues",
            UnitType::PullRequests => "repo.pulls",
            UnitType::Releases => "repo.releases",
            UnitType::Wiki => "repo.wiki",
            UnitType::ExternalWiki => "repo.ext_wiki",
            UnitType::ExternalTracker => "repo.ext_issues",
            UnitType::Projects => "repo.projects",
            UnitType::Packages => "repo.packages",
            UnitType::Actions => "repo.actions",
        }
    }

    /// Accepts both the full name ("repo.wiki") and the short suffix ("wiki").
    pub fn parse(s: &str) -> Option<UnitType> {
        Self::ALL
            .into_iter()
            .find(|u| u.name() == s || u.name().strip_prefix("repo.") == Some(s))
    }

    /// External units link out of the repository and can only ever be read.
    pub const fn is_external(self) -> bool {
        matches!(self, UnitType::ExternalWiki | UnitType::ExternalTracker)
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ToSql for UnitType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.id()))
    }
}

impl FromSql for UnitType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        UnitType::from_id(raw).ok_or(FromSqlError::OutOfRange(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unit_type() {
        assert_eq!(UnitType::parse("repo.wiki"), Some(UnitType::Wiki));
        assert_eq!(UnitType::parse("pulls"), Some(UnitType::PullRequests));
        assert_eq!(UnitType::parse("repo.nothing"), None);
    }

    #[test]
    fn test_external_units() {
        let external: Vec<_> = UnitType::ALL.into_iter().filter(|u| u.is_external()).collect();
        assert_eq!(external, vec![UnitType::ExternalWiki, UnitType::ExternalTracker]);
    }
}
