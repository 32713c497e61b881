use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use super::{AccessMode, UnitType};

/// Name of the team that always resolves to owner access within its organization.
pub const OWNER_TEAM_NAME: &str = "Owners";

/// Who can see an owner's profile and, through it, its repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public = 0,
    Limited = 1,
    Private = 2,
}

impl ToSql for Visibility {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(*self as i64))
    }
}

impl FromSql for Visibility {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_i64()? {
            0 => Ok(Visibility::Public),
            1 => Ok(Visibility::Limited),
            2 => Ok(Visibility::Private),
            other => Err(FromSqlError::OutOfRange(other)),
        }
    }
}

/// An identity: a person or an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub is_admin: bool,
    pub is_restricted: bool,
    pub is_organization: bool,
    pub visibility: Visibility,
}

impl User {
    pub const GHOST_ID: i64 = -1;

    #[must_use]
    pub fn is_ghost(&self) -> bool {
        self.id == Self::GHOST_ID
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub is_private: bool,
    /// Containing group, 0 when the repository sits at the owner's top level.
    pub group_id: i64,
    pub owner: User,
}

impl Repository {
    #[must_use]
    pub fn owner_id(&self) -> i64 {
        self.owner.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaboration {
    pub repo_id: i64,
    pub user_id: i64,
    pub mode: AccessMode,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub org_id: i64,
    pub name: String,
    pub access_mode: AccessMode,
    pub includes_all_repositories: bool,
    pub can_create_org_repo: bool,
}

impl Team {
    #[must_use]
    pub fn is_owner_team(&self) -> bool {
        self.name == OWNER_TEAM_NAME
    }

    /// Coarse mode with the owner team pinned to Owner whatever its stored column says.
    #[must_use]
    pub fn effective_mode(&self) -> AccessMode {
        if self.is_owner_team() {
            AccessMode::Owner
        } else {
            self.access_mode
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamUnit {
    pub org_id: i64,
    pub team_id: i64,
    pub unit_type: UnitType,
    pub access_mode: AccessMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub owner_id: i64,
    /// 0 for a root group.
    pub parent_group_id: i64,
    pub name: String,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTeam {
    pub org_id: i64,
    pub team_id: i64,
    pub group_id: i64,
    pub access_mode: AccessMode,
    pub can_create_in: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUnit {
    pub group_id: i64,
    pub team_id: i64,
    pub unit_type: UnitType,
    pub access_mode: AccessMode,
}

/// One row of the access cache. Rows with mode None are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Access {
    pub user_id: i64,
    pub repo_id: i64,
    pub mode: AccessMode,
}
