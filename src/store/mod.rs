mod schema;
mod sqlite;

pub use sqlite::{Session, SqliteStore};

use crate::error::{Entity, Error, Result};
use crate::group::GroupCondition;
use crate::types::*;

/// Store defines the row-level interface the authorization core reads and writes.
///
/// Implementations run every call against one borrowed connection; whether
/// that connection is inside a transaction is decided by whoever handed out
/// the store (see [`SqliteStore::transaction`]).
pub trait Store {
    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn is_org_member(&self, org_id: i64, user_id: i64) -> Result<bool>;

    // Repository operations
    fn create_repository(&self, repo: &Repository) -> Result<()>;
    fn get_repository(&self, id: i64) -> Result<Option<Repository>>;
    fn list_repositories(&self) -> Result<Vec<Repository>>;
    fn list_owner_repositories(&self, owner_id: i64) -> Result<Vec<Repository>>;
    fn list_group_repositories(&self, groups: &GroupCondition) -> Result<Vec<Repository>>;
    fn set_repository_group(&self, repo_id: i64, group_id: i64) -> Result<()>;

    // Collaboration operations
    fn upsert_collaboration(&self, collaboration: &Collaboration) -> Result<()>;
    fn get_collaboration(&self, repo_id: i64, user_id: i64) -> Result<Option<Collaboration>>;
    fn delete_collaboration(&self, repo_id: i64, user_id: i64) -> Result<bool>;
    fn list_collaborations(&self, repo_id: i64) -> Result<Vec<Collaboration>>;

    // Team operations
    fn create_team(&self, team: &Team) -> Result<i64>;
    fn update_team(&self, team: &Team) -> Result<()>;
    fn get_team(&self, id: i64) -> Result<Option<Team>>;
    fn list_org_teams(&self, org_id: i64) -> Result<Vec<Team>>;
    fn list_teams_by_name(&self, name: &str) -> Result<Vec<Team>>;
    fn list_user_teams(&self, org_id: i64, user_id: i64) -> Result<Vec<Team>>;

    // Team membership and repository operations
    fn add_team_user(&self, org_id: i64, team_id: i64, user_id: i64) -> Result<()>;
    fn remove_team_user(&self, team_id: i64, user_id: i64) -> Result<bool>;
    fn list_team_user_ids(&self, team_id: i64) -> Result<Vec<i64>>;
    fn add_team_repo(&self, org_id: i64, team_id: i64, repo_id: i64) -> Result<()>;
    fn remove_team_repo(&self, team_id: i64, repo_id: i64) -> Result<bool>;
    fn has_team_repo(&self, team_id: i64, repo_id: i64) -> Result<bool>;

    // Team unit operations
    fn list_team_units(&self, team_id: i64) -> Result<Vec<TeamUnit>>;
    fn replace_team_units(&self, team_id: i64, units: &[TeamUnit]) -> Result<()>;
    fn update_team_unit_mode(
        &self,
        team_id: i64,
        unit_type: UnitType,
        mode: AccessMode,
    ) -> Result<bool>;

    // Group operations
    fn create_group(&self, group: &Group) -> Result<i64>;
    fn get_group(&self, id: i64) -> Result<Option<Group>>;
    fn update_group_placement(&self, id: i64, parent_group_id: i64, sort_order: i64)
    -> Result<()>;
    /// Direct children of `parent_group_id` (0 for roots) in fetch order.
    fn list_child_groups(&self, owner_id: i64, parent_group_id: i64) -> Result<Vec<Group>>;

    // Group grant operations
    fn get_group_team(&self, group_id: i64, team_id: i64) -> Result<Option<GroupTeam>>;
    fn list_group_teams(&self, groups: &GroupCondition) -> Result<Vec<GroupTeam>>;
    fn upsert_group_team(&self, grant: &GroupTeam) -> Result<()>;
    fn max_group_team_mode(&self, team_id: i64, groups: &GroupCondition) -> Result<AccessMode>;
    fn get_group_unit(
        &self,
        group_id: i64,
        team_id: i64,
        unit_type: UnitType,
    ) -> Result<Option<GroupUnit>>;
    fn upsert_group_unit(&self, unit: &GroupUnit) -> Result<()>;
    fn max_group_unit_mode(
        &self,
        team_id: i64,
        groups: &GroupCondition,
        unit_type: UnitType,
    ) -> Result<AccessMode>;

    // Access cache operations
    fn get_access_mode(&self, user_id: i64, repo_id: i64) -> Result<Option<AccessMode>>;
    fn list_repo_accesses(&self, repo_id: i64) -> Result<Vec<Access>>;
    /// Deletes every cached row of the repository and inserts `accesses` atomically.
    fn replace_repo_accesses(&self, repo_id: i64, accesses: &[Access]) -> Result<()>;
    /// Writes one cached row, or deletes it when `mode` is None.
    fn set_user_access(&self, user_id: i64, repo_id: i64, mode: Option<AccessMode>)
    -> Result<()>;

    fn require_user(&self, id: i64) -> Result<User> {
        self.get_user(id)?.ok_or(Error::NotFound(Entity::User))
    }

    fn require_repository(&self, id: i64) -> Result<Repository> {
        self.get_repository(id)?
            .ok_or(Error::NotFound(Entity::Repository))
    }

    fn require_team(&self, id: i64) -> Result<Team> {
        self.get_team(id)?.ok_or(Error::NotFound(Entity::Team))
    }

    fn require_group(&self, id: i64) -> Result<Group> {
        self.get_group(id)?.ok_or(Error::NotFound(Entity::Group))
    }
}
