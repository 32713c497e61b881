use chrono::Utc;
use tracing::info;

use super::validate_name;
use crate::access::recalculate_accesses;
use crate::error::{Error, Result};
use crate::group::{
    GroupCondition, MAX_GROUP_DEPTH, ancestor_chain, inherit_team_grants, load_tree,
    move_group as relocate_group,
};
use crate::store::{SqliteStore, Store};
use crate::types::{AccessMode, Group, GroupTeam, GroupUnit, UnitType};

/// Rebuilds the cache of every repository in `group` or below it.
fn recalculate_group_repositories(store: &dyn Store, group: &Group) -> Result<usize> {
    let tree = load_tree(store, group.clone())?;
    let repos = store.list_group_repositories(&GroupCondition::from_ids(tree.group_ids()))?;
    for repo in &repos {
        recalculate_accesses(store, repo)?;
    }
    Ok(repos.len())
}

/// Creates a group under `parent_group_id` (0 for root) and derives its team grants.
pub fn create_group(
    db: &SqliteStore,
    owner_id: i64,
    parent_group_id: i64,
    name: &str,
    sort_order: i64,
) -> Result<Group> {
    validate_name(name, "Group")?;

    let group = db.transaction(|store| {
        store.require_user(owner_id)?;
        if parent_group_id != 0 {
            let parent = store.require_group(parent_group_id)?;
            if parent.owner_id != owner_id {
                return Err(Error::invalid(format!(
                    "group {parent_group_id} belongs to another owner"
                )));
            }
            if ancestor_chain(store, parent_group_id)?.len() >= MAX_GROUP_DEPTH {
                return Err(Error::TooDeep(parent_group_id));
            }
        }

        let now = Utc::now();
        let mut group = Group {
            id: 0,
            owner_id,
            parent_group_id,
            name: name.trim().to_string(),
            sort_order,
            created_at: now,
            updated_at: now,
        };
        group.id = store.create_group(&group)?;
        inherit_team_grants(store, &group)?;
        Ok(group)
    })?;

    info!(group_id = group.id, owner_id, parent_group_id, "Created group");
    Ok(group)
}

/// Moves a group, re-derives its team grants and rebuilds the cache of every
/// repository in the moved subtree.
pub fn move_group(
    db: &SqliteStore,
    group_id: i64,
    new_parent_id: i64,
    sort_order: i64,
) -> Result<Group> {
    let (group, repos) = db.transaction(|store| {
        let mut group = store.require_group(group_id)?;
        relocate_group(store, &mut group, new_parent_id, sort_order)?;
        inherit_team_grants(store, &group)?;
        let repos = recalculate_group_repositories(store, &group)?;
        Ok((group, repos))
    })?;

    info!(group_id, new_parent_id, repositories = repos, "Moved group");
    Ok(group)
}

/// Sets a team's coarse grant on a group.
pub fn set_group_team_grant(
    db: &SqliteStore,
    group_id: i64,
    team_id: i64,
    access_mode: AccessMode,
    can_create_in: bool,
) -> Result<()> {
    db.transaction(|store| {
        let group = store.require_group(group_id)?;
        let team = store.require_team(team_id)?;
        if team.org_id != group.owner_id {
            return Err(Error::invalid(format!(
                "team {team_id} does not belong to the group's owner"
            )));
        }

        store.upsert_group_team(&GroupTeam {
            org_id: team.org_id,
            team_id,
            group_id,
            access_mode,
            can_create_in,
        })?;
        recalculate_group_repositories(store, &group)?;
        Ok(())
    })?;

    info!(group_id, team_id, %access_mode, "Set group team grant");
    Ok(())
}

/// Sets a team's grant on one unit of a group. Unit grants are resolved live,
/// so no cache rows change.
pub fn set_group_unit_grant(
    db: &SqliteStore,
    group_id: i64,
    team_id: i64,
    unit_type: UnitType,
    access_mode: AccessMode,
) -> Result<()> {
    db.transaction(|store| {
        let group = store.require_group(group_id)?;
        let team = store.require_team(team_id)?;
        if team.org_id != group.owner_id {
            return Err(Error::invalid(format!(
                "team {team_id} does not belong to the group's owner"
            )));
        }

        store.upsert_group_unit(&GroupUnit {
            group_id,
            team_id,
            unit_type,
            access_mode,
        })
    })?;

    info!(group_id, team_id, %unit_type, %access_mode, "Set group unit grant");
    Ok(())
}
