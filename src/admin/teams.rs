use tracing::info;

use super::{recalculate_owner_repositories, validate_name};
use crate::access::{recalculate_team_accesses, recalculate_user_access};
use crate::error::{Error, Result};
use crate::store::{SqliteStore, Store};
use crate::team::{owner_team_units, team_repo_mode};
use crate::types::{AccessMode, OWNER_TEAM_NAME, Team, TeamUnit, UnitType};

fn unit_rows(team: &Team, units: &[(UnitType, AccessMode)]) -> Vec<TeamUnit> {
    units
        .iter()
        .map(|(unit_type, access_mode)| TeamUnit {
            org_id: team.org_id,
            team_id: team.id,
            unit_type: *unit_type,
            access_mode: *access_mode,
        })
        .collect()
}

fn insert_team(store: &dyn Store, team: &Team, units: &[TeamUnit]) -> Result<Team> {
    let org = store.require_user(team.org_id)?;
    if !org.is_organization {
        return Err(Error::invalid(format!(
            "user {} is not an organization",
            org.id
        )));
    }

    let mut created = team.clone();
    created.id = store.create_team(team)?;
    let units: Vec<TeamUnit> = units
        .iter()
        .map(|u| TeamUnit {
            team_id: created.id,
            ..*u
        })
        .collect();
    store.replace_team_units(created.id, &units)?;

    if created.includes_all_repositories {
        recalculate_owner_repositories(store, created.org_id)?;
    }
    Ok(created)
}

/// Creates a team with its unit grants.
pub fn create_team(
    db: &SqliteStore,
    team: &Team,
    units: &[(UnitType, AccessMode)],
) -> Result<Team> {
    validate_name(&team.name, "Team")?;
    if team.is_owner_team() {
        return Err(Error::invalid(format!(
            "team name {OWNER_TEAM_NAME} is reserved"
        )));
    }

    let created = db.transaction(|store| insert_team(store, team, &unit_rows(team, units)))?;
    info!(team_id = created.id, org_id = created.org_id, "Created team");
    Ok(created)
}

/// Creates the owner team of an organization.
pub fn create_owner_team(db: &SqliteStore, org_id: i64) -> Result<Team> {
    let team = Team {
        id: 0,
        org_id,
        name: OWNER_TEAM_NAME.to_string(),
        access_mode: AccessMode::Owner,
        includes_all_repositories: true,
        can_create_org_repo: true,
    };

    let created = db.transaction(|store| insert_team(store, &team, &owner_team_units(org_id, 0)))?;
    info!(team_id = created.id, org_id, "Created owner team");
    Ok(created)
}

/// Replaces a team's settings and unit grants, then rebuilds the cache of
/// every repository in its organization.
pub fn update_team(db: &SqliteStore, team: &Team, units: &[(UnitType, AccessMode)]) -> Result<()> {
    validate_name(&team.name, "Team")?;

    db.transaction(|store| {
        let existing = store.require_team(team.id)?;
        if existing.org_id != team.org_id {
            return Err(Error::invalid("a team cannot change organization"));
        }

        let mut updated = team.clone();
        let rows = if existing.is_owner_team() {
            if !team.is_owner_team() {
                return Err(Error::invalid("the owner team cannot be renamed"));
            }
            updated.access_mode = AccessMode::Owner;
            updated.includes_all_repositories = true;
            owner_team_units(team.org_id, team.id)
        } else {
            if team.is_owner_team() {
                return Err(Error::invalid(format!(
                    "team name {OWNER_TEAM_NAME} is reserved"
                )));
            }
            unit_rows(team, units)
        };

        store.update_team(&updated)?;
        store.replace_team_units(team.id, &rows)?;
        recalculate_owner_repositories(store, team.org_id)?;
        Ok(())
    })?;

    info!(team_id = team.id, "Updated team");
    Ok(())
}

pub fn add_team_member(db: &SqliteStore, team_id: i64, user_id: i64) -> Result<()> {
    db.transaction(|store| {
        let team = store.require_team(team_id)?;
        let user = store.require_user(user_id)?;
        if user.is_organization {
            return Err(Error::invalid("an organization cannot join a team"));
        }

        store.add_team_user(team.org_id, team.id, user.id)?;
        for repo in store.list_owner_repositories(team.org_id)? {
            recalculate_user_access(store, &repo, user.id)?;
        }
        Ok(())
    })?;

    info!(team_id, user_id, "Added team member");
    Ok(())
}

/// Removes a team member; the last member of an owner team cannot leave.
pub fn remove_team_member(db: &SqliteStore, team_id: i64, user_id: i64) -> Result<bool> {
    let removed = db.transaction(|store| {
        let team = store.require_team(team_id)?;
        let members = store.list_team_user_ids(team.id)?;
        if !members.contains(&user_id) {
            return Ok(false);
        }
        if team.is_owner_team() && members.len() == 1 {
            return Err(Error::invalid(
                "cannot remove the last member of the owner team",
            ));
        }

        store.remove_team_user(team.id, user_id)?;
        for repo in store.list_owner_repositories(team.org_id)? {
            recalculate_user_access(store, &repo, user_id)?;
        }
        Ok(true)
    })?;

    if removed {
        info!(team_id, user_id, "Removed team member");
    }
    Ok(removed)
}

pub fn add_team_repository(db: &SqliteStore, team_id: i64, repo_id: i64) -> Result<()> {
    db.transaction(|store| {
        let team = store.require_team(team_id)?;
        let repo = store.require_repository(repo_id)?;
        if repo.owner_id() != team.org_id {
            return Err(Error::invalid(format!(
                "repository {repo_id} does not belong to the team's organization"
            )));
        }

        store.add_team_repo(team.org_id, team.id, repo.id)?;
        recalculate_team_accesses(store, &repo, 0)
    })?;

    info!(team_id, repo_id, "Added team repository");
    Ok(())
}

/// Detaches a repository from a team and rebuilds its cache. The team is left
/// out of the rebuild only when no all-repositories flag or group grant still
/// reaches the repository.
pub fn remove_team_repository(db: &SqliteStore, team_id: i64, repo_id: i64) -> Result<bool> {
    let removed = db.transaction(|store| {
        let team = store.require_team(team_id)?;
        let repo = store.require_repository(repo_id)?;
        if !store.remove_team_repo(team.id, repo.id)? {
            return Ok(false);
        }
        let exclude_team_id = if team_repo_mode(store, &team, &repo)? == AccessMode::None {
            team.id
        } else {
            0
        };
        recalculate_team_accesses(store, &repo, exclude_team_id)?;
        Ok(true)
    })?;

    if removed {
        info!(team_id, repo_id, "Removed team repository");
    }
    Ok(removed)
}
