use crate::error::{Entity, Error, Result};
use crate::group::{GroupCondition, ancestor_chain};
use crate::store::Store;
use crate::types::{AccessMode, Repository, Team, TeamUnit, UnitType};

/// The only unit modes an owner team may hold.
pub fn owner_unit_mode(unit_type: UnitType) -> AccessMode {
    match unit_type {
        UnitType::ExternalTracker | UnitType::ExternalWiki => AccessMode::Read,
        _ => AccessMode::Owner,
    }
}

/// Unit rows for a freshly created owner team.
pub fn owner_team_units(org_id: i64, team_id: i64) -> Vec<TeamUnit> {
    UnitType::ALL
        .into_iter()
        .map(|unit_type| TeamUnit {
            org_id,
            team_id,
            unit_type,
            access_mode: owner_unit_mode(unit_type),
        })
        .collect()
}

/// Returns the access `team` holds on one unit across its organization.
///
/// Owner teams resolve through [`owner_unit_mode`] whatever their rows say;
/// admin teams get their coarse mode on every unit; otherwise the highest
/// unit row for `unit_type` wins.
pub fn effective_capability(
    store: &dyn Store,
    team: &Team,
    unit_type: UnitType,
) -> Result<AccessMode> {
    if team.is_owner_team() {
        return Ok(owner_unit_mode(unit_type));
    }
    if team.access_mode >= AccessMode::Admin {
        return Ok(team.access_mode);
    }

    Ok(store
        .list_team_units(team.id)?
        .into_iter()
        .filter(|u| u.unit_type == unit_type)
        .map(|u| u.access_mode)
        .max()
        .unwrap_or(AccessMode::None))
}

/// Highest grant `team_id` holds on `group_id` or any of its ancestors.
///
/// An unresolvable chain is an error, never a silent None.
pub fn ancestor_permission(store: &dyn Store, group_id: i64, team_id: i64) -> Result<AccessMode> {
    let chain = ancestor_chain(store, group_id)?;
    if chain.is_empty() {
        return Err(Error::NotFound(Entity::Group));
    }
    store.max_group_team_mode(team_id, &GroupCondition::from_chain(&chain))
}

/// Highest unit grant `team_id` holds on `group_id` or any of its ancestors.
pub fn ancestor_unit_permission(
    store: &dyn Store,
    group_id: i64,
    team_id: i64,
    unit_type: UnitType,
) -> Result<AccessMode> {
    let chain = ancestor_chain(store, group_id)?;
    if chain.is_empty() {
        return Err(Error::NotFound(Entity::Group));
    }
    store.max_group_unit_mode(team_id, &GroupCondition::from_chain(&chain), unit_type)
}

/// Coarse mode `team` grants on `repo`; None when the team does not reach it.
///
/// A team reaches a repository through an explicit team repository row, by
/// including all repositories, or through a grant on the repository's group
/// or one of its ancestors.
pub fn team_repo_mode(store: &dyn Store, team: &Team, repo: &Repository) -> Result<AccessMode> {
    if team.org_id != repo.owner_id() {
        return Ok(AccessMode::None);
    }
    if team.is_owner_team() {
        return Ok(AccessMode::Owner);
    }

    let mut mode = AccessMode::None;
    if team.includes_all_repositories || store.has_team_repo(team.id, repo.id)? {
        mode = team.access_mode;
    }
    if repo.group_id != 0 {
        mode = mode.max(ancestor_permission(store, repo.group_id, team.id)?);
    }
    Ok(mode)
}

/// Unit mode `team` grants on `repo`, folding in group unit grants along the
/// repository's group chain.
pub fn team_unit_mode(
    store: &dyn Store,
    team: &Team,
    repo: &Repository,
    unit_type: UnitType,
) -> Result<AccessMode> {
    let mode = effective_capability(store, team, unit_type)?;
    if team.is_owner_team() || repo.group_id == 0 {
        return Ok(mode);
    }
    Ok(mode.max(ancestor_unit_permission(
        store,
        repo.group_id,
        team.id,
        unit_type,
    )?))
}
