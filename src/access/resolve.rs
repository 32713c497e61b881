use std::collections::BTreeMap;

use super::visibility::has_org_or_user_visible;
use crate::error::Result;
use crate::store::Store;
use crate::team::{team_repo_mode, team_unit_mode};
use crate::types::{AccessMode, Permission, Repository, UnitType, User};

/// Resolves what `actor` (None for anonymous) may do on `repo`.
///
/// Each step that returns is final: anonymous on private, invisible owner,
/// anonymous read, admin or owner, then the cached coarse mode, refined into
/// per-unit modes for organization repositories.
pub fn get_user_repo_permission(
    store: &dyn Store,
    actor: Option<&User>,
    repo: &Repository,
) -> Result<Permission> {
    if actor.is_none() && repo.is_private {
        return Ok(Permission::none());
    }

    if !has_org_or_user_visible(store, &repo.owner, actor)? {
        let is_collaborator = match actor {
            Some(actor) => store.get_collaboration(repo.id, actor.id)?.is_some(),
            None => false,
        };
        if !is_collaborator {
            return Ok(Permission::none());
        }
    }

    let Some(actor) = actor else {
        return Ok(Permission::coarse(AccessMode::Read));
    };

    if actor.is_admin || actor.id == repo.owner_id() {
        return Ok(Permission::coarse(AccessMode::Owner));
    }

    let access_mode = cached_access_mode(store, actor, repo)?;
    if !repo.owner.is_organization {
        return Ok(Permission::coarse(access_mode));
    }

    let is_collaborator = store.get_collaboration(repo.id, actor.id)?.is_some();

    let mut teams = Vec::new();
    for team in store.list_user_teams(repo.owner_id(), actor.id)? {
        let mode = team_repo_mode(store, &team, repo)?;
        if mode >= AccessMode::Admin {
            return Ok(Permission::coarse(AccessMode::Owner));
        }
        if mode > AccessMode::None {
            teams.push(team);
        }
    }

    let mut units = BTreeMap::new();
    for unit_type in UnitType::ALL {
        let mut granted = AccessMode::None;
        for team in &teams {
            granted = granted.max(team_unit_mode(store, team, repo, unit_type)?);
        }

        let mut mode = if is_collaborator {
            access_mode.max(granted)
        } else {
            granted
        };
        if granted == AccessMode::None && !repo.is_private && !actor.is_restricted {
            mode = mode.max(AccessMode::Read);
        }
        if mode > AccessMode::None {
            units.insert(unit_type, mode);
        }
    }

    Ok(Permission {
        access_mode,
        units_mode: Some(units),
    })
}

/// Coarse mode of `actor` on `repo`.
pub fn access_level(
    store: &dyn Store,
    actor: Option<&User>,
    repo: &Repository,
) -> Result<AccessMode> {
    Ok(get_user_repo_permission(store, actor, repo)?.access_mode)
}

/// Mode of `actor` on one unit of `repo`.
pub fn access_level_for_unit(
    store: &dyn Store,
    actor: Option<&User>,
    repo: &Repository,
    unit_type: UnitType,
) -> Result<AccessMode> {
    Ok(get_user_repo_permission(store, actor, repo)?.unit_access_mode(unit_type))
}

/// Mode recorded in the access cache, falling back to ambient read on
/// public repositories for unrestricted users.
fn cached_access_mode(store: &dyn Store, actor: &User, repo: &Repository) -> Result<AccessMode> {
    let floor = if !repo.is_private && !actor.is_restricted {
        AccessMode::Read
    } else {
        AccessMode::None
    };

    Ok(store.get_access_mode(actor.id, repo.id)?.unwrap_or(floor))
}
