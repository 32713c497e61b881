use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::team::team_repo_mode;
use crate::types::{Access, AccessMode, Repository};

/// Lowest mode worth caching for `repo`.
///
/// Public personal repositories already give every signed-in user read
/// access, so only write and above is recorded for them.
pub fn min_cached_mode(repo: &Repository) -> AccessMode {
    if !repo.is_private && !repo.owner.is_organization {
        AccessMode::Write
    } else {
        AccessMode::Read
    }
}

/// Restricted users get no ambient access, so any grant of theirs is kept.
fn passes_floor(mode: AccessMode, floor: AccessMode, is_restricted: bool) -> bool {
    mode >= floor || (is_restricted && mode >= AccessMode::Read)
}

/// Rebuilds every cached row of `repo` from collaborators and, for
/// organization repositories, teams.
pub fn recalculate_accesses(store: &dyn Store, repo: &Repository) -> Result<()> {
    if repo.owner.is_organization {
        recalculate_team_accesses(store, repo, 0)
    } else {
        let modes = collaborator_modes(store, repo)?;
        write_accesses(store, repo, modes)
    }
}

/// Rebuilds the cached rows of an organization repository, ignoring
/// `exclude_team_id` (0 excludes nothing).
pub fn recalculate_team_accesses(
    store: &dyn Store,
    repo: &Repository,
    exclude_team_id: i64,
) -> Result<()> {
    if !repo.owner.is_organization {
        return Err(Error::invalid(format!(
            "repository {} is not owned by an organization",
            repo.id
        )));
    }

    let mut modes = collaborator_modes(store, repo)?;

    for team in store.list_org_teams(repo.owner_id())? {
        if team.id == exclude_team_id {
            continue;
        }
        let mode = team_repo_mode(store, &team, repo)?;
        if mode == AccessMode::None {
            continue;
        }
        for user_id in store.list_team_user_ids(team.id)? {
            if user_id == repo.owner_id() {
                continue;
            }
            let entry = modes.entry(user_id).or_insert(AccessMode::None);
            *entry = (*entry).max(mode);
        }
    }

    write_accesses(store, repo, modes)
}

/// Recomputes the one cached row of `user_id` on `repo`.
pub fn recalculate_user_access(store: &dyn Store, repo: &Repository, user_id: i64) -> Result<()> {
    if user_id == repo.owner_id() {
        return store.set_user_access(user_id, repo.id, None);
    }

    let mut mode = store
        .get_collaboration(repo.id, user_id)?
        .map_or(AccessMode::None, |c| c.mode);

    if repo.owner.is_organization {
        for team in store.list_user_teams(repo.owner_id(), user_id)? {
            mode = mode.max(team_repo_mode(store, &team, repo)?);
        }
    }

    let user = store.require_user(user_id)?;
    let keep = mode > AccessMode::None
        && passes_floor(mode, min_cached_mode(repo), user.is_restricted);

    debug!(repo_id = repo.id, user_id, %mode, keep, "Recalculated user access");
    store.set_user_access(user_id, repo.id, keep.then_some(mode))
}

fn collaborator_modes(store: &dyn Store, repo: &Repository) -> Result<BTreeMap<i64, AccessMode>> {
    let mut modes = BTreeMap::new();
    for collaboration in store.list_collaborations(repo.id)? {
        if collaboration.user_id == repo.owner_id() {
            continue;
        }
        let entry = modes
            .entry(collaboration.user_id)
            .or_insert(AccessMode::None);
        *entry = (*entry).max(collaboration.mode);
    }
    Ok(modes)
}

fn write_accesses(
    store: &dyn Store,
    repo: &Repository,
    modes: BTreeMap<i64, AccessMode>,
) -> Result<()> {
    let floor = min_cached_mode(repo);
    let mut rows = Vec::with_capacity(modes.len());

    for (user_id, mode) in modes {
        if mode == AccessMode::None {
            continue;
        }
        if mode < floor && !passes_floor(mode, floor, store.require_user(user_id)?.is_restricted) {
            continue;
        }
        rows.push(Access {
            user_id,
            repo_id: repo.id,
            mode,
        });
    }

    debug!(repo_id = repo.id, rows = rows.len(), "Recalculated repository accesses");
    store.replace_repo_accesses(repo.id, &rows)
}
