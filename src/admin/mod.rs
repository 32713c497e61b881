//! Administrative mutations.
//!
//! Every operation opens one transaction on the [`SqliteStore`], applies its
//! change and recomputes the affected access cache rows before committing.

mod collaborators;
mod groups;
mod repositories;
mod teams;

pub use collaborators::{add_collaborator, change_collaborator_mode, remove_collaborator};
pub use groups::{create_group, move_group, set_group_team_grant, set_group_unit_grant};
pub use repositories::{create_repository, set_repository_group};
pub use teams::{
    add_team_member, add_team_repository, create_owner_team, create_team, remove_team_member,
    remove_team_repository, update_team,
};

use tracing::info;

use crate::access::recalculate_accesses;
use crate::error::{Error, Result};
use crate::store::{SqliteStore, Store};
use crate::team::repair_owner_team_units;

const MAX_NAME_LEN: usize = 255;

fn validate_name(name: &str, entity: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid(format!("{entity} name cannot be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid(format!(
            "{entity} name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(Error::invalid(format!(
            "{entity} name contains invalid characters"
        )));
    }
    Ok(())
}

/// Rebuilds the cache rows of every repository owned by `owner_id`.
fn recalculate_owner_repositories(store: &dyn Store, owner_id: i64) -> Result<usize> {
    let repos = store.list_owner_repositories(owner_id)?;
    for repo in &repos {
        recalculate_accesses(store, repo)?;
    }
    Ok(repos.len())
}

/// Rebuilds the cache rows of one repository.
pub fn recalculate_repository(db: &SqliteStore, repo_id: i64) -> Result<()> {
    db.transaction(|store| {
        let repo = store.require_repository(repo_id)?;
        recalculate_accesses(store, &repo)
    })
}

/// Rebuilds the cache rows of every repository, one transaction each.
pub fn recalculate_all(db: &SqliteStore) -> Result<usize> {
    let repos = db.read(|store| store.list_repositories())?;
    for repo in &repos {
        db.transaction(|store| recalculate_accesses(store, repo))?;
    }
    info!(repositories = repos.len(), "Recalculated all repository accesses");
    Ok(repos.len())
}

/// Runs the owner team repair sweep in one transaction.
pub fn repair_owner_teams(db: &SqliteStore) -> Result<usize> {
    db.transaction(|store| repair_owner_team_units(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("backend", "Group").is_ok());
        assert!(validate_name("", "Group").is_err());
        assert!(validate_name("   ", "Group").is_err());
        assert!(validate_name("a\nb", "Group").is_err());
        assert!(validate_name(&"x".repeat(256), "Group").is_err());
    }
}
