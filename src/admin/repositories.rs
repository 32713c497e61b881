use tracing::info;

use super::validate_name;
use crate::access::recalculate_accesses;
use crate::error::{Error, Result};
use crate::store::{SqliteStore, Store};
use crate::types::Repository;

fn check_group_owner(store: &dyn Store, owner_id: i64, group_id: i64) -> Result<()> {
    if group_id == 0 {
        return Ok(());
    }
    let group = store.require_group(group_id)?;
    if group.owner_id != owner_id {
        return Err(Error::invalid(format!(
            "group {group_id} belongs to another owner"
        )));
    }
    Ok(())
}

/// Records a repository and builds its initial cache rows.
pub fn create_repository(db: &SqliteStore, repo: &Repository) -> Result<()> {
    validate_name(&repo.name, "Repository")?;

    db.transaction(|store| {
        let owner = store.require_user(repo.owner_id())?;
        check_group_owner(store, owner.id, repo.group_id)?;

        store.create_repository(repo)?;
        let repo = store.require_repository(repo.id)?;
        recalculate_accesses(store, &repo)
    })?;

    info!(repo_id = repo.id, owner_id = repo.owner_id(), "Created repository");
    Ok(())
}

/// Moves a repository into `group_id` (0 for the owner's top level).
pub fn set_repository_group(db: &SqliteStore, repo_id: i64, group_id: i64) -> Result<()> {
    db.transaction(|store| {
        let repo = store.require_repository(repo_id)?;
        check_group_owner(store, repo.owner_id(), group_id)?;

        store.set_repository_group(repo_id, group_id)?;
        let repo = store.require_repository(repo_id)?;
        recalculate_accesses(store, &repo)
    })?;

    info!(repo_id, group_id, "Moved repository into group");
    Ok(())
}
