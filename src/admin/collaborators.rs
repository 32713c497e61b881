use chrono::Utc;
use tracing::info;

use crate::access::recalculate_user_access;
use crate::error::{Entity, Error, Result};
use crate::store::{SqliteStore, Store};
use crate::types::{AccessMode, Collaboration};

pub fn add_collaborator(
    db: &SqliteStore,
    repo_id: i64,
    user_id: i64,
    mode: AccessMode,
) -> Result<()> {
    if mode == AccessMode::None {
        return Err(Error::invalid("collaborator mode cannot be none"));
    }

    db.transaction(|store| {
        let repo = store.require_repository(repo_id)?;
        let user = store.require_user(user_id)?;
        if user.id == repo.owner_id() {
            return Err(Error::invalid(
                "repository owner cannot be added as a collaborator",
            ));
        }
        if user.is_organization {
            return Err(Error::invalid(
                "an organization cannot be added as a collaborator",
            ));
        }

        store.upsert_collaboration(&Collaboration {
            repo_id,
            user_id,
            mode,
            created_at: Utc::now(),
        })?;
        recalculate_user_access(store, &repo, user_id)
    })?;

    info!(repo_id, user_id, %mode, "Added collaborator");
    Ok(())
}

pub fn change_collaborator_mode(
    db: &SqliteStore,
    repo_id: i64,
    user_id: i64,
    mode: AccessMode,
) -> Result<()> {
    if mode == AccessMode::None {
        return Err(Error::invalid("collaborator mode cannot be none"));
    }

    db.transaction(|store| {
        let repo = store.require_repository(repo_id)?;
        let mut collaboration = store
            .get_collaboration(repo_id, user_id)?
            .ok_or(Error::NotFound(Entity::Collaboration))?;
        if collaboration.mode == mode {
            return Ok(());
        }

        collaboration.mode = mode;
        store.upsert_collaboration(&collaboration)?;
        recalculate_user_access(store, &repo, user_id)
    })?;

    info!(repo_id, user_id, %mode, "Changed collaborator mode");
    Ok(())
}

/// Removes a collaborator; returns false if there was nothing to remove.
pub fn remove_collaborator(db: &SqliteStore, repo_id: i64, user_id: i64) -> Result<bool> {
    let removed = db.transaction(|store| {
        let repo = store.require_repository(repo_id)?;
        if !store.delete_collaboration(repo_id, user_id)? {
            return Ok(false);
        }
        recalculate_user_access(store, &repo, user_id)?;
        Ok(true)
    })?;

    if removed {
        info!(repo_id, user_id, "Removed collaborator");
    }
    Ok(removed)
}
