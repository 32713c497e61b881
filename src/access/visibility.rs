use crate::error::Result;
use crate::store::Store;
use crate::types::{User, Visibility};

/// Returns true if `viewer` (None for anonymous) may see `owner` and its repositories.
pub fn has_org_or_user_visible(
    store: &dyn Store,
    owner: &User,
    viewer: Option<&User>,
) -> Result<bool> {
    if let Some(viewer) = viewer {
        if viewer.is_admin || viewer.id == owner.id {
            return Ok(true);
        }
    }

    match owner.visibility {
        Visibility::Public => Ok(true),
        Visibility::Limited => Ok(viewer.is_some_and(|v| !v.is_ghost())),
        Visibility::Private => match viewer {
            Some(viewer) if owner.is_organization => store.is_org_member(owner.id, viewer.id),
            _ => Ok(false),
        },
    }
}
