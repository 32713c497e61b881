use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Group;

/// Maximum number of groups on any path from a root down to a group, inclusive.
pub const MAX_GROUP_DEPTH: usize = 20;

/// GroupCondition matches a fixed set of group ids, typically a group and its ancestors.
///
/// An empty condition never matches. It is what [`ancestor_condition`]
/// returns when the chain could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupCondition {
    group_ids: Vec<i64>,
}

impl GroupCondition {
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_ids(group_ids: Vec<i64>) -> Self {
        Self { group_ids }
    }

    #[must_use]
    pub fn from_chain(chain: &[Group]) -> Self {
        Self::from_ids(chain.iter().map(|g| g.id).collect())
    }

    #[must_use]
    pub fn group_ids(&self) -> &[i64] {
        &self.group_ids
    }

    #[must_use]
    pub fn is_never(&self) -> bool {
        self.group_ids.is_empty()
    }

    #[must_use]
    pub fn matches(&self, group_id: i64) -> bool {
        self.group_ids.contains(&group_id)
    }

    /// Renders the condition as a SQL predicate on `column`.
    pub(crate) fn sql(&self, column: &str) -> String {
        if self.group_ids.is_empty() {
            return "0 = 1".to_string();
        }
        let ids: Vec<String> = self.group_ids.iter().map(i64::to_string).collect();
        format!("{column} IN ({})", ids.join(", "))
    }
}

/// A group with its subgroups loaded for the duration of one traversal.
#[derive(Debug, Clone, Serialize)]
pub struct GroupTree {
    pub group: Group,
    pub subgroups: Vec<GroupTree>,
}

impl GroupTree {
    /// Ids of this group and every loaded descendant, parents before children.
    #[must_use]
    pub fn group_ids(&self) -> Vec<i64> {
        let mut ids = vec![self.group.id];
        for child in &self.subgroups {
            ids.extend(child.group_ids());
        }
        ids
    }

    /// Number of levels in the loaded tree, counting this group.
    #[must_use]
    pub fn height(&self) -> usize {
        1 + self.subgroups.iter().map(GroupTree::height).max().unwrap_or(0)
    }
}

/// Returns the chain of groups from the root down to `group_id`, inclusive.
///
/// Walking more than [`MAX_GROUP_DEPTH`] parents fails with `TooDeep`, which
/// also terminates on a cyclic parent chain. Group 0 yields an empty chain.
pub fn ancestor_chain(store: &dyn Store, group_id: i64) -> Result<Vec<Group>> {
    let mut chain = Vec::new();
    let mut current = group_id;

    while current != 0 {
        if chain.len() == MAX_GROUP_DEPTH {
            warn!(group_id, "Group ancestor chain exceeds {MAX_GROUP_DEPTH} levels");
            return Err(Error::TooDeep(group_id));
        }
        let group = store.require_group(current)?;
        current = group.parent_group_id;
        chain.push(group);
    }

    chain.reverse();
    Ok(chain)
}

/// Builds a condition matching `group_id` and all of its ancestors.
///
/// Resolution failures produce a condition that matches nothing; callers that
/// need to tell "no ancestors" from "could not resolve" use [`ancestor_chain`].
pub fn ancestor_condition(store: &dyn Store, group_id: i64) -> GroupCondition {
    match ancestor_chain(store, group_id) {
        Ok(chain) => GroupCondition::from_chain(&chain),
        Err(e) => {
            debug!(group_id, "Ancestor condition falls back to never: {e}");
            GroupCondition::never()
        }
    }
}

/// Loads the subgroups of `parent_group_id` (0 for the owner's roots) that pass
/// `filter`, ordered by sort order with ties kept in fetch order.
pub fn load_subgroups(
    store: &dyn Store,
    owner_id: i64,
    parent_group_id: i64,
    recursive: bool,
    filter: &dyn Fn(&Group) -> bool,
) -> Result<Vec<GroupTree>> {
    load_level(store, owner_id, parent_group_id, recursive, filter, 1)
}

fn load_level(
    store: &dyn Store,
    owner_id: i64,
    parent_group_id: i64,
    recursive: bool,
    filter: &dyn Fn(&Group) -> bool,
    depth: usize,
) -> Result<Vec<GroupTree>> {
    if depth > MAX_GROUP_DEPTH {
        warn!(parent_group_id, "Subgroup descent exceeds {MAX_GROUP_DEPTH} levels");
        return Err(Error::TooDeep(parent_group_id));
    }

    let mut groups = store.list_child_groups(owner_id, parent_group_id)?;
    groups.retain(|g| filter(g));
    groups.sort_by_key(|g| g.sort_order);

    groups
        .into_iter()
        .map(|group| {
            let subgroups = if recursive {
                load_level(store, owner_id, group.id, true, filter, depth + 1)?
            } else {
                Vec::new()
            };
            Ok(GroupTree { group, subgroups })
        })
        .collect()
}

/// Loads `group` together with its full subtree.
pub fn load_tree(store: &dyn Store, group: Group) -> Result<GroupTree> {
    let subgroups = load_subgroups(store, group.owner_id, group.id, true, &|_| true)?;
    Ok(GroupTree { group, subgroups })
}

/// Re-parents `group` under `new_parent_id` (0 for root) at `sort_order`.
///
/// The new parent must belong to the same owner and must not be the group
/// itself or one of its descendants. The moved subtree has to fit within
/// [`MAX_GROUP_DEPTH`] at its new position.
pub fn move_group(
    store: &dyn Store,
    group: &mut Group,
    new_parent_id: i64,
    sort_order: i64,
) -> Result<()> {
    let parent_depth = if new_parent_id == 0 {
        0
    } else {
        let parent = store.require_group(new_parent_id)?;
        if parent.owner_id != group.owner_id {
            return Err(Error::invalid(format!(
                "group {} cannot be moved under group {} of another owner",
                group.id, parent.id
            )));
        }
        let chain = ancestor_chain(store, new_parent_id)?;
        if chain.iter().any(|g| g.id == group.id) {
            return Err(Error::invalid(format!(
                "group {} cannot be moved under itself or one of its subgroups",
                group.id
            )));
        }
        chain.len()
    };

    let tree = load_tree(store, group.clone())?;
    if parent_depth + tree.height() > MAX_GROUP_DEPTH {
        return Err(Error::TooDeep(group.id));
    }

    store.update_group_placement(group.id, new_parent_id, sort_order)?;
    group.parent_group_id = new_parent_id;
    group.sort_order = sort_order;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_sql() {
        let cond = GroupCondition::from_ids(vec![3, 7]);
        assert_eq!(cond.sql("group_id"), "group_id IN (3, 7)");
        assert!(cond.matches(7));
        assert!(!cond.matches(4));
    }

    #[test]
    fn test_never_condition_matches_nothing() {
        let cond = GroupCondition::never();
        assert!(cond.is_never());
        assert_eq!(cond.sql("group_id"), "0 = 1");
        assert!(!cond.matches(0));
    }
}
