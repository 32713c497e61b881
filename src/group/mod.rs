//! Nested repository groups.
//!
//! Groups live in a flat table keyed by id; every traversal walks parent ids
//! one lookup at a time under the [`MAX_GROUP_DEPTH`] bound.

mod grants;
mod hierarchy;

pub use grants::inherit_team_grants;
pub use hierarchy::{
    GroupCondition, GroupTree, MAX_GROUP_DEPTH, ancestor_chain, ancestor_condition,
    load_subgroups, load_tree, move_group,
};
