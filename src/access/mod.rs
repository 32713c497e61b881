//! The access cache and the permission resolver built on top of it.
//!
//! The cache stores the highest coarse mode per (user, repository) and is
//! only ever rebuilt, never patched. Callers run recomputation inside the
//! same transaction as the mutation that made it necessary.

mod cache;
mod resolve;
mod visibility;

pub use cache::{
    min_cached_mode, recalculate_accesses, recalculate_team_accesses, recalculate_user_access,
};
pub use resolve::{access_level, access_level_for_unit, get_user_repo_permission};
pub use visibility::has_org_or_user_visible;
