mod repair;
mod units;

pub use repair::repair_owner_team_units;
pub use units::{
    ancestor_permission, ancestor_unit_permission, effective_capability, owner_team_units,
    owner_unit_mode, team_repo_mode, team_unit_mode,
};
