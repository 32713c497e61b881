use tracing::info;

use super::owner_unit_mode;
use crate::error::Result;
use crate::store::Store;
use crate::types::{AccessMode, OWNER_TEAM_NAME};

/// Resets owner team rows that drifted from their fixed values.
///
/// Unit rows go back to Owner (Read for external units) and the coarse
/// column back to Owner. Safe to run repeatedly; returns the number of rows
/// corrected.
pub fn repair_owner_team_units(store: &dyn Store) -> Result<usize> {
    let mut fixed = 0;

    for mut team in store.list_teams_by_name(OWNER_TEAM_NAME)? {
        for unit in store.list_team_units(team.id)? {
            let expected = owner_unit_mode(unit.unit_type);
            if unit.access_mode != expected
                && store.update_team_unit_mode(team.id, unit.unit_type, expected)?
            {
                fixed += 1;
            }
        }

        if team.access_mode != AccessMode::Owner {
            team.access_mode = AccessMode::Owner;
            store.update_team(&team)?;
            fixed += 1;
        }
    }

    info!(fixed, "Repaired owner team units");
    Ok(fixed)
}
