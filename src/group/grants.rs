use tracing::debug;

use crate::error::Result;
use crate::group::GroupCondition;
use crate::store::Store;
use crate::types::{AccessMode, Group, GroupTeam, GroupUnit, Team};

/// Derives the team grants of `group` from its parent (or, at root, from the
/// organization's teams).
///
/// Each team's coarse grant becomes the max of the grant already recorded for
/// it (on this group, else on the parent) and the team's own coarse mode. Unit
/// grants never widen when descending: below root they are capped by the
/// parent's unit grant for the same team and unit.
pub fn inherit_team_grants(store: &dyn Store, group: &Group) -> Result<()> {
    let teams = teams_for_parent(store, group)?;

    for team in &teams {
        let existing = store.get_group_team(group.id, team.id)?;
        let inherited = if group.parent_group_id == 0 {
            None
        } else {
            store.get_group_team(group.parent_group_id, team.id)?
        };
        let source = existing.or(inherited);

        let access_mode = source
            .map_or(AccessMode::None, |g| g.access_mode)
            .max(team.effective_mode());
        let can_create_in = source.is_some_and(|g| g.can_create_in)
            || team.can_create_org_repo
            || team.is_owner_team()
            || team.access_mode >= AccessMode::Admin;

        store.upsert_group_team(&GroupTeam {
            org_id: team.org_id,
            team_id: team.id,
            group_id: group.id,
            access_mode,
            can_create_in,
        })?;

        for unit in store.list_team_units(team.id)? {
            let mut access_mode = unit.access_mode;
            if group.parent_group_id != 0 {
                if let Some(parent_unit) =
                    store.get_group_unit(group.parent_group_id, team.id, unit.unit_type)?
                {
                    access_mode = access_mode.min(parent_unit.access_mode);
                }
            }
            store.upsert_group_unit(&GroupUnit {
                group_id: group.id,
                team_id: team.id,
                unit_type: unit.unit_type,
                access_mode,
            })?;
        }
    }

    debug!(
        group_id = group.id,
        teams = teams.len(),
        "Derived group team grants"
    );
    Ok(())
}

fn teams_for_parent(store: &dyn Store, group: &Group) -> Result<Vec<Team>> {
    if group.parent_group_id == 0 {
        return store.list_org_teams(group.owner_id);
    }

    let grants = store.list_group_teams(&GroupCondition::from_ids(vec![group.parent_group_id]))?;
    grants
        .into_iter()
        .map(|g| store.require_team(g.team_id))
        .collect()
}
