//! Teams, the owner team invariant and the repair sweep.

mod common;

use common::{TestDb, all_units};
use warrant::admin;
use warrant::error::Error;
use warrant::store::Store;
use warrant::team::{effective_capability, owner_unit_mode, repair_owner_team_units};
use warrant::types::{AccessMode, OWNER_TEAM_NAME, Team, UnitType};

fn unit_modes(t: &TestDb, team_id: i64) -> Vec<(UnitType, AccessMode)> {
    let mut units: Vec<_> = t
        .db
        .read(|s| s.list_team_units(team_id))
        .unwrap()
        .into_iter()
        .map(|u| (u.unit_type, u.access_mode))
        .collect();
    units.sort();
    units
}

#[test]
fn test_owner_team_units_hold_owner_modes() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let owners = admin::create_owner_team(&t.db, org.id).unwrap();

    assert!(owners.is_owner_team());
    assert_eq!(owners.access_mode, AccessMode::Owner);
    for (unit_type, mode) in unit_modes(&t, owners.id) {
        assert_eq!(mode, owner_unit_mode(unit_type));
    }
    assert_eq!(unit_modes(&t, owners.id).len(), UnitType::ALL.len());
}

#[test]
fn test_repair_restores_drifted_owner_team() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let owners = admin::create_owner_team(&t.db, org.id).unwrap();

    t.db
        .transaction(|store| {
            store.update_team_unit_mode(owners.id, UnitType::Code, AccessMode::Read)?;
            store.update_team_unit_mode(owners.id, UnitType::ExternalWiki, AccessMode::Write)?;
            store.update_team(&Team {
                access_mode: AccessMode::Write,
                ..owners.clone()
            })
        })
        .unwrap();

    // The owner team resolves to owner modes even while its rows drift.
    let capability = t
        .db
        .read(|s| effective_capability(s, &owners, UnitType::Code))
        .unwrap();
    assert_eq!(capability, AccessMode::Owner);

    assert_eq!(admin::repair_owner_teams(&t.db).unwrap(), 3);
    for (unit_type, mode) in unit_modes(&t, owners.id) {
        assert_eq!(mode, owner_unit_mode(unit_type));
    }
    let repaired = t.db.read(|s| s.require_team(owners.id)).unwrap();
    assert_eq!(repaired.access_mode, AccessMode::Owner);

    assert_eq!(t.db.transaction(|s| repair_owner_team_units(s)).unwrap(), 0);
}

#[test]
fn test_owner_team_members_own_every_repository() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let bob = t.user(2, "bob");
    let owners = admin::create_owner_team(&t.db, org.id).unwrap();
    admin::add_team_member(&t.db, owners.id, bob.id).unwrap();

    let repo = t.repo(10, &org, "api", true);
    assert_eq!(t.cached(bob.id, repo.id), Some(AccessMode::Owner));

    let perm = t.permission(Some(&bob), repo.id);
    assert_eq!(perm.access_mode, AccessMode::Owner);
    assert_eq!(perm.units_mode, None);
}

#[test]
fn test_owner_team_is_protected() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let bob = t.user(2, "bob");
    let carol = t.user(3, "carol");
    let owners = admin::create_owner_team(&t.db, org.id).unwrap();
    admin::add_team_member(&t.db, owners.id, bob.id).unwrap();

    let err = admin::remove_team_member(&t.db, owners.id, bob.id).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    admin::add_team_member(&t.db, owners.id, carol.id).unwrap();
    assert!(admin::remove_team_member(&t.db, owners.id, bob.id).unwrap());
    assert!(!admin::remove_team_member(&t.db, owners.id, bob.id).unwrap());

    let renamed = Team {
        name: "Maintainers".to_string(),
        ..owners.clone()
    };
    assert!(matches!(
        admin::update_team(&t.db, &renamed, &[]),
        Err(Error::InvalidOperation(_))
    ));

    // Updating the owner team keeps its owner modes whatever is passed in.
    let weakened = Team {
        access_mode: AccessMode::Read,
        ..owners.clone()
    };
    admin::update_team(&t.db, &weakened, &all_units(AccessMode::Read)).unwrap();
    let stored = t.db.read(|s| s.require_team(owners.id)).unwrap();
    assert_eq!(stored.access_mode, AccessMode::Owner);
    for (unit_type, mode) in unit_modes(&t, owners.id) {
        assert_eq!(mode, owner_unit_mode(unit_type));
    }
}

#[test]
fn test_team_name_rules() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let person = t.user(2, "bob");

    let reserved = Team {
        id: 0,
        org_id: org.id,
        name: OWNER_TEAM_NAME.to_string(),
        access_mode: AccessMode::Read,
        includes_all_repositories: false,
        can_create_org_repo: false,
    };
    assert!(matches!(
        admin::create_team(&t.db, &reserved, &[]),
        Err(Error::InvalidOperation(_))
    ));

    let personal = Team {
        org_id: person.id,
        name: "friends".to_string(),
        ..reserved.clone()
    };
    assert!(matches!(
        admin::create_team(&t.db, &personal, &[]),
        Err(Error::InvalidOperation(_))
    ));

    let devs = t.team(&org, "devs", AccessMode::Write, &[]);
    let renamed = Team {
        name: OWNER_TEAM_NAME.to_string(),
        ..devs
    };
    assert!(matches!(
        admin::update_team(&t.db, &renamed, &[]),
        Err(Error::InvalidOperation(_))
    ));
}

#[test]
fn test_remove_team_repository_drops_access() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let bob = t.user(2, "bob");
    let carol = t.user(3, "carol");
    let repo = t.repo(10, &org, "api", true);

    let devs = t.team(&org, "devs", AccessMode::Write, &all_units(AccessMode::Write));
    let readers = t.team(&org, "readers", AccessMode::Read, &all_units(AccessMode::Read));
    admin::add_team_member(&t.db, devs.id, bob.id).unwrap();
    admin::add_team_member(&t.db, readers.id, bob.id).unwrap();
    admin::add_team_member(&t.db, devs.id, carol.id).unwrap();
    admin::add_team_repository(&t.db, devs.id, repo.id).unwrap();
    admin::add_team_repository(&t.db, readers.id, repo.id).unwrap();
    assert_eq!(t.cached(bob.id, repo.id), Some(AccessMode::Write));

    assert!(admin::remove_team_repository(&t.db, devs.id, repo.id).unwrap());
    assert_eq!(t.cached(bob.id, repo.id), Some(AccessMode::Read));
    assert_eq!(t.cached(carol.id, repo.id), None);
    assert!(!admin::remove_team_repository(&t.db, devs.id, repo.id).unwrap());
}

#[test]
fn test_team_repository_must_share_org() {
    let t = TestDb::new();
    let acme = t.org(1, "acme");
    let other = t.org(2, "other");
    let repo = t.repo(10, &other, "api", true);
    let devs = t.team(&acme, "devs", AccessMode::Write, &[]);

    assert!(matches!(
        admin::add_team_repository(&t.db, devs.id, repo.id),
        Err(Error::InvalidOperation(_))
    ));
}

#[test]
fn test_all_repositories_team_reaches_new_repositories() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let bob = t.user(2, "bob");
    let existing = t.repo(10, &org, "api", true);

    let team = admin::create_team(
        &t.db,
        &Team {
            id: 0,
            org_id: org.id,
            name: "everyone".to_string(),
            access_mode: AccessMode::Read,
            includes_all_repositories: true,
            can_create_org_repo: false,
        },
        &all_units(AccessMode::Read),
    )
    .unwrap();
    admin::add_team_member(&t.db, team.id, bob.id).unwrap();
    assert_eq!(t.cached(bob.id, existing.id), Some(AccessMode::Read));

    let later = t.repo(11, &org, "web", true);
    assert_eq!(t.cached(bob.id, later.id), Some(AccessMode::Read));
}

#[test]
fn test_leaving_team_drops_access() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let bob = t.user(2, "bob");
    let repo = t.repo(10, &org, "api", true);
    let devs = t.team(&org, "devs", AccessMode::Write, &all_units(AccessMode::Write));
    admin::add_team_repository(&t.db, devs.id, repo.id).unwrap();

    admin::add_team_member(&t.db, devs.id, bob.id).unwrap();
    assert_eq!(t.cached(bob.id, repo.id), Some(AccessMode::Write));

    assert!(admin::remove_team_member(&t.db, devs.id, bob.id).unwrap());
    assert_eq!(t.cached(bob.id, repo.id), None);
}

#[test]
fn test_remove_team_repository_keeps_group_reach() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let bob = t.user(2, "bob");
    let devs = t.team(&org, "devs", AccessMode::Write, &all_units(AccessMode::Write));
    admin::add_team_member(&t.db, devs.id, bob.id).unwrap();

    // Created after the team, so the group carries a Write grant for it.
    let platform = t.group(&org, 0, "platform");
    let repo = t.repo_in_group(10, &org, "api", true, platform.id);

    admin::add_team_repository(&t.db, devs.id, repo.id).unwrap();
    assert!(admin::remove_team_repository(&t.db, devs.id, repo.id).unwrap());
    assert_eq!(t.cached(bob.id, repo.id), Some(AccessMode::Write));
    assert_eq!(t.permission(Some(&bob), repo.id).access_mode, AccessMode::Write);

    let before = t.accesses(repo.id);
    admin::recalculate_repository(&t.db, repo.id).unwrap();
    assert_eq!(t.accesses(repo.id), before);
}

#[test]
fn test_remove_team_repository_keeps_all_repositories_reach() {
    let t = TestDb::new();
    let org = t.org(1, "acme");
    let bob = t.user(2, "bob");
    let repo = t.repo(10, &org, "api", true);
    let everyone = admin::create_team(
        &t.db,
        &Team {
            id: 0,
            org_id: org.id,
            name: "everyone".to_string(),
            access_mode: AccessMode::Read,
            includes_all_repositories: true,
            can_create_org_repo: false,
        },
        &all_units(AccessMode::Read),
    )
    .unwrap();
    admin::add_team_member(&t.db, everyone.id, bob.id).unwrap();

    admin::add_team_repository(&t.db, everyone.id, repo.id).unwrap();
    assert!(admin::remove_team_repository(&t.db, everyone.id, repo.id).unwrap());
    assert_eq!(t.cached(bob.id, repo.id), Some(AccessMode::Read));
}
