#![allow(dead_code)]

use tempfile::TempDir;

use warrant::admin;
use warrant::store::{SqliteStore, Store};
use warrant::types::*;

/// A fresh database in its own temp directory.
pub struct TestDb {
    pub db: SqliteStore,
    _temp_dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db = SqliteStore::new(temp_dir.path().join("warrant.db")).expect("open database");
        db.initialize().expect("initialize schema");
        Self {
            db,
            _temp_dir: temp_dir,
        }
    }

    fn insert_user(&self, user: User) -> User {
        self.db
            .transaction(|store| store.create_user(&user))
            .expect("create user");
        user
    }

    pub fn user(&self, id: i64, name: &str) -> User {
        self.insert_user(User {
            id,
            name: name.to_string(),
            is_admin: false,
            is_restricted: false,
            is_organization: false,
            visibility: Visibility::Public,
        })
    }

    pub fn restricted_user(&self, id: i64, name: &str) -> User {
        self.insert_user(User {
            is_restricted: true,
            ..self.plain(id, name)
        })
    }

    pub fn admin_user(&self, id: i64, name: &str) -> User {
        self.insert_user(User {
            is_admin: true,
            ..self.plain(id, name)
        })
    }

    pub fn user_with_visibility(&self, id: i64, name: &str, visibility: Visibility) -> User {
        self.insert_user(User {
            visibility,
            ..self.plain(id, name)
        })
    }

    pub fn org(&self, id: i64, name: &str) -> User {
        self.org_with_visibility(id, name, Visibility::Public)
    }

    pub fn org_with_visibility(&self, id: i64, name: &str, visibility: Visibility) -> User {
        self.insert_user(User {
            is_organization: true,
            visibility,
            ..self.plain(id, name)
        })
    }

    fn plain(&self, id: i64, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            is_admin: false,
            is_restricted: false,
            is_organization: false,
            visibility: Visibility::Public,
        }
    }

    pub fn repo(&self, id: i64, owner: &User, name: &str, is_private: bool) -> Repository {
        self.repo_in_group(id, owner, name, is_private, 0)
    }

    pub fn repo_in_group(
        &self,
        id: i64,
        owner: &User,
        name: &str,
        is_private: bool,
        group_id: i64,
    ) -> Repository {
        let repo = Repository {
            id,
            name: name.to_string(),
            is_private,
            group_id,
            owner: owner.clone(),
        };
        admin::create_repository(&self.db, &repo).expect("create repository");
        repo
    }

    pub fn team(
        &self,
        org: &User,
        name: &str,
        access_mode: AccessMode,
        units: &[(UnitType, AccessMode)],
    ) -> Team {
        let team = Team {
            id: 0,
            org_id: org.id,
            name: name.to_string(),
            access_mode,
            includes_all_repositories: false,
            can_create_org_repo: false,
        };
        admin::create_team(&self.db, &team, units).expect("create team")
    }

    pub fn group(&self, owner: &User, parent_group_id: i64, name: &str) -> Group {
        admin::create_group(&self.db, owner.id, parent_group_id, name, 0).expect("create group")
    }

    pub fn cached(&self, user_id: i64, repo_id: i64) -> Option<AccessMode> {
        self.db
            .read(|store| store.get_access_mode(user_id, repo_id))
            .expect("read access")
    }

    pub fn accesses(&self, repo_id: i64) -> Vec<Access> {
        self.db
            .read(|store| store.list_repo_accesses(repo_id))
            .expect("list accesses")
    }

    pub fn permission(&self, actor: Option<&User>, repo_id: i64) -> Permission {
        self.db
            .read(|store| {
                let repo = store.require_repository(repo_id)?;
                warrant::access::get_user_repo_permission(store, actor, &repo)
            })
            .expect("resolve permission")
    }
}

/// Every unit granted at `mode`.
pub fn all_units(mode: AccessMode) -> Vec<(UnitType, AccessMode)> {
    UnitType::ALL.into_iter().map(|u| (u, mode)).collect()
}
