use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Entity, Error, Result};
use crate::group::GroupCondition;
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Runs `f` against the store outside of any transaction.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Store) -> Result<T>,
    {
        let conn = self.conn();
        f(&Session::new(&conn))
    }

    /// Runs `f` inside one immediate transaction. The transaction commits only
    /// when `f` returns Ok; an error or an unwind rolls every write back.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Store) -> Result<T>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&Session::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }
}

/// Session implements [`Store`] over a borrowed connection or transaction.
pub struct Session<'c> {
    conn: &'c Connection,
}

impl<'c> Session<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn atomically<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.conn.execute_batch("SAVEPOINT warrant_write")?;
        match f() {
            Ok(value) => {
                self.conn.execute_batch("RELEASE warrant_write")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO warrant_write; RELEASE warrant_write")
                {
                    tracing::error!("Failed to roll back savepoint: {rollback}");
                }
                Err(e)
            }
        }
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

const USER_COLUMNS: &str = "id, name, is_admin, is_restricted, is_organization, visibility";

const REPOSITORY_SELECT: &str = "SELECT r.id, r.name, r.is_private, r.group_id,
        u.id, u.name, u.is_admin, u.is_restricted, u.is_organization, u.visibility
     FROM repositories r
     JOIN users u ON u.id = r.owner_id";

const TEAM_COLUMNS: &str =
    "id, org_id, name, authorize, includes_all_repositories, can_create_org_repo";

const GROUP_COLUMNS: &str =
    "id, owner_id, parent_group_id, name, sort_order, created_at, updated_at";

fn user_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        is_admin: row.get(offset + 2)?,
        is_restricted: row.get(offset + 3)?,
        is_organization: row.get(offset + 4)?,
        visibility: row.get(offset + 5)?,
    })
}

fn repository_from_row(row: &Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        name: row.get(1)?,
        is_private: row.get(2)?,
        group_id: row.get(3)?,
        owner: user_from_row(row, 4)?,
    })
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        org_id: row.get(1)?,
        name: row.get(2)?,
        access_mode: row.get(3)?,
        includes_all_repositories: row.get(4)?,
        can_create_org_repo: row.get(5)?,
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        parent_group_id: row.get(2)?,
        name: row.get(3)?,
        sort_order: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn group_team_from_row(row: &Row<'_>) -> rusqlite::Result<GroupTeam> {
    Ok(GroupTeam {
        org_id: row.get(0)?,
        team_id: row.get(1)?,
        group_id: row.get(2)?,
        access_mode: row.get(3)?,
        can_create_in: row.get(4)?,
    })
}

fn collaboration_from_row(row: &Row<'_>) -> rusqlite::Result<Collaboration> {
    Ok(Collaboration {
        repo_id: row.get(0)?,
        user_id: row.get(1)?,
        mode: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn max_mode(mode: Option<AccessMode>) -> AccessMode {
    mode.unwrap_or(AccessMode::None)
}

impl Store for Session<'_> {
    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, name, is_admin, is_restricted, is_organization, visibility)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.name,
                user.is_admin,
                user.is_restricted,
                user.is_organization,
                user.visibility,
            ],
        )?;
        Ok(())
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                |row| user_from_row(row, 0),
            )
            .optional()
            .map_err(Error::from)
    }

    fn is_org_member(&self, org_id: i64, user_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM team_users WHERE org_id = ?1 AND uid = ?2",
            params![org_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Repository operations

    fn create_repository(&self, repo: &Repository) -> Result<()> {
        self.conn.execute(
            "INSERT INTO repositories (id, owner_id, name, is_private, group_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                repo.id,
                repo.owner_id(),
                repo.name,
                repo.is_private,
                repo.group_id
            ],
        )?;
        Ok(())
    }

    fn get_repository(&self, id: i64) -> Result<Option<Repository>> {
        self.conn
            .query_row(
                &format!("{REPOSITORY_SELECT} WHERE r.id = ?1"),
                params![id],
                repository_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_repositories(&self) -> Result<Vec<Repository>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REPOSITORY_SELECT} ORDER BY r.id"))?;
        let rows = stmt.query_map([], repository_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_owner_repositories(&self, owner_id: i64) -> Result<Vec<Repository>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REPOSITORY_SELECT} WHERE r.owner_id = ?1 ORDER BY r.id"
        ))?;
        let rows = stmt.query_map(params![owner_id], repository_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_group_repositories(&self, groups: &GroupCondition) -> Result<Vec<Repository>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REPOSITORY_SELECT} WHERE {} ORDER BY r.id",
            groups.sql("r.group_id")
        ))?;
        let rows = stmt.query_map([], repository_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_repository_group(&self, repo_id: i64, group_id: i64) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE repositories SET group_id = ?1 WHERE id = ?2",
            params![group_id, repo_id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(Entity::Repository));
        }
        Ok(())
    }

    // Collaboration operations

    fn upsert_collaboration(&self, collaboration: &Collaboration) -> Result<()> {
        self.conn.execute(
            "INSERT INTO collaborations (repo_id, user_id, mode, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (repo_id, user_id) DO UPDATE SET mode = excluded.mode",
            params![
                collaboration.repo_id,
                collaboration.user_id,
                collaboration.mode,
                format_datetime(&collaboration.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_collaboration(&self, repo_id: i64, user_id: i64) -> Result<Option<Collaboration>> {
        self.conn
            .query_row(
                "SELECT repo_id, user_id, mode, created_at
                 FROM collaborations WHERE repo_id = ?1 AND user_id = ?2",
                params![repo_id, user_id],
                collaboration_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn delete_collaboration(&self, repo_id: i64, user_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM collaborations WHERE repo_id = ?1 AND user_id = ?2",
            params![repo_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_collaborations(&self, repo_id: i64) -> Result<Vec<Collaboration>> {
        let mut stmt = self.conn.prepare(
            "SELECT repo_id, user_id, mode, created_at
             FROM collaborations WHERE repo_id = ?1 ORDER BY user_id",
        )?;
        let rows = stmt.query_map(params![repo_id], collaboration_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Team operations

    fn create_team(&self, team: &Team) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO teams (id, org_id, name, lower_name, authorize, includes_all_repositories, can_create_org_repo)
             VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                team.id,
                team.org_id,
                team.name,
                team.name.to_lowercase(),
                team.access_mode,
                team.includes_all_repositories,
                team.can_create_org_repo,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_team(&self, team: &Team) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE teams SET name = ?1, lower_name = ?2, authorize = ?3,
                includes_all_repositories = ?4, can_create_org_repo = ?5
             WHERE id = ?6",
            params![
                team.name,
                team.name.to_lowercase(),
                team.access_mode,
                team.includes_all_repositories,
                team.can_create_org_repo,
                team.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(Entity::Team));
        }
        Ok(())
    }

    fn get_team(&self, id: i64) -> Result<Option<Team>> {
        self.conn
            .query_row(
                &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
                params![id],
                team_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_org_teams(&self, org_id: i64) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE org_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![org_id], team_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_teams_by_name(&self, name: &str) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE name = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![name], team_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_user_teams(&self, org_id: i64, user_id: i64) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.org_id, t.name, t.authorize, t.includes_all_repositories, t.can_create_org_repo
             FROM teams t
             JOIN team_users tu ON tu.team_id = t.id
             WHERE t.org_id = ?1 AND tu.uid = ?2
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![org_id, user_id], team_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Team membership and repository operations

    fn add_team_user(&self, org_id: i64, team_id: i64, user_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO team_users (org_id, team_id, uid) VALUES (?1, ?2, ?3)",
            params![org_id, team_id, user_id],
        )?;
        Ok(())
    }

    fn remove_team_user(&self, team_id: i64, user_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM team_users WHERE team_id = ?1 AND uid = ?2",
            params![team_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_team_user_ids(&self, team_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uid FROM team_users WHERE team_id = ?1 ORDER BY uid")?;
        let rows = stmt.query_map(params![team_id], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn add_team_repo(&self, org_id: i64, team_id: i64, repo_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO team_repos (org_id, team_id, repo_id) VALUES (?1, ?2, ?3)",
            params![org_id, team_id, repo_id],
        )?;
        Ok(())
    }

    fn remove_team_repo(&self, team_id: i64, repo_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM team_repos WHERE team_id = ?1 AND repo_id = ?2",
            params![team_id, repo_id],
        )?;
        Ok(rows > 0)
    }

    fn has_team_repo(&self, team_id: i64, repo_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM team_repos WHERE team_id = ?1 AND repo_id = ?2",
            params![team_id, repo_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Team unit operations

    fn list_team_units(&self, team_id: i64) -> Result<Vec<TeamUnit>> {
        let mut stmt = self.conn.prepare(
            "SELECT org_id, team_id, type, access_mode
             FROM team_units WHERE team_id = ?1 ORDER BY type",
        )?;
        let rows = stmt.query_map(params![team_id], |row| {
            Ok(TeamUnit {
                org_id: row.get(0)?,
                team_id: row.get(1)?,
                unit_type: row.get(2)?,
                access_mode: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn replace_team_units(&self, team_id: i64, units: &[TeamUnit]) -> Result<()> {
        self.atomically(|| {
            self.conn
                .execute("DELETE FROM team_units WHERE team_id = ?1", params![team_id])?;

            let mut stmt = self.conn.prepare(
                "INSERT INTO team_units (org_id, team_id, type, access_mode)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (team_id, type) DO UPDATE SET access_mode = excluded.access_mode",
            )?;
            for unit in units {
                stmt.execute(params![unit.org_id, team_id, unit.unit_type, unit.access_mode])?;
            }
            Ok(())
        })
    }

    fn update_team_unit_mode(
        &self,
        team_id: i64,
        unit_type: UnitType,
        mode: AccessMode,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE team_units SET access_mode = ?1 WHERE team_id = ?2 AND type = ?3",
            params![mode, team_id, unit_type],
        )?;
        Ok(rows > 0)
    }

    // Group operations

    fn create_group(&self, group: &Group) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO repo_groups (id, owner_id, parent_group_id, name, sort_order, created_at, updated_at)
             VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                group.id,
                group.owner_id,
                group.parent_group_id,
                group.name,
                group.sort_order,
                format_datetime(&group.created_at),
                format_datetime(&group.updated_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_group(&self, id: i64) -> Result<Option<Group>> {
        self.conn
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM repo_groups WHERE id = ?1"),
                params![id],
                group_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn update_group_placement(
        &self,
        id: i64,
        parent_group_id: i64,
        sort_order: i64,
    ) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE repo_groups SET parent_group_id = ?1, sort_order = ?2, updated_at = ?3
             WHERE id = ?4",
            params![
                parent_group_id,
                sort_order,
                format_datetime(&Utc::now()),
                id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(Entity::Group));
        }
        Ok(())
    }

    fn list_child_groups(&self, owner_id: i64, parent_group_id: i64) -> Result<Vec<Group>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM repo_groups
             WHERE owner_id = ?1 AND parent_group_id = ?2 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![owner_id, parent_group_id], group_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Group grant operations

    fn get_group_team(&self, group_id: i64, team_id: i64) -> Result<Option<GroupTeam>> {
        self.conn
            .query_row(
                "SELECT org_id, team_id, group_id, access_mode, can_create_in
                 FROM group_teams WHERE group_id = ?1 AND team_id = ?2",
                params![group_id, team_id],
                group_team_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_group_teams(&self, groups: &GroupCondition) -> Result<Vec<GroupTeam>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT org_id, team_id, group_id, access_mode, can_create_in
             FROM group_teams WHERE {} ORDER BY group_id, team_id",
            groups.sql("group_id")
        ))?;
        let rows = stmt.query_map([], group_team_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn upsert_group_team(&self, grant: &GroupTeam) -> Result<()> {
        self.conn.execute(
            "INSERT INTO group_teams (org_id, team_id, group_id, access_mode, can_create_in)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (group_id, team_id) DO UPDATE SET
                access_mode = excluded.access_mode,
                can_create_in = excluded.can_create_in",
            params![
                grant.org_id,
                grant.team_id,
                grant.group_id,
                grant.access_mode,
                grant.can_create_in,
            ],
        )?;
        Ok(())
    }

    fn max_group_team_mode(&self, team_id: i64, groups: &GroupCondition) -> Result<AccessMode> {
        let mode: Option<AccessMode> = self.conn.query_row(
            &format!(
                "SELECT MAX(access_mode) FROM group_teams WHERE team_id = ?1 AND {}",
                groups.sql("group_id")
            ),
            params![team_id],
            |row| row.get(0),
        )?;
        Ok(max_mode(mode))
    }

    fn get_group_unit(
        &self,
        group_id: i64,
        team_id: i64,
        unit_type: UnitType,
    ) -> Result<Option<GroupUnit>> {
        self.conn
            .query_row(
                "SELECT group_id, team_id, type, access_mode
                 FROM group_units WHERE group_id = ?1 AND team_id = ?2 AND type = ?3",
                params![group_id, team_id, unit_type],
                |row| {
                    Ok(GroupUnit {
                        group_id: row.get(0)?,
                        team_id: row.get(1)?,
                        unit_type: row.get(2)?,
                        access_mode: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Error::from)
    }

    fn upsert_group_unit(&self, unit: &GroupUnit) -> Result<()> {
        self.conn.execute(
            "INSERT INTO group_units (group_id, team_id, type, access_mode)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (group_id, team_id, type) DO UPDATE SET
                access_mode = excluded.access_mode",
            params![unit.group_id, unit.team_id, unit.unit_type, unit.access_mode],
        )?;
        Ok(())
    }

    fn max_group_unit_mode(
        &self,
        team_id: i64,
        groups: &GroupCondition,
        unit_type: UnitType,
    ) -> Result<AccessMode> {
        let mode: Option<AccessMode> = self.conn.query_row(
            &format!(
                "SELECT MAX(access_mode) FROM group_units
                 WHERE team_id = ?1 AND type = ?2 AND {}",
                groups.sql("group_id")
            ),
            params![team_id, unit_type],
            |row| row.get(0),
        )?;
        Ok(max_mode(mode))
    }

    // Access cache operations

    fn get_access_mode(&self, user_id: i64, repo_id: i64) -> Result<Option<AccessMode>> {
        self.conn
            .query_row(
                "SELECT mode FROM accesses WHERE user_id = ?1 AND repo_id = ?2",
                params![user_id, repo_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_repo_accesses(&self, repo_id: i64) -> Result<Vec<Access>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, repo_id, mode FROM accesses WHERE repo_id = ?1 ORDER BY user_id",
        )?;
        let rows = stmt.query_map(params![repo_id], |row| {
            Ok(Access {
                user_id: row.get(0)?,
                repo_id: row.get(1)?,
                mode: row.get(2)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn replace_repo_accesses(&self, repo_id: i64, accesses: &[Access]) -> Result<()> {
        self.atomically(|| {
            self.conn
                .execute("DELETE FROM accesses WHERE repo_id = ?1", params![repo_id])?;

            let mut stmt = self
                .conn
                .prepare("INSERT INTO accesses (user_id, repo_id, mode) VALUES (?1, ?2, ?3)")?;
            for access in accesses {
                stmt.execute(params![access.user_id, repo_id, access.mode])?;
            }
            Ok(())
        })
    }

    fn set_user_access(
        &self,
        user_id: i64,
        repo_id: i64,
        mode: Option<AccessMode>,
    ) -> Result<()> {
        match mode {
            Some(mode) if mode > AccessMode::None => {
                self.conn.execute(
                    "INSERT INTO accesses (user_id, repo_id, mode) VALUES (?1, ?2, ?3)
                     ON CONFLICT (user_id, repo_id) DO UPDATE SET mode = excluded.mode",
                    params![user_id, repo_id, mode],
                )?;
            }
            _ => {
                self.conn.execute(
                    "DELETE FROM accesses WHERE user_id = ?1 AND repo_id = ?2",
                    params![user_id, repo_id],
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn user(id: i64, name: &str, is_organization: bool) -> User {
        User {
            id,
            name: name.to_string(),
            is_admin: false,
            is_restricted: false,
            is_organization,
            visibility: Visibility::Public,
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "users",
            "repositories",
            "collaborations",
            "teams",
            "team_users",
            "team_repos",
            "team_units",
            "repo_groups",
            "group_teams",
            "group_units",
            "accesses",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_repository_loads_owner() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        store
            .transaction(|s| {
                s.create_user(&user(1, "acme", true))?;
                s.create_repository(&Repository {
                    id: 10,
                    name: "widgets".to_string(),
                    is_private: true,
                    group_id: 0,
                    owner: user(1, "acme", true),
                })
            })
            .unwrap();

        let repo = store.read(|s| s.require_repository(10)).unwrap();
        assert_eq!(repo.owner.name, "acme");
        assert!(repo.owner.is_organization);
        assert!(repo.is_private);
    }

    #[test]
    fn test_access_mode_out_of_range_rejected() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        store
            .transaction(|s| {
                s.create_user(&user(1, "alice", false))?;
                s.create_repository(&Repository {
                    id: 10,
                    name: "notes".to_string(),
                    is_private: false,
                    group_id: 0,
                    owner: user(1, "alice", false),
                })
            })
            .unwrap();

        let result = store.conn().execute(
            "INSERT INTO accesses (user_id, repo_id, mode) VALUES (1, 10, 5)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let result: Result<()> = store.transaction(|s| {
            s.create_user(&user(1, "alice", false))?;
            Err(Error::invalid("abort"))
        });
        assert!(result.is_err());

        let found = store.read(|s| s.get_user(1)).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_replace_repo_accesses() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        store
            .transaction(|s| {
                s.create_user(&user(1, "alice", false))?;
                s.create_user(&user(2, "bob", false))?;
                s.create_repository(&Repository {
                    id: 10,
                    name: "notes".to_string(),
                    is_private: true,
                    group_id: 0,
                    owner: user(1, "alice", false),
                })?;
                s.set_user_access(1, 10, Some(AccessMode::Read))
            })
            .unwrap();

        store
            .read(|s| {
                s.replace_repo_accesses(
                    10,
                    &[Access {
                        user_id: 2,
                        repo_id: 10,
                        mode: AccessMode::Write,
                    }],
                )
            })
            .unwrap();

        let rows = store.read(|s| s.list_repo_accesses(10)).unwrap();
        assert_eq!(
            rows,
            vec![Access {
                user_id: 2,
                repo_id: 10,
                mode: AccessMode::Write
            }]
        );
    }
}
