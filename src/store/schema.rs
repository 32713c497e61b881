pub const SCHEMA: &str = r#"
-- Users and organizations share one table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    is_admin INTEGER NOT NULL DEFAULT 0,
    is_restricted INTEGER NOT NULL DEFAULT 0,
    is_organization INTEGER NOT NULL DEFAULT 0,
    visibility INTEGER NOT NULL DEFAULT 0 CHECK (visibility BETWEEN 0 AND 2)
);

-- Nested groups; parent_group_id = 0 marks a root
CREATE TABLE IF NOT EXISTS repo_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    parent_group_id INTEGER NOT NULL DEFAULT 0,
    name TEXT NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    is_private INTEGER NOT NULL DEFAULT 0,
    group_id INTEGER NOT NULL DEFAULT 0,

    UNIQUE(owner_id, name)
);

-- Direct collaborators of a repository
CREATE TABLE IF NOT EXISTS collaborations (
    repo_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    mode INTEGER NOT NULL CHECK (mode BETWEEN 0 AND 4),
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (repo_id, user_id)
);

CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    org_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    lower_name TEXT NOT NULL,
    authorize INTEGER NOT NULL DEFAULT 0 CHECK (authorize BETWEEN 0 AND 4),
    includes_all_repositories INTEGER NOT NULL DEFAULT 0,
    can_create_org_repo INTEGER NOT NULL DEFAULT 0,

    UNIQUE(org_id, lower_name)
);

CREATE TABLE IF NOT EXISTS team_users (
    org_id INTEGER NOT NULL,
    team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    uid INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (team_id, uid)
);

CREATE TABLE IF NOT EXISTS team_repos (
    org_id INTEGER NOT NULL,
    team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    repo_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    PRIMARY KEY (team_id, repo_id)
);

-- Per-unit grants of a team across its organization
CREATE TABLE IF NOT EXISTS team_units (
    org_id INTEGER NOT NULL,
    team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    type INTEGER NOT NULL,
    access_mode INTEGER NOT NULL CHECK (access_mode BETWEEN 0 AND 4),
    PRIMARY KEY (team_id, type)
);

-- A team's grant on one group
CREATE TABLE IF NOT EXISTS group_teams (
    org_id INTEGER NOT NULL,
    team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    group_id INTEGER NOT NULL REFERENCES repo_groups(id) ON DELETE CASCADE,
    access_mode INTEGER NOT NULL CHECK (access_mode BETWEEN 0 AND 4),
    can_create_in INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (group_id, team_id)
);

-- Per-unit grants of a team on one group
CREATE TABLE IF NOT EXISTS group_units (
    group_id INTEGER NOT NULL REFERENCES repo_groups(id) ON DELETE CASCADE,
    team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    type INTEGER NOT NULL,
    access_mode INTEGER NOT NULL CHECK (access_mode BETWEEN 0 AND 4),
    PRIMARY KEY (group_id, team_id, type)
);

-- Access cache: highest mode per (user, repository); absence means none
CREATE TABLE IF NOT EXISTS accesses (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    repo_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    mode INTEGER NOT NULL CHECK (mode BETWEEN 1 AND 4),
    PRIMARY KEY (user_id, repo_id)
);

CREATE INDEX IF NOT EXISTS idx_repositories_owner ON repositories(owner_id);
CREATE INDEX IF NOT EXISTS idx_repositories_group ON repositories(group_id);
CREATE INDEX IF NOT EXISTS idx_repo_groups_parent ON repo_groups(owner_id, parent_group_id);
CREATE INDEX IF NOT EXISTS idx_teams_org ON teams(org_id);
CREATE INDEX IF NOT EXISTS idx_team_users_org_uid ON team_users(org_id, uid);
CREATE INDEX IF NOT EXISTS idx_team_repos_repo ON team_repos(repo_id);
CREATE INDEX IF NOT EXISTS idx_group_teams_team ON group_teams(team_id);
CREATE INDEX IF NOT EXISTS idx_accesses_repo ON accesses(repo_id);
"#;
