use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warrant::access::get_user_repo_permission;
use warrant::admin;
use warrant::config::Config;
use warrant::group::ancestor_chain;
use warrant::store::{SqliteStore, Store};
use warrant::types::UnitType;

#[derive(Parser)]
#[command(name = "warrant")]
#[command(about = "Repository access cache maintenance", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "warrant.toml")]
    config: PathBuf,

    /// Data directory holding the database (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and its schema
    Init,

    /// Rebuild access cache rows
    Recalculate {
        /// Repository to rebuild
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        repo: Option<i64>,

        /// Rebuild every repository
        #[arg(long)]
        all: bool,
    },

    /// Reset owner team rows that drifted from owner access
    RepairOwnerUnits,

    /// Print the resolved permission of a user on a repository as JSON
    Check {
        /// User to resolve for; omit for an anonymous visitor
        #[arg(long)]
        user: Option<i64>,

        /// Repository to resolve on
        #[arg(long)]
        repo: i64,

        /// Only print the mode for this unit (e.g., "code", "repo.wiki")
        #[arg(long)]
        unit: Option<String>,
    },

    /// Print the chain of groups from the root down to a group
    Ancestors {
        #[arg(long)]
        group: i64,
    },
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(
            "Database not found at {}. Run 'warrant init' first.",
            db_path.display()
        );
    }
    Ok(SqliteStore::new(&db_path)?)
}

fn run_check(
    store: &SqliteStore,
    user_id: Option<i64>,
    repo_id: i64,
    unit: Option<String>,
) -> anyhow::Result<()> {
    let unit_type = unit
        .map(|name| UnitType::parse(&name).with_context(|| format!("unknown unit '{name}'")))
        .transpose()?;

    let perm = store.read(|s| {
        let repo = s.require_repository(repo_id)?;
        let actor = user_id.map(|id| s.require_user(id)).transpose()?;
        get_user_repo_permission(s, actor.as_ref(), &repo)
    })?;

    let output = match unit_type {
        Some(unit_type) => serde_json::json!({
            "unit": unit_type.name(),
            "access_mode": perm.unit_access_mode(unit_type),
        }),
        None => serde_json::to_value(&perm)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let filter = match &config.log_filter {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::from_default_env().add_directive("warrant=info".parse()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => {
            fs::create_dir_all(&config.data_dir)?;
            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;
            info!("Initialized database at {}", config.db_path().display());
        }
        Commands::Recalculate { repo, all } => {
            let store = open_store(&config)?;
            if all {
                let count = admin::recalculate_all(&store)?;
                println!("Recalculated {count} repositories");
            } else if let Some(repo_id) = repo {
                admin::recalculate_repository(&store, repo_id)?;
                println!("Recalculated repository {repo_id}");
            }
        }
        Commands::RepairOwnerUnits => {
            let store = open_store(&config)?;
            let fixed = admin::repair_owner_teams(&store)?;
            println!("Fixed {fixed} owner team rows");
        }
        Commands::Check { user, repo, unit } => {
            let store = open_store(&config)?;
            run_check(&store, user, repo, unit)?;
        }
        Commands::Ancestors { group } => {
            let store = open_store(&config)?;
            let chain = store.read(|s| ancestor_chain(s, group))?;
            for g in chain {
                println!("{}\t{}", g.id, g.name);
            }
        }
    }

    Ok(())
}
