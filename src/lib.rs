//! # Warrant
//!
//! Resolves, caches and recomputes who may do what on repositories owned by
//! users or organizations, nested into groups, with teams granting scoped
//! access per unit.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use warrant::access::get_user_repo_permission;
//! use warrant::store::SqliteStore;
//! use warrant::types::UnitType;
//!
//! let db = SqliteStore::new("./data/warrant.db")?;
//! db.initialize()?;
//!
//! let perm = db.read(|store| {
//!     let repo = store.require_repository(42)?;
//!     let user = store.require_user(7)?;
//!     get_user_repo_permission(store, Some(&user), &repo)
//! })?;
//! assert!(perm.can_read(UnitType::Code));
//! ```
//!
//! Mutations that change who can reach a repository go through [`admin`],
//! which recomputes the access cache inside the same transaction.
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `warrant` maintenance binary.

pub mod access;
pub mod admin;
pub mod config;
pub mod error;
pub mod group;
pub mod store;
pub mod team;
pub mod types;
