mod access_mode;
mod models;
mod permission;
mod unit;

pub use access_mode::AccessMode;
pub use models::*;
pub use permission::Permission;
pub use unit::UnitType;
