use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AccessMode, UnitType};

/// Permission is the resolved access of one actor on one repository.
///
/// `units_mode` is only present for organization repositories whose access
/// was not short-circuited by an admin team. When absent, every unit
/// resolves to the coarse mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permission {
    pub access_mode: AccessMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_mode: Option<BTreeMap<UnitType, AccessMode>>,
}

impl Permission {
    #[must_use]
    pub const fn coarse(access_mode: AccessMode) -> Self {
        Self {
            access_mode,
            units_mode: None,
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self::coarse(AccessMode::None)
    }

    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.access_mode >= AccessMode::Owner
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.access_mode >= AccessMode::Admin
    }

    #[must_use]
    pub fn has_access(&self) -> bool {
        self.access_mode >= AccessMode::Read
            || self
                .units_mode
                .as_ref()
                .is_some_and(|units| units.values().any(|m| *m >= AccessMode::Read))
    }

    /// Returns the mode for one unit. Units missing from a present map resolve to None.
    #[must_use]
    pub fn unit_access_mode(&self, unit_type: UnitType) -> AccessMode {
        match &self.units_mode {
            Some(units) if !self.is_admin() => {
                units.get(&unit_type).copied().unwrap_or(AccessMode::None)
            }
            _ => self.access_mode,
        }
    }

    #[must_use]
    pub fn can_access(&self, mode: AccessMode, unit_type: UnitType) -> bool {
        self.unit_access_mode(unit_type) >= mode
    }

    #[must_use]
    pub fn can_read(&self, unit_type: UnitType) -> bool {
        self.can_access(AccessMode::Read, unit_type)
    }

    #[must_use]
    pub fn can_write(&self, unit_type: UnitType) -> bool {
        self.can_access(AccessMode::Write, unit_type)
    }

    #[must_use]
    pub fn can_read_any(&self, unit_types: &[UnitType]) -> bool {
        unit_types.iter().any(|u| self.can_read(*u))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.access_mode)?;
        if let Some(units) = &self.units_mode {
            let parts: Vec<String> = units.iter().map(|(u, m)| format!("{u}={m}")).collect();
            write!(f, " [{}]", parts.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coarse_permission_applies_to_every_unit() {
        let perm = Permission::coarse(AccessMode::Write);
        assert!(perm.can_write(UnitType::Code));
        assert!(perm.can_write(UnitType::Wiki));
        assert!(!perm.is_admin());
    }

    #[test]
    fn test_missing_unit_resolves_to_none() {
        let perm = Permission {
            access_mode: AccessMode::Read,
            units_mode: Some(BTreeMap::from([(UnitType::Issues, AccessMode::Write)])),
        };
        assert_eq!(perm.unit_access_mode(UnitType::Issues), AccessMode::Write);
        assert_eq!(perm.unit_access_mode(UnitType::Code), AccessMode::None);
        assert!(perm.can_read_any(&[UnitType::Code, UnitType::Issues]));
        assert!(perm.has_access());
    }

    #[test]
    fn test_display() {
        let perm = Permission {
            access_mode: AccessMode::Read,
            units_mode: Some(BTreeMap::from([(UnitType::Code, AccessMode::Read)])),
        };
        assert_eq!(perm.to_string(), "read [repo.code=read]");
    }
}
