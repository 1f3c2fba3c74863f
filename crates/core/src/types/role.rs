//! Operator roles for the canteen admin surface.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}. Valid roles: admin, building_manager, hr, operational_manager, vendor")]
pub struct RoleParseError(pub String);

/// Operator role with different report permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator with access to every building and outlet.
    Admin,
    /// Manages the outlets of one building.
    BuildingManager,
    /// Tops up wallets and reviews employee spending.
    Hr,
    /// Oversees day-to-day outlet operations for a building.
    OperationalManager,
    /// Runs one or more outlets.
    Vendor,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Self; 5] = [
        Self::Admin,
        Self::BuildingManager,
        Self::Hr,
        Self::OperationalManager,
        Self::Vendor,
    ];

    /// Stable string form used in sessions and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::BuildingManager => "building_manager",
            Self::Hr => "hr",
            Self::OperationalManager => "operational_manager",
            Self::Vendor => "vendor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RoleParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert_eq!(
            "owner".parse::<Role>(),
            Err(RoleParseError("owner".to_owned()))
        );
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::BuildingManager).unwrap();
        assert_eq!(json, "\"building_manager\"");
    }
}
