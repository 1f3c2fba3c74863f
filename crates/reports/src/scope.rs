//! What a report covers, and who may run it.

use std::fmt;

use canteen_core::{AdminId, BuildingId, Role, StallId, UserId};

use crate::error::ReportError;
use crate::session::Identity;

/// An outlet to fetch orders for, with its display name when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallRef {
    pub id: StallId,
    pub name: Option<String>,
}

impl StallRef {
    #[must_use]
    pub const fn new(id: StallId) -> Self {
        Self { id, name: None }
    }

    #[must_use]
    pub fn named(id: StallId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    /// Label used to tag this outlet's orders.
    #[must_use]
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Stall {}", self.id))
    }
}

/// The set of orders a report is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    /// A single outlet.
    Stall(StallRef),
    /// An explicit list of outlets.
    Stalls(Vec<StallRef>),
    /// Every outlet in a building.
    Building(BuildingId),
    /// Every outlet owned by a vendor admin account.
    AdminStalls(AdminId),
    /// Every order placed by a set of purchasers.
    Users(Vec<UserId>),
}

impl ReportScope {
    /// Short identifier used in export file names.
    #[must_use]
    pub fn slug(&self) -> String {
        match self {
            Self::Stall(stall) => format!("stall-{}", stall.id),
            Self::Stalls(stalls) => format!("stalls-{}", stalls.len()),
            Self::Building(id) => format!("building-{id}"),
            Self::AdminStalls(id) => format!("admin-{id}"),
            Self::Users(users) => match users.as_slice() {
                [single] => format!("user-{single}"),
                _ => format!("users-{}", users.len()),
            },
        }
    }
}

impl fmt::Display for ReportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stall(stall) => write!(f, "outlet {}", stall.label()),
            Self::Stalls(stalls) => write!(f, "{} outlets", stalls.len()),
            Self::Building(id) => write!(f, "building {id}"),
            Self::AdminStalls(id) => write!(f, "outlets of admin {id}"),
            Self::Users(users) => write!(f, "{} purchasers", users.len()),
        }
    }
}

/// Check that `identity` may run a report over `scope`.
///
/// - Admins see everything.
/// - Building and operational managers see outlets and their own building.
/// - HR sees purchaser reports and their own building.
/// - Vendors see outlets, and the outlet list of their own admin account.
///
/// # Errors
///
/// Returns [`ReportError::Forbidden`] when the role may not view the scope.
pub fn authorize(identity: &Identity, scope: &ReportScope) -> Result<(), ReportError> {
    let own_building = |id: &BuildingId| identity.building_id.as_ref() == Some(id);

    let allowed = match (identity.role, scope) {
        (Role::Admin, _) => true,
        (
            Role::BuildingManager | Role::OperationalManager | Role::Vendor,
            ReportScope::Stall(_) | ReportScope::Stalls(_),
        )
        | (Role::Hr, ReportScope::Users(_)) => true,
        (
            Role::BuildingManager | Role::OperationalManager | Role::Hr,
            ReportScope::Building(id),
        ) => own_building(id),
        (Role::Vendor, ReportScope::AdminStalls(id)) => identity.admin_id.as_ref() == Some(id),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(ReportError::Forbidden {
            role: identity.role,
            scope: scope.to_string(),
        })
    }
}
