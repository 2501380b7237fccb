//! # Principal & Authorization
//!
//! Caller identity and the access-policy table for engine operations.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Authorization Flow                                 │
//! │                                                                         │
//! │  HTTP layer        Engine boundary            Row predicate             │
//! │  ──────────        ───────────────            ─────────────             │
//! │  JWT → Principal → authorize(principal,  →    owner column / scoped     │
//! │                    access, owner)             WHERE clause              │
//! │                                                                         │
//! │  Every engine operation takes the Principal EXPLICITLY. There is no     │
//! │  ambient "current user": what an operation may touch is decided from    │
//! │  its arguments alone, which keeps the policy unit-testable.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

// =============================================================================
// Permission Names
// =============================================================================

/// Grants read access to contacts created by other users.
pub const PERM_CONTACT_READ_ALL: &str = "contact_read_all";

/// Grants update access to contacts created by other users.
pub const PERM_CONTACT_UPDATE_ALL: &str = "contact_update_all";

/// Every grantable permission name, for validation and listing.
pub const ALL_PERMISSIONS: [&str; 2] = [PERM_CONTACT_READ_ALL, PERM_CONTACT_UPDATE_ALL];

/// Checks that a permission name is one the system knows about.
pub fn validate_permission_name(name: &str) -> CoreResult<()> {
    if ALL_PERMISSIONS.contains(&name) {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "unknown permission: {name}"
        )))
    }
}

// =============================================================================
// Principal
// =============================================================================

/// The authenticated caller of an engine operation.
///
/// Built by the API layer from a verified token plus a permissions
/// lookup, then passed by value through every operation that needs an
/// authorization decision or an audit actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// The user's row ID; recorded as the audit actor.
    pub user_id: String,
    pub role: Role,
    /// Granted fine-grained permission names (admins bypass these).
    pub permissions: Vec<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role, permissions: Vec<String>) -> Self {
        Principal {
            user_id: user_id.into(),
            role,
            permissions,
        }
    }

    /// Admins bypass ownership checks and permission grants.
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == name)
    }
}

// =============================================================================
// Access Policy
// =============================================================================

/// The access rule an engine operation enforces at its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any authenticated caller.
    Any,
    /// Admin role required.
    AdminOnly,
    /// The row's creator, or any admin.
    OwnerOrAdmin,
    /// The row's creator, an admin, or a caller holding the named
    /// permission grant.
    OwnerOrPermission(&'static str),
}

/// Checks `principal` against an access rule for a row owned by
/// `owner_id` (`None` when the operation has no row yet, e.g. create).
pub fn authorize(principal: &Principal, access: Access, owner_id: Option<&str>) -> CoreResult<()> {
    let is_owner = owner_id.is_some_and(|o| o == principal.user_id);
    let allowed = match access {
        Access::Any => true,
        Access::AdminOnly => principal.is_admin(),
        Access::OwnerOrAdmin => principal.is_admin() || is_owner,
        Access::OwnerOrPermission(perm) => {
            principal.is_admin() || is_owner || principal.has_permission(perm)
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(CoreError::permission_denied(match access {
            Access::AdminOnly => "admin role required".to_string(),
            Access::OwnerOrAdmin => "only the record's creator or an admin may do this".to_string(),
            Access::OwnerOrPermission(perm) => {
                format!("requires ownership, admin role, or the '{perm}' permission")
            }
            Access::Any => unreachable!("Access::Any never denies"),
        }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Principal {
        Principal::new("admin-1", Role::Admin, vec![])
    }

    fn user(perms: &[&str]) -> Principal {
        Principal::new(
            "user-1",
            Role::User,
            perms.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn test_admin_bypasses_everything() {
        let p = admin();
        assert!(authorize(&p, Access::AdminOnly, None).is_ok());
        assert!(authorize(&p, Access::OwnerOrAdmin, Some("someone-else")).is_ok());
        assert!(p.has_permission(PERM_CONTACT_READ_ALL));
    }

    #[test]
    fn test_owner_check() {
        let p = user(&[]);
        assert!(authorize(&p, Access::OwnerOrAdmin, Some("user-1")).is_ok());
        assert!(matches!(
            authorize(&p, Access::OwnerOrAdmin, Some("user-2")),
            Err(CoreError::PermissionDenied(_))
        ));
        assert!(authorize(&p, Access::AdminOnly, None).is_err());
    }

    #[test]
    fn test_permission_grant_widens_access() {
        let denied = user(&[]);
        let granted = user(&[PERM_CONTACT_READ_ALL]);
        let access = Access::OwnerOrPermission(PERM_CONTACT_READ_ALL);

        assert!(authorize(&denied, access, Some("user-2")).is_err());
        assert!(authorize(&granted, access, Some("user-2")).is_ok());
        // A grant for one permission does not imply another.
        assert!(!granted.has_permission(PERM_CONTACT_UPDATE_ALL));
    }

    #[test]
    fn test_permission_name_validation() {
        assert!(validate_permission_name(PERM_CONTACT_UPDATE_ALL).is_ok());
        assert!(validate_permission_name("launch_missiles").is_err());
    }

    /// The listing catalog and the grant validator must stay in sync:
    /// every listed name is grantable.
    #[test]
    fn test_listed_permissions_are_all_grantable() {
        for name in ALL_PERMISSIONS {
            assert!(validate_permission_name(name).is_ok());
        }
    }
}
