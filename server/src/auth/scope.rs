//! Permission checks against a verified claim set.

use super::jwt::ClaimSet;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The token has no `permissions` claim at all.
    PermissionsClaimMissing,
    /// The `permissions` claim does not include the required permission.
    PermissionNotGranted,
}

impl DenyReason {
    /// Stable machine-readable identifier for this denial.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PermissionsClaimMissing => "permissions_missing",
            Self::PermissionNotGranted => "permission_not_granted",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionsClaimMissing => write!(f, "permissions not included in token"),
            Self::PermissionNotGranted => write!(f, "permission not granted"),
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Decide whether `claims` grant `required_permission`.
#[must_use]
pub fn authorize(claims: &ClaimSet, required_permission: &str) -> Decision {
    let Some(permissions) = &claims.permissions else {
        return Decision::Deny(DenyReason::PermissionsClaimMissing);
    };

    if permissions.contains(required_permission) {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::PermissionNotGranted)
    }
}
