use std::collections::HashSet;

use thiserror::Error;

use stockroom_core::UserId;

use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the API derives it
/// from verified token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// Build a principal whose permissions are the union of its roles' grants.
    pub fn from_roles(user_id: UserId, roles: Vec<Role>) -> Self {
        let mut seen = HashSet::new();
        let permissions = roles
            .iter()
            .flat_map(Role::permissions)
            .filter(|p| seen.insert(p.clone()))
            .collect();
        Self {
            user_id,
            roles,
            permissions,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Command-side authorization contract (checked at the command boundary).
///
/// Implement this on commands that require permissions.
/// The API layer enforces these requirements before executing.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

/// Authorize a principal for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_wildcard_grants_everything() {
        let p = Principal::from_roles(UserId::new(), vec![Role::ADMIN]);
        assert!(authorize(&p, &Permission::new("anything.at.all")).is_ok());
    }

    #[test]
    fn member_can_write_inventory() {
        let p = Principal::from_roles(UserId::new(), vec![Role::MEMBER]);
        assert!(authorize(&p, &Permission::INVENTORY_WRITE).is_ok());
    }

    #[test]
    fn viewer_is_forbidden_from_writes() {
        let p = Principal::from_roles(UserId::new(), vec![Role::VIEWER]);
        let err = authorize(&p, &Permission::CATALOG_WRITE).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("catalog.write".to_string()));
    }

    #[test]
    fn overlapping_roles_do_not_duplicate_permissions() {
        let p = Principal::from_roles(UserId::new(), vec![Role::MEMBER, Role::VIEWER]);
        assert_eq!(p.permissions.len(), 4);
    }
}
