use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
///
/// Roles travel in tokens as opaque strings; `permissions()` is the single
/// place that maps them to grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Default role for self-service sign-ups.
    pub const MEMBER: Role = Role(Cow::Borrowed("member"));
    pub const VIEWER: Role = Role(Cow::Borrowed("viewer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Permissions granted by this role. Unknown roles grant nothing.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![Permission::WILDCARD],
            "member" => vec![
                Permission::CATALOG_READ,
                Permission::CATALOG_WRITE,
                Permission::INVENTORY_READ,
                Permission::INVENTORY_WRITE,
            ],
            "viewer" => vec![Permission::CATALOG_READ, Permission::INVENTORY_READ],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
