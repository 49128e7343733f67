//! API-side authorization guard for commands.
//!
//! This enforces authorization at the command boundary (before the service
//! call), while keeping the services themselves auth-agnostic.

use stockroom_auth::{authorize, AuthzError, CommandAuthorization};

use crate::context::PrincipalContext;

/// Check authorization for a command in the current request context.
///
/// This is intended to be called **before** invoking a service.
pub fn authorize_command<C: CommandAuthorization>(
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let principal = principal.principal();
    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }
    Ok(())
}
