use stockroom_auth::{Principal, Role};
use stockroom_core::{SessionId, UserId};

/// Principal context for a request (authenticated identity + roles).
///
/// Inserted by the auth middleware once the token and its session check out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    session_id: SessionId,
    email: String,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, session_id: SessionId, email: String, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            session_id,
            email,
            roles,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn principal(&self) -> Principal {
        Principal::from_roles(self.user_id, self.roles.clone())
    }
}
