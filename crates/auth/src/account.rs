//! User accounts and sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, SessionId, UserId};

use crate::Role;

pub const MIN_PASSWORD_LEN: usize = 6;

/// E-mail + password as submitted by the caller.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Lowercased, trimmed e-mail. Used as the account lookup key.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    /// Validate for sign-up.
    pub fn validate(&self) -> DomainResult<()> {
        let email = self.normalized_email();
        let valid_email = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        };
        if !valid_email {
            return Err(DomainError::invalid("email address is malformed"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::invalid(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

/// A session created by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn accepts_reasonable_credentials() {
        assert!(Credentials::new(" Ops@Example.com ", "secret1").validate().is_ok());
        assert_eq!(
            Credentials::new(" Ops@Example.com ", "x").normalized_email(),
            "ops@example.com"
        );
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["", "plain", "@example.com", "ops@", "a@b@c"] {
            assert!(Credentials::new(email, "secret1").validate().is_err(), "{email}");
        }
    }

    #[test]
    fn rejects_short_password() {
        let err = Credentials::new("a@b.io", "12345").validate().unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn debug_output_redacts_password() {
        let dbg = format!("{:?}", Credentials::new("a@b.io", "topsecret"));
        assert!(!dbg.contains("topsecret"));
    }

    #[test]
    fn revoked_or_expired_sessions_are_inactive() {
        let now = Utc::now();
        let mut s = Session {
            id: SessionId::new(),
            user_id: UserId::new(),
            created_at: now,
            expires_at: now + Duration::minutes(5),
            revoked_at: None,
        };
        assert!(s.is_active(now));
        assert!(!s.is_active(now + Duration::minutes(5)));
        s.revoked_at = Some(now);
        assert!(!s.is_active(now));
    }
}
