//! Sign-up, sign-in, session lookup and sign-out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use stockroom_auth::{
    hash_password, verify_password, Credentials, JwtClaims, Role, Session, TokenIssuer, UserAccount,
};
use stockroom_core::{SessionId, UserId};

use crate::error::ServiceError;
use crate::store::{AccountStore, StoreError};

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub session: Session,
    pub user: UserAccount,
}

/// A verified token whose session is still active.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub claims: JwtClaims,
    pub session: Session,
}

pub struct AccountService<S: ?Sized> {
    store: Arc<S>,
    issuer: TokenIssuer,
    default_roles: Vec<Role>,
}

impl<S: ?Sized> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            issuer: self.issuer.clone(),
            default_roles: self.default_roles.clone(),
        }
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthenticated("invalid email or password".to_string())
}

impl<S> AccountService<S>
where
    S: AccountStore + ?Sized,
{
    pub fn new(store: Arc<S>, issuer: TokenIssuer) -> Self {
        Self {
            store,
            issuer,
            default_roles: vec![Role::MEMBER],
        }
    }

    /// Roles granted to self-service sign-ups.
    pub fn with_default_roles(mut self, roles: Vec<Role>) -> Self {
        self.default_roles = roles;
        self
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    #[instrument(skip(self, credentials), err)]
    pub async fn sign_up(&self, credentials: Credentials) -> Result<UserAccount, ServiceError> {
        self.register(credentials, self.default_roles.clone()).await
    }

    /// Create an account with explicit roles (bootstrap admins, tests).
    #[instrument(skip(self, credentials), fields(roles = ?roles), err)]
    pub async fn register(
        &self,
        credentials: Credentials,
        roles: Vec<Role>,
    ) -> Result<UserAccount, ServiceError> {
        credentials.validate()?;
        let email = credentials.normalized_email();

        let account = UserAccount {
            id: UserId::new(),
            email,
            password_hash: hash_password(&credentials.password),
            roles,
            created_at: Utc::now(),
        };

        match self.store.insert_user(&account).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(ServiceError::Conflict(
                    "an account with this email already exists".to_string(),
                ));
            }
            Err(other) => return Err(other.into()),
        }

        info!(user_id = %account.id, "account created");
        Ok(account)
    }

    /// Check credentials, open a session and mint its access token.
    ///
    /// Unknown e-mail and wrong password fail identically.
    #[instrument(skip(self, credentials), err)]
    pub async fn sign_in(&self, credentials: Credentials) -> Result<SignedIn, ServiceError> {
        let email = credentials.normalized_email();
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            warn!("sign-in for unknown account");
            return Err(invalid_credentials());
        };
        if !verify_password(&credentials.password, &user.password_hash) {
            warn!(user_id = %user.id, "sign-in with wrong password");
            return Err(invalid_credentials());
        }

        let now = Utc::now();
        let session_id = SessionId::new();
        let claims = self
            .issuer
            .claims_for(user.id, session_id, &user.email, user.roles.clone(), now);
        let session = Session {
            id: session_id,
            user_id: user.id,
            created_at: now,
            expires_at: claims.expires_at(),
            revoked_at: None,
        };
        self.store.insert_session(&session).await?;

        let access_token = self
            .issuer
            .mint(&claims)
            .map_err(|e| ServiceError::Unauthenticated(e.to_string()))?;

        info!(user_id = %user.id, session_id = %session.id, "signed in");
        Ok(SignedIn {
            access_token,
            expires_at: session.expires_at,
            session,
            user,
        })
    }

    /// Verify a bearer token and confirm its session is still open.
    pub async fn authenticate(&self, token: &str) -> Result<Authenticated, ServiceError> {
        let now = Utc::now();
        let claims = self
            .issuer
            .verify(token, now)
            .map_err(|e| ServiceError::Unauthenticated(e.to_string()))?;

        let session = self
            .store
            .get_session(claims.sid)
            .await?
            .filter(|s| s.user_id == claims.sub)
            .ok_or_else(|| ServiceError::Unauthenticated("unknown session".to_string()))?;
        if !session.is_active(now) {
            return Err(ServiceError::Unauthenticated("session has ended".to_string()));
        }

        Ok(Authenticated { claims, session })
    }

    pub async fn user(&self, id: UserId) -> Result<UserAccount, ServiceError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))
    }

    #[instrument(skip(self), fields(session_id = %session_id), err)]
    pub async fn sign_out(&self, session_id: SessionId) -> Result<(), ServiceError> {
        self.store.revoke_session(session_id, Utc::now()).await?;
        info!("signed out");
        Ok(())
    }
}
