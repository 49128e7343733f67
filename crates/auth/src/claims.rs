use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::{SessionId, UserId};

use crate::Role;

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the authenticated user.
    pub sub: UserId,

    /// Session the token was issued for (revoked on sign-out).
    pub sid: SessionId,

    pub email: String,

    /// RBAC roles granted to the user.
    pub roles: Vec<Role>,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,
}

impl JwtClaims {
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of a set of claims.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token rejected: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// HS256 token minting and verification.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Build claims for a new session starting at `now`.
    pub fn claims_for(
        &self,
        user_id: UserId,
        session_id: SessionId,
        email: &str,
        roles: Vec<Role>,
        now: DateTime<Utc>,
    ) -> JwtClaims {
        JwtClaims {
            sub: user_id,
            sid: session_id,
            email: email.to_string(),
            roles,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        }
    }

    pub fn mint(&self, claims: &JwtClaims) -> Result<String, TokenError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Verify signature and time window.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The time window is checked by `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<JwtClaims>(token, &self.decoding, &validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret", Duration::minutes(10))
    }

    #[test]
    fn minted_token_verifies() {
        let now = Utc::now();
        let issuer = issuer();
        let claims = issuer.claims_for(UserId::new(), SessionId::new(), "a@b.io", vec![Role::MEMBER], now);
        let token = issuer.mint(&claims).unwrap();
        let verified = issuer.verify(&token, now).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let issuer = issuer();
        let claims = issuer.claims_for(UserId::new(), SessionId::new(), "a@b.io", vec![], now);
        let token = issuer.mint(&claims).unwrap();
        let err = issuer.verify(&token, now + Duration::minutes(11)).unwrap_err();
        assert!(matches!(err, TokenError::Claims(TokenValidationError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let now = Utc::now();
        let other = TokenIssuer::new(b"other-secret", Duration::minutes(10));
        let claims = other.claims_for(UserId::new(), SessionId::new(), "a@b.io", vec![], now);
        let token = other.mint(&claims).unwrap();
        assert!(matches!(issuer().verify(&token, now), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn inverted_window_is_invalid() {
        let now = Utc::now();
        let mut claims = issuer().claims_for(UserId::new(), SessionId::new(), "a@b.io", vec![], now);
        claims.exp = claims.iat;
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::InvalidTimeWindow));
    }
}
