//! Authentication and authorization primitives.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! validate credentials, hash passwords, mint/verify tokens, and make RBAC
//! decisions, but not where accounts live.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod roles;

pub use account::{Credentials, Session, UserAccount, MIN_PASSWORD_LEN};
pub use authorize::{authorize, AuthzError, CommandAuthorization, Principal};
pub use claims::{validate_claims, JwtClaims, TokenError, TokenIssuer, TokenValidationError};
pub use password::{hash_password, verify_password};
pub use permissions::Permission;
pub use roles::Role;
