//! Salted PBKDF2-HMAC-SHA256 password digests.
//!
//! Encoded as `sha256$<iterations>$<salt-hex>$<digest-hex>` so the work factor
//! can be raised without invalidating stored hashes.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SCHEME: &str = "sha256";
const ITERATIONS: u32 = 10_000;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().into_bytes();
    let digest = derive(password.as_bytes(), &salt, ITERATIONS);
    format!(
        "{SCHEME}${ITERATIONS}${}${}",
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// Verify a password against an encoded hash. Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations @ 1..) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };

    let actual = derive(password.as_bytes(), &salt, iterations);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut digest = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut digest);
    digest
}
