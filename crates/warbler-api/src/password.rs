//! Thin adapter over the password-hashing primitive. The rest of the
//! crate treats digests as opaque strings.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(argon2::password_hash::Error);

/// Hash a plaintext password with Argon2id, returning a PHC-format
/// digest string (salt included).
pub fn hash(plaintext: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(HashError)?
        .to_string();
    Ok(digest)
}

/// Check a plaintext password against a stored digest. A malformed
/// digest counts as a failed verification, not an error.
pub fn verify(digest: &str, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verify_roundtrip() {
        let digest = hash("password").unwrap();
        assert_ne!(digest, "password");
        assert!(verify(&digest, "password"));
        assert!(!verify(&digest, "wrong_password"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash("password").unwrap();
        let b = hash("password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digest_fails_closed() {
        assert!(!verify("not-a-phc-string", "password"));
        assert!(!verify("", "password"));
    }
}
