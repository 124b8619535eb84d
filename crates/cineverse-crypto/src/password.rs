//! Password hashing.
//!
//! Two schemes coexist in stored data:
//! - Legacy: unsalted SHA-256 hex digest of the trimmed password. Kept for
//!   compatibility with existing user tables; new deployments should prefer
//!   the adaptive scheme.
//! - Adaptive: Argon2id with a per-password random salt, stored in PHC
//!   string format (`$argon2id$...`).
//!
//! `verify_password` dispatches on the stored digest's format, so the two
//! schemes can be mixed within one users table and migrated lazily.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sha2::{Digest, Sha256};

use crate::constant_time_eq;

/// PHC-format prefix identifying an Argon2 digest.
const ARGON2_PREFIX: &str = "$argon2";

#[derive(Debug, Clone, thiserror::Error)]
pub enum PasswordHashError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Legacy digest: SHA-256 over the UTF-8, whitespace-trimmed password.
/// Deterministic, same input always yields the same output.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Adaptive digest: Argon2id with a freshly generated salt.
pub fn hash_password_adaptive(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(password.trim().as_bytes(), &salt)
        .map_err(|e| PasswordHashError::Hash(e.to_string()))?;
    Ok(digest.to_string())
}

/// Check a password attempt against a stored digest of either scheme.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with(ARGON2_PREFIX) {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        return Argon2::default()
            .verify_password(password.trim().as_bytes(), &parsed)
            .is_ok();
    }
    constant_time_eq(hash_password(password).as_bytes(), stored.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_hash_is_deterministic() {
        let h1 = hash_password("secret");
        let h2 = hash_password("secret");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64); // SHA-256 = 32 bytes = 64 hex chars
    }

    #[test]
    fn legacy_hash_trims_whitespace() {
        assert_eq!(hash_password("  secret  "), hash_password("secret"));
    }

    #[test]
    fn legacy_verify_roundtrip() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn adaptive_verify_roundtrip() {
        let stored = hash_password_adaptive("battery staple").unwrap();
        assert!(stored.starts_with("$argon2"));
        assert!(verify_password("battery staple", &stored));
        assert!(!verify_password("battery stable", &stored));
    }

    #[test]
    fn adaptive_hashes_are_salted() {
        let h1 = hash_password_adaptive("same password").unwrap();
        let h2 = hash_password_adaptive("same password").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn malformed_argon2_digest_fails_closed() {
        assert!(!verify_password("anything", "$argon2id$not-a-real-digest"));
    }

    #[test]
    fn empty_stored_digest_never_verifies() {
        assert!(!verify_password("anything", ""));
    }
}
