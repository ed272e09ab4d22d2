//! Argon2id hashing for stored account credentials.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{BackendError, StoreError, StoreResult};

fn internal(context: &'static str) -> impl FnOnce(password_hash::Error) -> StoreError {
    move |e| {
        error!(error = %e, context, "argon2 failure");
        BackendError::new("auth/internal-error", e.to_string()).into()
    }
}

/// PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(internal("hash"))
}

/// `Ok(false)` on a mismatch; errors only when the stored hash is unusable.
pub fn verify_password(plain: &str, stored: &str) -> StoreResult<bool> {
    let parsed = PasswordHash::new(stored).map_err(internal("parse stored hash"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(internal("verify")(e)),
    }
}

#[cfg(test)]
mod password_tests {
    use super::*;

    #[test]
    fn hashes_are_salted_argon2id() {
        let a = hash_password("secret1").unwrap();
        let b = hash_password("secret1").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(verify_password("secret1", &a).unwrap());
        assert!(verify_password("secret1", &b).unwrap());
        assert!(!verify_password("secret2", &a).unwrap());
    }

    #[test]
    fn unreadable_hash_is_an_internal_error() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert_eq!(err.code(), Some("auth/internal-error"));
    }
}
