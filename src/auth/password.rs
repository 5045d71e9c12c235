//! Password hashing and verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::AlertDeskError;

/// Argon2id with the RFC 9106 low-memory recommendation (19 MiB, 2 passes).
fn argon2() -> Result<Argon2<'static>, AlertDeskError> {
    let params = Params::new(19456, 2, 1, None)
        .map_err(|e| AlertDeskError::HashError(format!("create argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with a fresh random salt. The result is a PHC string that
/// carries its own salt and parameters.
pub fn hash_password(password: &str) -> Result<String, AlertDeskError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AlertDeskError::HashError(format!("hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AlertDeskError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AlertDeskError::HashError(format!("parse hash: {}", e)))?;

    // Verification uses the parameters embedded in the hash
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let hash1 = hash_password("password1").unwrap();
        let hash2 = hash_password("password1").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("password1", &hash1).unwrap());
        assert!(verify_password("password1", &hash2).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AlertDeskError::HashError(_))
        ));
    }
}
