//! Argon2 password hashing with a server-side pepper.

use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AppError;

/// Longest password accepted when setting one.
pub const MAX_PASSWORD_LEN: usize = 72;

pub fn validate_password_length(password: &str) -> Result<(), AppError> {
    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::PasswordTooLong);
    }
    Ok(())
}

pub fn hash_password(password: &str, pepper: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let peppered = format!("{pepper}{password}");
    Argon2::default()
        .hash_password(peppered.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow!("hashing password: {e}")))
}

/// False for a wrong password as well as for an unreadable stored hash.
pub fn verify_password(password: &str, pepper: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        log::warn!("stored password hash could not be parsed");
        return false;
    };
    let peppered = format!("{pepper}{password}");
    Argon2::default()
        .verify_password(peppered.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("gamalabs#demo", "pepper").unwrap();
        assert!(verify_password("gamalabs#demo", "pepper", &hash));
        assert!(!verify_password("gamalabs#demo", "other-pepper", &hash));
        assert!(!verify_password("wrong", "pepper", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("x", "pepper", "not-a-hash"));
    }

    #[test]
    fn length_limit_is_72_chars() {
        assert!(validate_password_length(&"a".repeat(72)).is_ok());
        assert!(matches!(
            validate_password_length(&"a".repeat(73)),
            Err(AppError::PasswordTooLong)
        ));
    }
}
