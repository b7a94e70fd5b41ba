//! Password hashing (Argon2id)

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::OnceLock;

use crate::error::AuthError;

/// Hash verified when the account does not exist, so a lookup miss costs
/// the same as a password mismatch
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Hash a password with a fresh random salt
///
/// The result is a PHC string carrying the algorithm, parameters and salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored hash
///
/// Returns `Ok(false)` on mismatch; errors only when the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHash(e.to_string())),
    }
}

/// Verify a password against an optional stored hash
///
/// With no stored hash a throw-away verification still runs and the result
/// is always `Ok(false)`.
pub fn verify_password_or_burn(password: &str, hash: Option<&str>) -> Result<bool, AuthError> {
    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            let dummy = DUMMY_HASH.get_or_init(|| hash_password("parlor-timing-equalizer").ok());
            if let Some(dummy) = dummy {
                let _ = verify_password(password, dummy);
            }
            Ok(false)
        }
    }
}
