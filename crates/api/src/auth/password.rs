//! Argon2id password hashing and supervisor credential verification.
//!
//! Hashes are stored in PHC string format, so the algorithm parameters and
//! salt travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use inspecta_core::error::CoreError;
use inspecta_core::service::CredentialVerifier;

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted Argon2id hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only for a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// [`CredentialVerifier`] over Argon2id hashes from the users table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2CredentialVerifier;

impl CredentialVerifier for Argon2CredentialVerifier {
    fn verify(&self, credential: &str, secret_hash: &str) -> Result<bool, CoreError> {
        verify_password(credential, secret_hash).map_err(|e| {
            tracing::error!(error = %e, "Stored credential hash is malformed");
            CoreError::Internal("Stored credential hash is malformed".into())
        })
    }
}
