//! Password hashing using argon2
//!
//! Hashing and verification are CPU bound; the `_async` variants move the
//! work to the blocking pool.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Password hashing service (Argon2id, default parameters)
pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
    }

    /// `Ok(false)` on mismatch; `Err` only for a malformed stored hash
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub async fn hash_async(password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash(&password))
            .await
            .context("Password hashing task failed")?
    }

    /// Verify against an optional stored hash
    ///
    /// Social accounts have no password; they never match.
    pub async fn verify_async(password: String, hash: Option<String>) -> Result<bool> {
        let Some(hash) = hash else {
            return Ok(false);
        };
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .context("Password verification task failed")?
    }
}
