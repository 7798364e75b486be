//! Password hashing with bcrypt.
//!
//! Hashing and verification are CPU bound, so both run on tokio's blocking pool.

use bcrypt::{hash, verify};
use thiserror::Error;

pub use bcrypt::DEFAULT_COST;

/// Minimum length accepted for a login or a new password.
pub const MIN_PASSWORD_LENGTH: usize = 4;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("password task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || hash(password, cost)).await??;
    Ok(hashed)
}

/// Returns `Ok(false)` for a mismatch; `Err` only when the hash itself is unusable.
pub async fn verify_password(password: &str, hashed: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hashed = hashed.to_string();
    let matches = tokio::task::spawn_blocking(move || verify(password, &hashed)).await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt's minimum cost keeps these fast
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash_password("password123", TEST_COST).await.unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(verify_password("password123", &hashed).await.unwrap());
        assert!(!verify_password("Password123", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn salts_differ_between_hashes() {
        let first = hash_password("secret", TEST_COST).await.unwrap();
        let second = hash_password("secret", TEST_COST).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error() {
        assert!(verify_password("secret", "not-a-bcrypt-hash").await.is_err());
    }
}
