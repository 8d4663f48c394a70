//! Credential verification (bcrypt).
//!
//! Plaintext passwords and stored hashes never leave this module through logs
//! or error values. bcrypt is CPU bound, so the async entry points run it on
//! the blocking pool.

use std::sync::Arc;

use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct PasswordService {
    cost: u32,
    // Verified against when the identity does not exist, so both failure paths cost the same.
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for PasswordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordService")
            .field("cost", &self.cost)
            .finish()
    }
}

impl PasswordService {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let dummy_hash = bcrypt::hash("logitrack-dummy-password", cost)?;
        Ok(Self {
            cost,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub fn hash_blocking(&self, plain: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(plain, self.cost)?)
    }

    /// Compute a salted hash for a new password.
    pub async fn hash(&self, plain: String) -> Result<String, PasswordError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.hash_blocking(&plain)).await?
    }

    /// `true` only if `plain` matches `stored`.
    ///
    /// A malformed stored hash counts as a mismatch.
    pub fn verify_blocking(plain: &str, stored: &str) -> bool {
        bcrypt::verify(plain, stored).unwrap_or(false)
    }

    /// Verify `plain` against `stored`, or against the dummy hash when there is no
    /// stored hash (unknown identity). The dummy path always returns `false`.
    pub async fn verify(&self, plain: String, stored: Option<String>) -> bool {
        let (target, known) = match stored {
            Some(hash) => (hash, true),
            None => (self.dummy_hash.to_string(), false),
        };

        match tokio::task::spawn_blocking(move || Self::verify_blocking(&plain, &target)).await {
            Ok(matched) => known && matched,
            Err(e) => {
                error!(error = %e, "password verification task failed");
                false
            }
        }
    }
}
