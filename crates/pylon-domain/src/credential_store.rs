use async_trait::async_trait;

use crate::error::DomainResult;

/// Durable storage for the bearer credential.
/// Infrastructure implements this trait (e.g. a file on disk).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load a previously stored token. `Ok(None)` when nothing usable is
    /// stored, which is the normal first-run condition.
    async fn load(&self) -> DomainResult<Option<String>>;

    /// Overwrite the stored token with `token`.
    async fn store(&self, token: &str) -> DomainResult<()>;
}
