use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::credential_store::CredentialStore;
use crate::error::DomainResult;

/// Credential storage backed by a single file holding the token verbatim.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> DomainResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(token) if token.is_empty() => Ok(None),
            Ok(token) => {
                debug!(path = %self.path.display(), "read stored credential");
                Ok(Some(token))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!(
                    "failed to read credential file {}",
                    self.path.display()
                ))
                .into()),
        }
    }

    async fn store(&self, token: &str) -> DomainResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("failed to create credential directory {}", parent.display())
                })?;
            }
        }

        tokio::fs::write(&self.path, token).await.with_context(|| {
            format!("failed to write credential file {}", self.path.display())
        })?;

        debug!(path = %self.path.display(), "stored credential");
        Ok(())
    }
}
