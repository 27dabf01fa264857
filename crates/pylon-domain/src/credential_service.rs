use std::sync::Arc;

use tracing::{info, warn};

use crate::credential::Credential;
use crate::credential_store::CredentialStore;
use crate::error::DomainResult;
use crate::registration::{DeviceProperties, RegistrationRequest};
use crate::registration_client::RegistrationClient;

/// Guarantees a usable bearer credential at startup.
///
/// Reuses the stored token when one exists; registers when forced or when
/// nothing usable is stored, then persists the fresh token. A persist
/// failure leaves the credential usable for the current process lifetime.
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    registration_client: Arc<dyn RegistrationClient>,
    api_key: String,
}

impl CredentialService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        registration_client: Arc<dyn RegistrationClient>,
        api_key: String,
    ) -> Self {
        Self {
            store,
            registration_client,
            api_key,
        }
    }

    pub async fn acquire(&self, force_register: bool) -> DomainResult<Credential> {
        if force_register {
            info!("forced registration requested, ignoring any stored credential");
        } else {
            match self.store.load().await {
                Ok(Some(token)) => {
                    info!("using stored credential");
                    return Ok(Credential::stored(token));
                }
                Ok(None) => {
                    info!("no stored credential found, registering");
                }
                Err(e) => {
                    warn!(error = %e, "stored credential unreadable, registering");
                }
            }
        }

        let request = RegistrationRequest::new(self.api_key.clone(), DeviceProperties::current());
        let response = self.registration_client.register(&request).await?;
        let credential = Credential::fresh(response.token);

        if let Err(e) = self.store.store(credential.token()).await {
            warn!(error = %e, "failed to persist credential, it will not survive a restart");
        }

        Ok(credential)
    }
}
