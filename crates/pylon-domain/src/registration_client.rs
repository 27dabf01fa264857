use async_trait::async_trait;

use crate::error::DomainResult;
use crate::registration::{RegistrationRequest, RegistrationResponse};

/// Client for the one-time registration handshake that exchanges an API key
/// for a bearer token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationClient: Send + Sync {
    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> DomainResult<RegistrationResponse>;
}
