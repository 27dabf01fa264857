pub mod credential;
pub mod credential_service;
pub mod credential_store;
pub mod error;
pub mod event_sink;
pub mod file_credential_store;
pub mod forward_service;
pub mod message_handler;
pub mod registration;
pub mod registration_client;
pub mod transform;

pub use credential::{Credential, Provenance};
pub use credential_service::CredentialService;
pub use credential_store::CredentialStore;
pub use error::{DomainError, DomainResult};
pub use event_sink::{AcceptPolicy, EventSink, ForwardReceipt};
pub use file_credential_store::FileCredentialStore;
pub use forward_service::ForwardService;
pub use message_handler::MessageHandler;
pub use registration::{DeviceProperties, RegistrationRequest, RegistrationResponse};
pub use registration_client::RegistrationClient;
pub use transform::{normalize_datum, NormalizePolicy, TimestampMode};
