use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Registration rejected with status {status}: {body}")]
    RegistrationRejected { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Field already present in payload: {0}")]
    FieldCollision(String),

    #[error("Transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
