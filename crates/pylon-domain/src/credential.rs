/// Bearer token proving this client has completed registration.
///
/// A credential is replaced wholesale on re-registration, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    provenance: Provenance,
}

/// Where the token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Issued by the registration endpoint during this run.
    Fresh,
    /// Loaded from durable storage at startup.
    Stored,
}

impl Credential {
    pub fn fresh(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            provenance: Provenance::Fresh,
        }
    }

    pub fn stored(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            provenance: Provenance::Stored,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn into_token(self) -> String {
        self.token
    }
}
