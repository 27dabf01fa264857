use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainResult;

/// Outcome of one delivery attempt against the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardReceipt {
    pub status: u16,
    pub body: Option<String>,
}

/// Which response statuses count as an accepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptPolicy {
    /// Only HTTP 204.
    NoContent,
    /// Any 2xx status.
    AnySuccess,
}

impl AcceptPolicy {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            AcceptPolicy::NoContent => status == 204,
            AcceptPolicy::AnySuccess => (200..300).contains(&status),
        }
    }
}

/// Delivery seam for normalized events.
/// Infrastructure implements this trait (e.g. an HTTP POST to the ingestion
/// API). Transport failures are errors; an HTTP response of any status is a
/// receipt for the caller to judge.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn forward(&self, payload: Vec<u8>) -> DomainResult<ForwardReceipt>;
}
