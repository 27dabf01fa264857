use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::event_sink::{AcceptPolicy, EventSink};
use crate::message_handler::MessageHandler;
use crate::transform::{normalize_datum, NormalizePolicy};

/// Normalizes each inbound message and delivers it once to the event sink.
///
/// Failures never leave this service: a normalization error falls back to
/// the original payload, a rejected or failed delivery is logged and
/// dropped. Nothing is retried or requeued.
pub struct ForwardService {
    sink: Arc<dyn EventSink>,
    policy: NormalizePolicy,
    accept: AcceptPolicy,
}

impl ForwardService {
    pub fn new(sink: Arc<dyn EventSink>, policy: NormalizePolicy, accept: AcceptPolicy) -> Self {
        Self {
            sink,
            policy,
            accept,
        }
    }
}

#[async_trait]
impl MessageHandler for ForwardService {
    async fn handle(&self, topic: &str, payload: &[u8]) {
        let start = Instant::now();

        let event = match normalize_datum(payload, &self.policy) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    topic = %topic,
                    error = %e,
                    "payload normalization failed, forwarding original payload"
                );
                payload.to_vec()
            }
        };

        match self.sink.forward(event.clone()).await {
            Ok(receipt) if self.accept.accepts(receipt.status) => {
                info!(
                    topic = %topic,
                    status = receipt.status,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "event forwarded"
                );
            }
            Ok(receipt) => {
                warn!(
                    topic = %topic,
                    status = receipt.status,
                    duration_ms = start.elapsed().as_millis() as u64,
                    payload = %String::from_utf8_lossy(&event),
                    response = receipt.body.as_deref().unwrap_or(""),
                    "ingestion endpoint did not accept event"
                );
            }
            Err(e) => {
                error!(
                    topic = %topic,
                    duration_ms = start.elapsed().as_millis() as u64,
                    payload = %String::from_utf8_lossy(&event),
                    error = %e,
                    "failed to forward event"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::event_sink::{ForwardReceipt, MockEventSink};
    use crate::transform::TimestampMode;
    use serde_json::Value;

    fn raw_policy() -> NormalizePolicy {
        NormalizePolicy {
            timestamp_mode: TimestampMode::Raw,
            timestamp_field: "timestamp".to_string(),
            value_field: "value".to_string(),
        }
    }

    fn accepted() -> ForwardReceipt {
        ForwardReceipt {
            status: 204,
            body: None,
        }
    }

    #[tokio::test]
    async fn forwards_the_normalized_payload() {
        let mut sink = MockEventSink::new();
        sink.expect_forward()
            .withf(|payload: &Vec<u8>| {
                let parsed: Value = serde_json::from_slice(payload).unwrap();
                parsed["timestamp"] == 1000 && parsed["value"] == 42.5
            })
            .times(1)
            .returning(|_| Ok(accepted()));

        let service = ForwardService::new(Arc::new(sink), raw_policy(), AcceptPolicy::NoContent);

        service
            .handle("sensors/raw", br#"{"datum":[1000,42.5]}"#)
            .await;
    }

    #[tokio::test]
    async fn forwards_the_original_payload_when_normalization_fails() {
        let payload = br#"{"datum":[1000,42.5],"value":9}"#;

        let mut sink = MockEventSink::new();
        sink.expect_forward()
            .withf(move |forwarded: &Vec<u8>| forwarded == payload)
            .times(1)
            .returning(|_| Ok(accepted()));

        let service = ForwardService::new(Arc::new(sink), raw_policy(), AcceptPolicy::NoContent);

        service.handle("sensors/raw", payload).await;
    }

    #[tokio::test]
    async fn rejected_status_is_contained() {
        let mut sink = MockEventSink::new();
        sink.expect_forward().times(1).returning(|_| {
            Ok(ForwardReceipt {
                status: 500,
                body: Some("boom".to_string()),
            })
        });

        let service = ForwardService::new(Arc::new(sink), raw_policy(), AcceptPolicy::NoContent);

        // Must not panic or retry; the failure stays with this message.
        service.handle("sensors/raw", br#"{"a":1}"#).await;
    }

    #[tokio::test]
    async fn transport_error_is_contained() {
        let mut sink = MockEventSink::new();
        sink.expect_forward()
            .times(1)
            .returning(|_| Err(DomainError::Transport(anyhow::anyhow!("connection refused"))));

        let service = ForwardService::new(Arc::new(sink), raw_policy(), AcceptPolicy::NoContent);

        service.handle("sensors/raw", br#"{"a":1}"#).await;
    }

    #[tokio::test]
    async fn lenient_policy_accepts_any_2xx() {
        let mut sink = MockEventSink::new();
        sink.expect_forward().times(1).returning(|_| {
            Ok(ForwardReceipt {
                status: 200,
                body: Some("ok".to_string()),
            })
        });

        let service = ForwardService::new(Arc::new(sink), raw_policy(), AcceptPolicy::AnySuccess);

        service.handle("sensors/raw", br#"{"a":1}"#).await;
    }
}
