use async_trait::async_trait;

/// Seam between the broker subscription and per-message processing.
///
/// The subscriber dispatches every inbound publish here. Implementations
/// contain their own failures; nothing propagates back to the broker loop,
/// so one bad message never affects another.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, topic: &str, payload: &[u8]);
}
