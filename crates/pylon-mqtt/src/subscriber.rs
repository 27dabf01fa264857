use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use pylon_domain::MessageHandler;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Connection settings for the broker subscription.
#[derive(Debug, Clone)]
pub struct MqttSubscriberConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub topic: String,
}

/// Subscribes to a single topic at QoS 0 and dispatches every publish to
/// the registered message handler.
pub struct MqttSubscriber {
    config: MqttSubscriberConfig,
    handler: Arc<dyn MessageHandler>,
}

impl MqttSubscriber {
    pub fn new(config: MqttSubscriberConfig, handler: Arc<dyn MessageHandler>) -> Self {
        Self { config, handler }
    }

    /// Run the subscription until cancelled.
    ///
    /// Connection and subscription failures are returned to the caller.
    /// rumqttc delivers packets from a single poll loop, so each publish is
    /// dispatched on its own task to keep a slow delivery from stalling the
    /// connection keep-alive; handler invocations may therefore run
    /// concurrently.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        // Duplicate client ids stall every party holding the id.
        let client_id = generate_client_id();

        let mut options = MqttOptions::new(
            client_id.as_str(),
            self.config.broker_host.as_str(),
            self.config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(true);

        let (client, mut event_loop) = AsyncClient::new(options, 100);

        client
            .subscribe(&self.config.topic, QoS::AtMostOnce)
            .await
            .with_context(|| format!("failed to subscribe to topic '{}'", self.config.topic))?;

        info!(
            host = %self.config.broker_host,
            port = self.config.broker_port,
            topic = %self.config.topic,
            client_id = %client_id,
            "mqtt subscription requested"
        );

        loop {
            tokio::select! {
                // Shutdown takes priority over pending broker events.
                biased;

                _ = shutdown.cancelled() => {
                    debug!("shutdown signal received");
                    if let Err(e) = client.unsubscribe(&self.config.topic).await {
                        warn!(
                            topic = %self.config.topic,
                            error = %e,
                            "failed to unsubscribe during shutdown"
                        );
                    }
                    let _ = client.disconnect().await;
                    return Ok(());
                }
                event = event_loop.poll() => {
                    match event {
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            let handler = Arc::clone(&self.handler);
                            tokio::spawn(async move {
                                handler.handle(&publish.topic, &publish.payload).await;
                            });
                        }
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            info!("connected to mqtt broker");
                        }
                        Ok(Event::Incoming(Packet::SubAck(_))) => {
                            debug!("subscription acknowledged");
                        }
                        Ok(_) => {
                            // Outgoing packets, pings.
                        }
                        Err(e) => {
                            return Err(anyhow!("mqtt event loop error: {e}"));
                        }
                    }
                }
            }
        }
    }
}

fn generate_client_id() -> String {
    format!("pylon-bridge-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ids_are_unique_per_instance() {
        let first = generate_client_id();
        let second = generate_client_id();

        assert_ne!(first, second);
        assert!(first.starts_with("pylon-bridge-"));
    }

    struct NoopHandler;

    #[async_trait::async_trait]
    impl MessageHandler for NoopHandler {
        async fn handle(&self, _topic: &str, _payload: &[u8]) {}
    }

    fn test_config(port: u16) -> MqttSubscriberConfig {
        MqttSubscriberConfig {
            broker_host: "127.0.0.1".to_string(),
            broker_port: port,
            topic: "sensors/raw".to_string(),
        }
    }

    #[tokio::test]
    async fn unreachable_broker_fails_the_run() {
        // Nothing listens on port 1.
        let subscriber = MqttSubscriber::new(test_config(1), Arc::new(NoopHandler));

        let result = subscriber.run(CancellationToken::new()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancellation_stops_the_run_cleanly() {
        let subscriber = MqttSubscriber::new(test_config(1), Arc::new(NoopHandler));

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let result = subscriber.run(shutdown).await;

        assert!(result.is_ok());
    }
}
