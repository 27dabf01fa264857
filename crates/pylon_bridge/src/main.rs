mod config;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use crate::config::BridgeConfig;
use crate::telemetry::{init_telemetry, TelemetryConfig};
use pylon_domain::{CredentialService, FileCredentialStore, ForwardService, NormalizePolicy};
use pylon_ingress::{HttpEventSink, HttpRegistrationClient};
use pylon_mqtt::{MqttSubscriber, MqttSubscriberConfig};
use pylon_runner::Runner;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match BridgeConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig {
        log_level: config.log_level.clone(),
    }) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    info!(
        broker_host = %config.mqtt_broker_host,
        broker_port = config.mqtt_broker_port,
        topic = %config.mqtt_topic,
        ingress = %config.ingress_address,
        "starting pylon-bridge"
    );

    let http_timeout = Duration::from_secs(config.http_timeout_secs);

    let store = Arc::new(FileCredentialStore::new(config.credential_path.clone()));
    let registration_client =
        match HttpRegistrationClient::new(&config.ingress_address, http_timeout) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!("Failed to build registration client: {}", e);
                std::process::exit(1);
            }
        };

    let credential_service = CredentialService::new(
        store,
        registration_client,
        config.ingress_api_key.clone(),
    );
    let credential = match credential_service.acquire(config.force_register).await {
        Ok(credential) => credential,
        Err(e) => {
            error!("Registration failed: {}", e);
            std::process::exit(1);
        }
    };
    info!(provenance = ?credential.provenance(), "credential ready");

    let sink = match HttpEventSink::new(
        &config.ingress_address,
        credential.into_token(),
        http_timeout,
    ) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            error!("Failed to build event sink: {}", e);
            std::process::exit(1);
        }
    };

    let forwarder = Arc::new(ForwardService::new(
        sink,
        NormalizePolicy {
            timestamp_mode: config.timestamp_mode,
            timestamp_field: config.timestamp_field.clone(),
            value_field: config.value_field.clone(),
        },
        config.accept_policy,
    ));

    let subscriber = MqttSubscriber::new(
        MqttSubscriberConfig {
            broker_host: config.mqtt_broker_host.clone(),
            broker_port: config.mqtt_broker_port,
            topic: config.mqtt_topic.clone(),
        },
        forwarder,
    );

    Runner::new()
        .with_named_process("mqtt_subscriber", move |token| subscriber.run(token))
        .with_closer(|| async {
            info!("bridge stopped");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;
}
