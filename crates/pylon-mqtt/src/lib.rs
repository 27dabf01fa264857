pub mod subscriber;

pub use subscriber::{MqttSubscriber, MqttSubscriberConfig};
