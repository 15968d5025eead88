pub mod config;
pub mod descriptor;
pub mod resolver;
pub mod servers;

use descriptor::AuditKafkaDescriptor;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::ClientConfig;

/// The Kafka (librdkafka-rust) client configuration matching a resolved audit descriptor
/// Creating the producer out of it is up to the audit pipeline
///   - bootstrap servers come from the server list or the resolved VIP
///   - the retry interval drives the reconnection backoff
///   - the max queue size bounds the producer's local queue
pub fn create_client_config(descriptor: &AuditKafkaDescriptor) -> ClientConfig {
    let retry_interval_ms = descriptor.retry_interval_ms.to_string();
    let log_level = if log::log_enabled!(log::Level::Debug) {
        RDKafkaLogLevel::Debug
    } else {
        RDKafkaLogLevel::Warning
    };
    let mut builder = ClientConfig::new();
    builder
        .set("bootstrap.servers", descriptor.bootstrap_servers())
        .set("reconnect.backoff.ms", retry_interval_ms.clone())
        .set("reconnect.backoff.max.ms", retry_interval_ms)
        .set("queue.buffering.max.messages", descriptor.max_queue_size.to_string())
        .set_log_level(log_level);
    log::debug!("Kafka audit client configuration: {:?}", builder);
    builder
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use quickcheck::{Arbitrary, Gen};

    use crate::config::KafkaAuditConfig;
    use crate::create_client_config;
    use crate::descriptor::AuditKafkaDescriptor;
    use crate::servers::KafkaServer;

    // The root module contains test utilities, tests themselves are placed in every submodule

    /// Builds a property map out of (key, value) pairs
    pub(crate) fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    // Property-Based Testing
    // Most validation rules are stated as "no matter the other values, [...] should happen"
    // For these we are using quickcheck, generating configurations with every field picked at random

    impl Arbitrary for KafkaAuditConfig {
        fn arbitrary(g: &mut Gen) -> Self {
            let ports = &[0, -1, 7101, 9092, i32::arbitrary(g)];
            KafkaAuditConfig::new(
                Option::arbitrary(g),
                Option::arbitrary(g),
                *g.choose(ports).unwrap(),
                Option::arbitrary(g),
                u64::arbitrary(g),
                usize::arbitrary(g),
            )
        }
    }

    fn test_descriptor() -> AuditKafkaDescriptor {
        AuditKafkaDescriptor {
            servers: vec![KafkaServer::new("kafka1", 9092), KafkaServer::new("kafka2", 9093)],
            topic: "audit".to_string(),
            retry_interval_ms: 5000,
            max_queue_size: 500,
        }
    }

    #[test]
    fn client_config_carries_descriptor() {
        let config = create_client_config(&test_descriptor());
        assert_eq!(Some("kafka1:9092,kafka2:9093"), config.get("bootstrap.servers"));
        assert_eq!(Some("5000"), config.get("reconnect.backoff.ms"));
        assert_eq!(Some("5000"), config.get("reconnect.backoff.max.ms"));
        assert_eq!(Some("500"), config.get("queue.buffering.max.messages"));
    }
}
