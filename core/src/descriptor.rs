use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigurationError, KafkaAuditConfig};
use crate::resolver::{ResolveError, VipResolver};
use crate::servers::{bootstrap_servers, parse_server_list_with, KafkaServer};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditSetupError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Resolution(#[from] ResolveError),
}

/// Where the audit publisher should look for Kafka
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KafkaEndpoints {
    ServerList(Vec<KafkaServer>),
    Vip { vip: String, port: u16 },
}

impl KafkaAuditConfig {
    /// Runs the `validate_configuration` checks, then picks the server list if any, the VIP otherwise.
    /// The configured port only matters in VIP mode, or for server list entries without their own port.
    pub fn endpoints(&self) -> Result<KafkaEndpoints, ConfigurationError> {
        match self.kafka_server_list() {
            Some(list) => parse_server_list_with(list, || self.network_port()).map(KafkaEndpoints::ServerList),
            None => {
                let vip = self.required_vip()?;
                Ok(KafkaEndpoints::Vip {
                    vip: vip.to_string(),
                    port: self.network_port()?,
                })
            }
        }
    }
}

/// Everything the audit pipeline needs to create its Kafka producer and size its retry queue
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AuditKafkaDescriptor {
    pub servers: Vec<KafkaServer>,
    pub topic: String,
    pub retry_interval_ms: u64,
    pub max_queue_size: usize,
}

impl AuditKafkaDescriptor {
    pub fn resolve<R: VipResolver + ?Sized>(
        config: &KafkaAuditConfig,
        resolver: &R,
        cluster_name: &str,
    ) -> Result<Self, AuditSetupError> {
        let servers = match config.endpoints()? {
            KafkaEndpoints::ServerList(servers) => servers,
            KafkaEndpoints::Vip { vip, port } => resolver.resolve(&vip, port)?,
        };
        let descriptor = AuditKafkaDescriptor {
            servers,
            topic: config.topic_or(cluster_name).to_string(),
            retry_interval_ms: config.retry_interval_ms(),
            max_queue_size: config.max_queue_size(),
        };
        log::info!("Kafka audit publisher will connect to {}", descriptor);
        Ok(descriptor)
    }

    pub fn bootstrap_servers(&self) -> String {
        bootstrap_servers(&self.servers)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Display for AuditKafkaDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "topic {} on [{}], retrying every {}ms, queueing at most {} messages",
            self.topic,
            self.bootstrap_servers(),
            self.retry_interval_ms,
            self.max_queue_size
        )
    }
}
