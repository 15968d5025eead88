use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every Kafka audit property lives under this namespace
pub const KAFKA_KEY_PREFIX: &str = "eureka.ext.audit.kafka.";

pub const KAFKA_SERVERS_KEY: &str = "eureka.ext.audit.kafka.servers";
pub const KAFKA_VIP_KEY: &str = "eureka.ext.audit.kafka.vip";
pub const KAFKA_PORT_KEY: &str = "eureka.ext.audit.kafka.port";
pub const KAFKA_TOPIC_KEY: &str = "eureka.ext.audit.kafka.topic";
pub const KAFKA_RETRY_INTERVAL_KEY: &str = "eureka.ext.audit.kafka.retryInterval";
pub const KAFKA_MAX_QUEUE_SIZE_KEY: &str = "eureka.ext.audit.kafka.maxQueueSize";

pub const ALL_KEYS: [&str; 6] = [
    KAFKA_SERVERS_KEY,
    KAFKA_VIP_KEY,
    KAFKA_PORT_KEY,
    KAFKA_TOPIC_KEY,
    KAFKA_RETRY_INTERVAL_KEY,
    KAFKA_MAX_QUEUE_SIZE_KEY,
];

pub const DEFAULT_KAFKA_PORT: i32 = 7101;
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Kafka vip not defined via property {}", KAFKA_VIP_KEY)]
    VipNotDefined,
    #[error("Kafka port not defined via property {}", KAFKA_PORT_KEY)]
    PortNotDefined,
    #[error("Invalid value {value:?} for property {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Invalid Kafka server address {address:?}: {reason}")]
    InvalidServerAddress { address: String, reason: String },
    #[error("Kafka server list {0:?} does not contain any server")]
    EmptyServerList(String),
}

/// Kafka audit publisher configuration
///
/// Two ways of locating the Kafka cluster are supported:
///   - a server list, in the format `host[:port][;host[:port]]*`. When set it wins over the VIP
///   - a VIP resolved through the local registry, together with a port
///
/// The value is never mutated once built, `validate_configuration` is the only gate checking that
/// one of the two modes is usable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct KafkaAuditConfig {
    #[serde(rename = "servers")]
    kafka_server_list: Option<String>,
    #[serde(rename = "vip")]
    kafka_vip: Option<String>,
    #[serde(rename = "port")]
    kafka_port: i32,
    #[serde(rename = "topic")]
    kafka_topic: Option<String>,
    #[serde(rename = "retryInterval")]
    retry_interval_ms: u64,
    #[serde(rename = "maxQueueSize")]
    max_queue_size: usize,
}

impl Default for KafkaAuditConfig {
    fn default() -> Self {
        KafkaAuditConfig {
            kafka_server_list: None,
            kafka_vip: None,
            kafka_port: 0,
            kafka_topic: None,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
        }
    }
}

impl KafkaAuditConfig {
    /// Builds a configuration out of explicit values. Nothing is checked here, see `validate_configuration`
    pub fn new(
        kafka_server_list: Option<String>,
        kafka_vip: Option<String>,
        kafka_port: i32,
        kafka_topic: Option<String>,
        retry_interval_ms: u64,
        max_queue_size: usize,
    ) -> Self {
        KafkaAuditConfig {
            kafka_server_list,
            kafka_vip,
            kafka_port,
            kafka_topic,
            retry_interval_ms,
            max_queue_size,
        }
    }

    /// Binds a configuration from a flat map of properties (keyed by `ALL_KEYS`)
    ///   - values are trimmed, blank values are considered unset
    ///   - missing retry interval / queue size fall back to their defaults
    ///   - unknown keys under `KAFKA_KEY_PREFIX` are reported and ignored, callers should pass every
    ///     key they found under the prefix so that misspelled ones get reported
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigurationError> {
        for key in properties.keys() {
            if key.starts_with(KAFKA_KEY_PREFIX) && !ALL_KEYS.contains(&key.as_str()) {
                log::warn!("Ignoring unknown Kafka audit property {}", key);
            }
        }
        let retry_interval_ms = parse_property::<u64>(properties, KAFKA_RETRY_INTERVAL_KEY)?
            .unwrap_or(DEFAULT_RETRY_INTERVAL_MS);
        let max_queue_size = parse_property::<usize>(properties, KAFKA_MAX_QUEUE_SIZE_KEY)?
            .unwrap_or(DEFAULT_MAX_QUEUE_SIZE);
        ensure_positive(KAFKA_RETRY_INTERVAL_KEY, retry_interval_ms)?;
        ensure_positive(KAFKA_MAX_QUEUE_SIZE_KEY, max_queue_size)?;
        let config = KafkaAuditConfig {
            kafka_server_list: lookup(properties, KAFKA_SERVERS_KEY).map(str::to_string),
            kafka_vip: lookup(properties, KAFKA_VIP_KEY).map(str::to_string),
            kafka_port: parse_property::<i32>(properties, KAFKA_PORT_KEY)?.unwrap_or(0),
            kafka_topic: lookup(properties, KAFKA_TOPIC_KEY).map(str::to_string),
            retry_interval_ms,
            max_queue_size,
        };
        log::debug!("Kafka audit configuration bound from properties: {:?}", config);
        Ok(config)
    }

    pub fn kafka_server_list(&self) -> Option<&str> {
        self.kafka_server_list.as_deref()
    }

    pub fn kafka_vip(&self) -> Option<&str> {
        self.kafka_vip.as_deref()
    }

    /// The configured port, or `DEFAULT_KAFKA_PORT` if it isn't strictly positive
    pub fn kafka_port(&self) -> i32 {
        if self.kafka_port <= 0 {
            DEFAULT_KAFKA_PORT
        } else {
            self.kafka_port
        }
    }

    pub fn kafka_topic(&self) -> Option<&str> {
        self.kafka_topic.as_deref()
    }

    /// The configured topic, falling back to the registry cluster name
    pub fn topic_or<'a>(&'a self, cluster_name: &'a str) -> &'a str {
        self.kafka_topic().unwrap_or(cluster_name)
    }

    pub fn retry_interval_ms(&self) -> u64 {
        self.retry_interval_ms
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Without a server list, both a VIP and a port are required.
    /// The port check looks at the raw value: only an exact zero (i.e. unset) is rejected.
    pub fn validate_configuration(&self) -> Result<(), ConfigurationError> {
        if self.kafka_server_list.is_none() {
            self.required_vip()?;
        }
        Ok(())
    }

    /// The VIP, when both it and a non-zero port are set
    pub(crate) fn required_vip(&self) -> Result<&str, ConfigurationError> {
        let vip = self.kafka_vip().ok_or(ConfigurationError::VipNotDefined)?;
        if self.kafka_port == 0 {
            return Err(ConfigurationError::PortNotDefined);
        }
        Ok(vip)
    }

    /// `kafka_port()` as a network port
    pub(crate) fn network_port(&self) -> Result<u16, ConfigurationError> {
        u16::try_from(self.kafka_port()).map_err(|e| ConfigurationError::InvalidValue {
            key: KAFKA_PORT_KEY,
            value: self.kafka_port().to_string(),
            reason: e.to_string(),
        })
    }
}

fn lookup<'a>(properties: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn parse_property<T>(properties: &HashMap<String, String>, key: &'static str) -> Result<Option<T>, ConfigurationError>
where
    T: FromStr,
    T::Err: Display,
{
    lookup(properties, key)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigurationError::InvalidValue {
                key,
                value: value.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn ensure_positive<T>(key: &'static str, value: T) -> Result<(), ConfigurationError>
where
    T: Default + PartialEq + Display,
{
    if value == T::default() {
        Err(ConfigurationError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be strictly positive".to_string(),
        })
    } else {
        Ok(())
    }
}
