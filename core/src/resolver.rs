use std::collections::HashMap;

use thiserror::Error;

use crate::servers::KafkaServer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("VIP {0} is not known to the registry")]
    UnknownVip(String),
    #[error("VIP {0} has no registered instances")]
    NoInstances(String),
}

/// Turns a VIP address into concrete Kafka servers.
/// The registry lookup itself lives outside of this crate, this is only the seam it plugs into.
pub trait VipResolver {
    fn resolve(&self, vip: &str, port: u16) -> Result<Vec<KafkaServer>, ResolveError>;
}

/// A fixed VIP -> hosts table
#[derive(Debug, Clone, Default)]
pub struct StaticVipResolver {
    vips: HashMap<String, Vec<String>>,
}

impl StaticVipResolver {
    pub fn new() -> Self {
        StaticVipResolver::default()
    }

    pub fn with_vip<I, S>(mut self, vip: &str, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vips
            .entry(vip.to_string())
            .or_default()
            .extend(hosts.into_iter().map(Into::into));
        self
    }
}

impl VipResolver for StaticVipResolver {
    fn resolve(&self, vip: &str, port: u16) -> Result<Vec<KafkaServer>, ResolveError> {
        let hosts = self
            .vips
            .get(vip)
            .ok_or_else(|| ResolveError::UnknownVip(vip.to_string()))?;
        if hosts.is_empty() {
            return Err(ResolveError::NoInstances(vip.to_string()));
        }
        log::debug!("VIP {} resolved to {:?}", vip, hosts);
        Ok(hosts.iter().map(|host| KafkaServer::new(host.as_str(), port)).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::resolver::{ResolveError, StaticVipResolver, VipResolver};
    use crate::servers::KafkaServer;

    #[test]
    fn resolves_known_vip_with_port() {
        let resolver = StaticVipResolver::new().with_vip("KafkaVip", ["kafka1", "kafka2"]);
        assert_eq!(
            Ok(vec![KafkaServer::new("kafka1", 9092), KafkaServer::new("kafka2", 9092)]),
            resolver.resolve("KafkaVip", 9092)
        );
    }

    #[test]
    fn hosts_accumulate_for_the_same_vip() {
        let resolver = StaticVipResolver::new()
            .with_vip("KafkaVip", ["kafka1"])
            .with_vip("KafkaVip", ["kafka2"]);
        assert_eq!(2, resolver.resolve("KafkaVip", 7101).map(|servers| servers.len()).unwrap_or_default());
    }

    #[test]
    fn unknown_and_empty_vips_fail() {
        let resolver = StaticVipResolver::new().with_vip("EmptyVip", Vec::<String>::new());
        assert_eq!(Err(ResolveError::UnknownVip("Other".to_string())), resolver.resolve("Other", 7101));
        assert_eq!(Err(ResolveError::NoInstances("EmptyVip".to_string())), resolver.resolve("EmptyVip", 7101));
    }
}
