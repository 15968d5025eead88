use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::config::ConfigurationError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct KafkaServer {
    pub host: String,
    pub port: u16,
}

impl KafkaServer {
    pub fn new<H: Into<String>>(host: H, port: u16) -> Self {
        KafkaServer { host: host.into(), port }
    }
}

impl Display for KafkaServer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Parses a server list in the `host[:port][;host[:port]]*` format
///   - entries are trimmed, empty entries (`a;;b`, trailing `;`) are skipped
///   - an entry without port gets `default_port`
///   - IPv6 hosts must be bracketed: `[::1]:9092`
pub fn parse_server_list(list: &str, default_port: u16) -> Result<Vec<KafkaServer>, ConfigurationError> {
    parse_server_list_with(list, || Ok(default_port))
}

/// Same as `parse_server_list`, the default port is only looked up (and its error only reported)
/// when an entry comes without port
pub fn parse_server_list_with<F>(list: &str, default_port: F) -> Result<Vec<KafkaServer>, ConfigurationError>
where
    F: Fn() -> Result<u16, ConfigurationError>,
{
    let servers = list
        .split(';')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(|address| parse_server(address, &default_port))
        .collect::<Result<Vec<KafkaServer>, ConfigurationError>>()?;
    if servers.is_empty() {
        return Err(ConfigurationError::EmptyServerList(list.to_string()));
    }
    Ok(servers)
}

/// The comma separated `host:port` list Kafka clients expect as `bootstrap.servers`
pub fn bootstrap_servers(servers: &[KafkaServer]) -> String {
    servers
        .iter()
        .map(KafkaServer::to_string)
        .collect::<Vec<String>>()
        .join(",")
}

fn parse_server<F>(address: &str, default_port: &F) -> Result<KafkaServer, ConfigurationError>
where
    F: Fn() -> Result<u16, ConfigurationError>,
{
    let invalid = |reason: String| ConfigurationError::InvalidServerAddress {
        address: address.to_string(),
        reason,
    };
    let (host, port) = split_host_port(address).map_err(|reason| invalid(reason.to_string()))?;
    if host.is_empty() || host == "[]" {
        return Err(invalid("empty host".to_string()));
    }
    let port = match port {
        Some(port) => port.parse::<u16>().map_err(|e| invalid(e.to_string()))?,
        None => default_port()?,
    };
    if port == 0 {
        return Err(invalid("port must be strictly positive".to_string()));
    }
    Ok(KafkaServer::new(host, port))
}

fn split_host_port(address: &str) -> Result<(&str, Option<&str>), &'static str> {
    if address.starts_with('[') {
        let end = address.find(']').ok_or("unterminated IPv6 host")?;
        let (host, rest) = address.split_at(end + 1);
        return if rest.is_empty() {
            Ok((host, None))
        } else {
            rest.strip_prefix(':')
                .map(|port| (host, Some(port)))
                .ok_or("unexpected characters after IPv6 host")
        };
    }
    match address.split_once(':') {
        Some((_, port)) if port.contains(':') => Err("IPv6 hosts must be enclosed in brackets"),
        Some((host, port)) => Ok((host, Some(port))),
        None => Ok((address, None)),
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    use crate::config::ConfigurationError;
    use crate::servers::{bootstrap_servers, parse_server_list, parse_server_list_with, KafkaServer};

    #[test]
    fn parses_hosts_with_and_without_port() {
        let servers = parse_server_list("kafka1:9092;kafka2", 7101).expect("Could not parse server list");
        assert_eq!(vec![KafkaServer::new("kafka1", 9092), KafkaServer::new("kafka2", 7101)], servers);
    }

    #[test]
    fn skips_blanks_and_empty_entries() {
        let servers = parse_server_list(" kafka1:9092 ;; kafka2:9093 ;", 7101).expect("Could not parse server list");
        assert_eq!(vec![KafkaServer::new("kafka1", 9092), KafkaServer::new("kafka2", 9093)], servers);
    }

    #[test]
    fn accepts_bracketed_ipv6() {
        let servers = parse_server_list("[::1]:9092;[fe80::1]", 7101).expect("Could not parse IPv6 server list");
        assert_eq!(vec![KafkaServer::new("[::1]", 9092), KafkaServer::new("[fe80::1]", 7101)], servers);
        assert_eq!("[::1]:9092,[fe80::1]:7101", bootstrap_servers(&servers));
    }

    #[test]
    fn rejects_invalid_addresses() {
        for list in ["kafka1:notaport", ":9092", "kafka1:0", "kafka1:70000", "::1:9092", "[::1", "[::1]x", "[]:9092"] {
            assert!(
                matches!(parse_server_list(list, 7101), Err(ConfigurationError::InvalidServerAddress { .. })),
                "{} should have been rejected",
                list
            );
        }
    }

    #[test]
    fn rejects_lists_without_servers() {
        for list in ["", " ", ";;", " ; "] {
            assert_eq!(
                Err(ConfigurationError::EmptyServerList(list.to_string())),
                parse_server_list(list, 7101)
            );
        }
    }

    #[test]
    fn default_port_is_only_looked_up_when_needed() {
        let failing_default = || -> Result<u16, ConfigurationError> {
            Err(ConfigurationError::InvalidValue {
                key: "port",
                value: "70000".to_string(),
                reason: "out of range".to_string(),
            })
        };
        assert_eq!(
            Ok(vec![KafkaServer::new("kafka1", 9092)]),
            parse_server_list_with("kafka1:9092", failing_default)
        );
        assert!(matches!(
            parse_server_list_with("kafka1:9092;kafka2", failing_default),
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn bootstrap_servers_are_comma_separated() {
        let servers = vec![KafkaServer::new("kafka1", 9092), KafkaServer::new("kafka2", 9093)];
        assert_eq!("kafka1:9092,kafka2:9093", bootstrap_servers(&servers));
    }

    #[quickcheck]
    fn displayed_servers_parse_back(hosts: Vec<(u8, u16)>) -> TestResult {
        let servers: Vec<KafkaServer> = hosts
            .into_iter()
            .filter(|(_, port)| *port > 0)
            .map(|(id, port)| KafkaServer::new(format!("kafka-{}", id), port))
            .collect();
        if servers.is_empty() {
            return TestResult::discard();
        }
        let list = servers.iter().map(KafkaServer::to_string).collect::<Vec<String>>().join(";");
        TestResult::from_bool(parse_server_list(&list, 7101) == Ok(servers))
    }

    #[quickcheck]
    fn missing_port_always_takes_the_default(default_port: u16) -> TestResult {
        if default_port == 0 {
            return TestResult::discard();
        }
        TestResult::from_bool(parse_server_list("kafka", default_port) == Ok(vec![KafkaServer::new("kafka", default_port)]))
    }
}
