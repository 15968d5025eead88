mod extract_from_cmd;
mod output;

use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use kaudit_core::config::KafkaAuditConfig;
use kaudit_core::create_client_config;
use kaudit_core::descriptor::AuditKafkaDescriptor;
use rdkafka::producer::BaseProducer;

use crate::extract_from_cmd::{extract_properties, extract_vip_resolver};

/// Checks the Kafka audit publisher configuration of a registry node
/// The configuration is made of:
///   - an optional file (toml, yaml, json, ini...) holding the `eureka.ext.audit.kafka.*` properties
///   - `--set` overrides, applied on top of the file
/// VIPs are not looked up in a live registry: use --vip-hosts to tell which hosts stand behind a VIP
///
/// A full valid example could be:
///   kaudit --config-file=/etc/eureka/audit.toml --cluster-name=eureka-prod
///
/// Another one:
///   kaudit --set eureka.ext.audit.kafka.vip=KafkaVip --set eureka.ext.audit.kafka.port=9092 --vip-hosts KafkaVip=kafka1,kafka2
///
#[derive(Clone, Parser, Debug)]
#[clap(version = "0.1.0", author = "Arnaud Esteve <arnaud.esteve@gmail.com>")]
pub(crate) struct KauditCli {
    /// File holding the Kafka audit properties, its format is inferred from the extension
    #[clap(short, long)]
    config_file: Option<String>,
    /// Sets a property, e.g. --set eureka.ext.audit.kafka.port=9092
    #[clap(short = 's', long = "set")]
    overrides: Vec<PropertyOverride>,
    /// Registry cluster name, used as topic when none is configured
    #[clap(long, default_value = "eureka")]
    cluster_name: String,
    /// Hosts standing behind a VIP, e.g. --vip-hosts KafkaVip=kafka1,kafka2
    #[clap(long)]
    vip_hosts: Vec<VipHosts>,
    /// Prints the resolved descriptor as JSON
    #[clap(long)]
    json: bool,
    /// Lets librdkafka instantiate a producer out of the resolved configuration (nothing is sent)
    #[clap(long)]
    create_producer: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PropertyOverride {
    key: String,
    value: String,
}

impl FromStr for PropertyOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok(PropertyOverride {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(format!("Expected KEY=VALUE, got: {s}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VipHosts {
    vip: String,
    hosts: Vec<String>,
}

impl FromStr for VipHosts {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((vip, hosts)) if !vip.trim().is_empty() => Ok(VipHosts {
                vip: vip.trim().to_string(),
                hosts: hosts
                    .split(',')
                    .map(str::trim)
                    .filter(|host| !host.is_empty())
                    .map(str::to_string)
                    .collect(),
            }),
            _ => Err(format!("Expected VIP=HOST[,HOST...], got: {s}")),
        }
    }
}

fn main() {
    env_logger::init();
    let cli: KauditCli = KauditCli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &KauditCli) -> anyhow::Result<()> {
    let properties = extract_properties(cli)?;
    let config = KafkaAuditConfig::from_properties(&properties)
        .context("Could not bind the Kafka audit properties")?;
    config
        .validate_configuration()
        .context("Invalid Kafka audit configuration")?;
    let resolver = extract_vip_resolver(cli);
    let descriptor = AuditKafkaDescriptor::resolve(&config, &resolver, &cli.cluster_name)
        .context("Could not resolve the Kafka audit descriptor")?;
    let client_config = create_client_config(&descriptor);
    if cli.create_producer {
        let _producer: BaseProducer = client_config
            .create()
            .context("librdkafka rejected the Kafka audit client configuration")?;
        log::info!("Kafka producer created for {}", descriptor.bootstrap_servers());
    }
    output::print_descriptor(&descriptor, cli.json)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::{PropertyOverride, VipHosts};

    #[test]
    fn parses_overrides() {
        assert_eq!(
            Ok(PropertyOverride {
                key: "eureka.ext.audit.kafka.port".to_string(),
                value: "9092".to_string()
            }),
            PropertyOverride::from_str("eureka.ext.audit.kafka.port = 9092")
        );
        assert_eq!(
            Ok(PropertyOverride {
                key: "eureka.ext.audit.kafka.servers".to_string(),
                value: "a=b".to_string()
            }),
            PropertyOverride::from_str("eureka.ext.audit.kafka.servers=a=b")
        );
        assert!(PropertyOverride::from_str("no-separator").is_err());
        assert!(PropertyOverride::from_str("=value").is_err());
    }

    #[test]
    fn parses_vip_hosts() {
        assert_eq!(
            Ok(VipHosts {
                vip: "KafkaVip".to_string(),
                hosts: vec!["kafka1".to_string(), "kafka2".to_string()]
            }),
            VipHosts::from_str("KafkaVip=kafka1, kafka2,")
        );
        assert!(VipHosts::from_str("kafka1,kafka2").is_err());
    }
}
