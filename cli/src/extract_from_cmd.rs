use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use config::{Config, ConfigError, Map, Value};
use kaudit_core::config::{ALL_KEYS, KAFKA_KEY_PREFIX};
use kaudit_core::resolver::StaticVipResolver;

use crate::KauditCli;

/// Reads the Kafka audit properties out of the config file (if any) and the `--set` overrides
/// Every key under the audit prefix is extracted as a plain string: typing them, and reporting the unknown
/// ones, is up to `KafkaAuditConfig::from_properties`
pub(crate) fn extract_properties(cli: &KauditCli) -> anyhow::Result<HashMap<String, String>> {
    let mut builder = Config::builder();
    if let Some(config_file_path) = cli.config_file.as_ref() {
        builder = builder.add_source(config::File::from(Path::new(config_file_path.as_str())));
    }
    for property in &cli.overrides {
        builder = builder
            .set_override(property.key.as_str(), property.value.as_str())
            .with_context(|| format!("Invalid property override: {}", property.key))?;
    }
    let settings = builder
        .build()
        .with_context(|| format!("Could not read the specified config file: {:?}", cli.config_file))?;
    let mut properties = HashMap::with_capacity(ALL_KEYS.len());
    for key in ALL_KEYS {
        if let Some(value) = get_property(&settings, key)? {
            log::debug!("Found property {} = {}", key, value);
            properties.insert(key.to_string(), value);
        }
    }
    for (key, value) in audit_table(&settings) {
        let key = format!("{KAFKA_KEY_PREFIX}{key}");
        if !ALL_KEYS.iter().any(|known| known.eq_ignore_ascii_case(&key)) {
            properties.insert(key, value.into_string().unwrap_or_default());
        }
    }
    Ok(properties)
}

fn audit_table(settings: &Config) -> Map<String, Value> {
    settings
        .get_table(KAFKA_KEY_PREFIX.trim_end_matches('.'))
        .unwrap_or_default()
}

pub(crate) fn extract_vip_resolver(cli: &KauditCli) -> StaticVipResolver {
    cli.vip_hosts
        .iter()
        .fold(StaticVipResolver::new(), |resolver, vip_hosts| {
            resolver.with_vip(&vip_hosts.vip, vip_hosts.hosts.iter().cloned())
        })
}

// camelCase keys may come back lowercased depending on the source
fn get_property(settings: &Config, key: &str) -> anyhow::Result<Option<String>> {
    for candidate in [key.to_string(), key.to_lowercase()] {
        match settings.get_string(&candidate) {
            Ok(value) => return Ok(Some(value)),
            Err(ConfigError::NotFound(_)) => continue,
            Err(e) => return Err(e).with_context(|| format!("Could not read property {key}")),
        }
    }
    Ok(None)
}
