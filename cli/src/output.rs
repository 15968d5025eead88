use anyhow::Context;
use kaudit_core::descriptor::AuditKafkaDescriptor;

/// Prints the resolved descriptor to stdout, either human readable or as JSON
pub(crate) fn print_descriptor(descriptor: &AuditKafkaDescriptor, json: bool) -> anyhow::Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(descriptor).context("Could not render descriptor as JSON")?;
        println!("{rendered}");
    } else {
        println!("Kafka audit configuration is valid");
        println!("  bootstrap servers: {}", descriptor.bootstrap_servers());
        println!("  topic:             {}", descriptor.topic);
        println!("  retry interval:    {}ms", descriptor.retry_interval_ms);
        println!("  max queue size:    {}", descriptor.max_queue_size);
    }
    Ok(())
}
