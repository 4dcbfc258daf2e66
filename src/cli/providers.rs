use anyhow::Result;
use clap::Args;

use crate::core::model::{format_sequence, ProviderId};
use crate::core::orchestrator::EngineSettings;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct ProvidersArgs {}

pub async fn execute(_args: ProvidersArgs, services: &SimpleServices) -> Result<()> {
    let config = services.config();
    let registry = services.create_registry()?;
    let settings = EngineSettings::from_config(&config)?;

    println!("{:<4} {:<15} {:<7} {}", "ID", "PROVIDER", "TIMED", "STATUS");
    for id in ProviderId::ALL {
        let status = if registry.is_configured(id) {
            "ready"
        } else {
            "not configured"
        };
        println!(
            "{:<4} {:<15} {:<7} {}",
            id.number(),
            id.display_name(),
            if id.supports_timestamps() { "yes" } else { "no" },
            status
        );
    }
    println!();
    println!("Plain order: {}", format_sequence(&settings.plain_sequence));
    println!("Timed order: {}", format_sequence(&settings.timed_sequence));
    Ok(())
}
