use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::ConfigValidator;
use crate::server::{self, AppState};
use crate::services::SimpleServices;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on, overrides `bind_address`
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,
}

pub async fn execute(args: ServeArgs, services: &SimpleServices) -> Result<()> {
    let mut config = (*services.config()).clone();
    if let Some(bind) = args.bind {
        ConfigValidator::validate_bind_address(&bind)?;
        config.bind_address = bind;
    }
    if config.admin_key.is_none() {
        info!("No admin key configured; admin endpoints are disabled");
    }

    let services = SimpleServices::new(config);
    let state = AppState::from_services(&services)?;
    info!(
        "Serving with {} providers configured",
        state.lyrics.orchestrator().registry().len()
    );
    server::start_server(state).await?;
    Ok(())
}
