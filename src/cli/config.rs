use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{Config, EnvParser};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration, secrets masked
    Show,

    /// Show configuration file path
    Path,

    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn execute(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            println!("🔧 Current configuration:");
            println!("{}", config.redacted_toml()?);

            let overrides = EnvParser::get_all_lyrica_vars();
            if !overrides.is_empty() {
                println!("🌍 Environment overrides:");
                for (name, _) in overrides {
                    println!("  {}", name);
                }
            }
        }
        ConfigCommands::Path => {
            let path = Config::config_path()?;
            println!("📁 Config file: {}", path.display());
            if !path.exists() {
                println!("   (not created yet, defaults in use)");
            }
        }
        ConfigCommands::Init { force } => {
            let path = Config::config_path()?;
            if path.exists() && !force {
                anyhow::bail!("{} already exists, pass --force to overwrite", path.display());
            }
            config.save(&path)?;
            println!("✅ Wrote {}", path.display());
        }
    }
    Ok(())
}
