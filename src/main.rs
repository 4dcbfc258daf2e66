use clap::{Parser, Subcommand};

mod cli;
mod config;
mod core;
mod error;
mod server;
mod services;
mod signal_handler;
mod utils;

use config::{Config, EnvParser, EnvVars};
use error::Result;
use services::SimpleServices;

#[derive(Parser)]
#[command(name = "lyrica")]
#[command(about = "Lyrics lookup across several providers, as a CLI or an HTTP service")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up lyrics for one song
    Lyrics(cli::lyrics::LyricsArgs),

    /// Run the HTTP service
    Serve(cli::serve::ServeArgs),

    /// List providers and the default fallback order
    Providers(cli::providers::ProvidersArgs),

    /// Inspect or clear a running server's cache
    Cache(cli::cache::CacheArgs),

    /// Show configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let json = cli.log_json || EnvParser::parse_bool(EnvVars::LOG_JSON)?.unwrap_or(false);
    utils::logging::init_logging(cli.verbose, json)?;

    let config = Config::load(cli.config.as_deref())?;
    let services = SimpleServices::new(config);

    let config = services.config();
    match cli.command {
        Commands::Lyrics(args) => cli::lyrics::execute(args, &services).await?,
        Commands::Serve(args) => cli::serve::execute(args, &services).await?,
        Commands::Providers(args) => cli::providers::execute(args, &services).await?,
        Commands::Cache(args) => cli::cache::execute(args, &config).await?,
        Commands::Config(args) => cli::config::execute(args, &config).await?,
    }
    Ok(())
}
