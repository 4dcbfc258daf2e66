use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::core::services::http::build_http_client;
use crate::error::NetworkError;

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommands,

    /// Base URL of a running lyrica server
    #[arg(long, global = true, default_value = "http://127.0.0.1:9999")]
    server: String,

    /// Admin key, defaults to the configured one
    #[arg(long, global = true)]
    key: Option<String>,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cache statistics
    Stats,

    /// Clear all cached results
    Clear,
}

fn endpoint(server: &str, path: &str) -> Result<Url> {
    let base = Url::parse(server).with_context(|| format!("Invalid server URL: {}", server))?;
    Ok(base.join(path)?)
}

async fn send(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request.send().await.map_err(NetworkError::from)?;
    let status = response.status();
    let url = response.url().to_string();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    debug!("{} answered {}: {}", url, status, body);

    if !status.is_success() {
        let message = body["error"]["message"].as_str().unwrap_or("no details");
        let error = NetworkError::Status {
            status: status.as_u16(),
            url,
        };
        return Err(anyhow::Error::new(error).context(message.to_string()));
    }
    Ok(body)
}

pub async fn execute(args: CacheArgs, config: &Config) -> Result<()> {
    let client = build_http_client()?;

    match args.command {
        CacheCommands::Stats => {
            let body = send(client.get(endpoint(&args.server, "/cache/stats")?)).await?;

            println!("📊 Cache Statistics");
            println!("══════════════════");
            println!("🗂️  Entries: {}", body["entry_count"]);
            println!("✅ Hits: {}", body["hits"]);
            println!("❌ Misses: {}", body["misses"]);
            println!(
                "📈 Hit Rate: {:.1}%",
                body["hit_rate_percent"].as_f64().unwrap_or(0.0)
            );
        }
        CacheCommands::Clear => {
            let key = args
                .key
                .or_else(|| config.admin_key.clone())
                .context("An admin key is required, pass --key or configure admin_key")?;
            let request = client
                .post(endpoint(&args.server, "/admin/cache/clear")?)
                .header("X-ADMIN-KEY", key);
            let body = send(request).await?;

            println!("✅ Cache cleared, {} entries removed", body["details"]["removed"]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_path() {
        let url = endpoint("http://localhost:9999/", "/cache/stats").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9999/cache/stats");
        assert!(endpoint("not a url", "/cache/stats").is_err());
    }
}
