use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use crate::core::model::{parse_sequence, Query, TimingMode};
use crate::error::{LyricaError, LyricsError};
use crate::server::response::{attempt_views, SuccessEnvelope};
use crate::services::SimpleServices;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Lrc,
}

#[derive(Args)]
pub struct LyricsArgs {
    /// Artist name
    #[arg(value_name = "ARTIST")]
    artist: String,

    /// Song title
    #[arg(value_name = "TITLE")]
    title: String,

    /// Prefer time-synced lyrics
    #[arg(short, long)]
    timestamps: bool,

    /// Only accept time-synced lyrics
    #[arg(long)]
    timed_only: bool,

    /// Provider order, e.g. `2,1`
    #[arg(short, long)]
    sequence: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl LyricsArgs {
    fn to_query(&self, services: &SimpleServices) -> Result<Query> {
        let timing = if self.timed_only {
            TimingMode::Required
        } else if self.timestamps || self.format == OutputFormat::Lrc {
            services.config().timestamps_mode.timing_mode()
        } else {
            TimingMode::Off
        };

        let mut query = Query::new(&self.artist, &self.title)?.with_timing(timing);
        if let Some(raw) = self.sequence.as_deref() {
            query = query.with_sequence(parse_sequence(raw)?);
        }
        Ok(query)
    }
}

pub async fn execute(args: LyricsArgs, services: &SimpleServices) -> Result<()> {
    let query = args.to_query(services)?;
    let lyrics = services
        .create_lyrics_service()
        .context("Failed to set up providers")?;

    info!("Looking up {} - {}", query.artist(), query.title());
    let result = match lyrics.lookup(&query).await {
        Ok(result) => result,
        Err(LyricaError::Lyrics(LyricsError::NotFound { attempts, .. })) => {
            for view in attempt_views(&attempts) {
                eprintln!(
                    "  {:>2} {:<14} {:<15} {}",
                    view.id,
                    view.api,
                    view.status,
                    view.message.unwrap_or_default()
                );
            }
            bail!("No lyrics found for '{}' by '{}'", query.title(), query.artist());
        }
        Err(e) => return Err(e.into()),
    };

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&SuccessEnvelope::from(result.as_ref()))?);
        }
        OutputFormat::Lrc => match result.lyrics.to_lrc() {
            Some(lrc) => println!("{}", lrc),
            None => bail!(
                "{} returned plain lyrics only; LRC output needs timestamps",
                result.source.display_name()
            ),
        },
        OutputFormat::Text => {
            println!("🎵 {} - {}", result.artist, result.title);
            println!(
                "📡 Source: {}{}",
                result.source.display_name(),
                if result.has_timestamps() { " (synced)" } else { "" }
            );
            println!();
            println!("{}", result.lyrics.plain_text());
        }
    }
    Ok(())
}
