//! Query, provider and result types shared by every layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LyricaError, LyricsError, Result};

/// Known lyrics providers.
///
/// The numbers are a stable external contract and are independent of any
/// priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProviderId {
    Genius = 1,
    Lrclib = 2,
    SimpMusic = 3,
    YoutubeMusic = 4,
    LyricsOvh = 5,
    ChartLyrics = 6,
    LyricsFreek = 7,
}

impl ProviderId {
    pub const ALL: [ProviderId; 7] = [
        ProviderId::Genius,
        ProviderId::Lrclib,
        ProviderId::SimpMusic,
        ProviderId::YoutubeMusic,
        ProviderId::LyricsOvh,
        ProviderId::ChartLyrics,
        ProviderId::LyricsFreek,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.number() == n)
    }

    /// Human readable name, used in attempt logs.
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderId::Genius => "Genius",
            ProviderId::Lrclib => "LRCLIB",
            ProviderId::SimpMusic => "SimpMusic",
            ProviderId::YoutubeMusic => "YouTube Music",
            ProviderId::LyricsOvh => "Lyrics.ovh",
            ProviderId::ChartLyrics => "ChartLyrics",
            ProviderId::LyricsFreek => "LyricsFreek",
        }
    }

    /// Machine tag used as the `source` of a result.
    pub fn source_tag(self) -> &'static str {
        match self {
            ProviderId::Genius => "genius",
            ProviderId::Lrclib => "lrclib",
            ProviderId::SimpMusic => "simpmusic",
            ProviderId::YoutubeMusic => "youtube_music",
            ProviderId::LyricsOvh => "lyrics.ovh",
            ProviderId::ChartLyrics => "chartlyrics",
            ProviderId::LyricsFreek => "lyricsfreek",
        }
    }

    /// Whether the upstream can ever return line timings.
    pub fn supports_timestamps(self) -> bool {
        matches!(
            self,
            ProviderId::Lrclib | ProviderId::SimpMusic | ProviderId::YoutubeMusic
        )
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl From<ProviderId> for u8 {
    fn from(id: ProviderId) -> u8 {
        id.number()
    }
}

impl TryFrom<u8> for ProviderId {
    type Error = String;

    fn try_from(n: u8) -> std::result::Result<Self, Self::Error> {
        ProviderId::from_number(n).ok_or_else(|| format!("unknown provider id {}", n))
    }
}

/// Parse a custom provider sequence such as `"2,1,5"`.
///
/// Every token must be a known provider number and appear at most once.
/// Anything else is rejected; there is no fallback to the default order.
pub fn parse_sequence(raw: &str) -> Result<Vec<ProviderId>> {
    let invalid = |reason: String| LyricaError::from(LyricsError::InvalidSequence { reason });

    if raw.trim().is_empty() {
        return Err(invalid("sequence is empty".to_string()));
    }

    let mut sequence = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid(format!("empty entry in '{}'", raw)));
        }
        let n: u8 = token
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a provider number", token)))?;
        let id = ProviderId::from_number(n).ok_or_else(|| {
            invalid(format!(
                "unknown provider {} (valid ids are 1 to {})",
                n,
                ProviderId::ALL.len()
            ))
        })?;
        if sequence.contains(&id) {
            return Err(invalid(format!("provider {} listed more than once", n)));
        }
        sequence.push(id);
    }

    Ok(sequence)
}

pub fn format_sequence(sequence: &[ProviderId]) -> String {
    sequence
        .iter()
        .map(|p| p.number().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// How much the caller cares about line timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    /// Plain lyrics are wanted.
    #[default]
    Off,
    /// Timed lyrics are wanted but plain text is an acceptable fallback.
    Preferred,
    /// Only timed lyrics are acceptable.
    Required,
}

impl TimingMode {
    pub fn wants_timestamps(self) -> bool {
        self != TimingMode::Off
    }
}

/// Default handling of `timestamps=true` when the caller does not say more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampsPolicy {
    #[default]
    Prefer,
    Require,
}

impl TimestampsPolicy {
    pub fn timing_mode(self) -> TimingMode {
        match self {
            TimestampsPolicy::Prefer => TimingMode::Preferred,
            TimestampsPolicy::Require => TimingMode::Required,
        }
    }
}

impl FromStr for TimestampsPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prefer" | "preferred" => Ok(TimestampsPolicy::Prefer),
            "require" | "required" => Ok(TimestampsPolicy::Require),
            other => Err(format!("expected 'prefer' or 'require', got '{}'", other)),
        }
    }
}

/// A validated lyrics lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    artist: String,
    title: String,
    timing: TimingMode,
    sequence: Option<Vec<ProviderId>>,
}

impl Query {
    pub fn new(artist: &str, title: &str) -> Result<Self> {
        let artist = artist.trim();
        let title = title.trim();
        if artist.is_empty() || title.is_empty() {
            return Err(LyricaError::validation("Artist and song name are required"));
        }
        Ok(Self {
            artist: artist.to_string(),
            title: title.to_string(),
            timing: TimingMode::Off,
            sequence: None,
        })
    }

    pub fn with_timing(mut self, timing: TimingMode) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_sequence(mut self, sequence: Vec<ProviderId>) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn timing(&self) -> TimingMode {
        self.timing
    }

    pub fn wants_timestamps(&self) -> bool {
        self.timing.wants_timestamps()
    }

    pub fn sequence_override(&self) -> Option<&[ProviderId]> {
        self.sequence.as_deref()
    }
}

/// Case- and whitespace-insensitive form of a query field.
pub fn normalize_field(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NoResults,
    Unsupported,
    Error,
    NotConfigured,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::NoResults => "no_results",
            AttemptStatus::Unsupported => "unsupported",
            AttemptStatus::Error => "error",
            AttemptStatus::NotConfigured => "not_configured",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One provider tried for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub provider: ProviderId,
    pub status: AttemptStatus,
    pub message: Option<String>,
}

impl Attempt {
    pub fn new(provider: ProviderId, status: AttemptStatus, message: Option<String>) -> Self {
        Self {
            provider,
            status,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedLine {
    pub text: String,
    #[serde(rename = "start_time")]
    pub start_ms: u64,
    #[serde(rename = "end_time")]
    pub end_ms: u64,
    #[serde(rename = "id")]
    pub index: u32,
}

/// Lyrics body. Plain text of a timed body is always derived from its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lyrics {
    Plain(String),
    Timed(Vec<TimedLine>),
}

impl Lyrics {
    pub fn plain_text(&self) -> String {
        match self {
            Lyrics::Plain(text) => text.clone(),
            Lyrics::Timed(lines) => lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn timed_lines(&self) -> Option<&[TimedLine]> {
        match self {
            Lyrics::Plain(_) => None,
            Lyrics::Timed(lines) => Some(lines),
        }
    }

    pub fn has_timestamps(&self) -> bool {
        matches!(self, Lyrics::Timed(_))
    }

    /// Render as LRC (`[mm:ss.xx]text`), if timed.
    pub fn to_lrc(&self) -> Option<String> {
        let lines = self.timed_lines()?;
        Some(
            lines
                .iter()
                .map(|l| {
                    let centis = l.start_ms / 10;
                    format!(
                        "[{:02}:{:02}.{:02}]{}",
                        centis / 6000,
                        (centis / 100) % 60,
                        centis % 100,
                        l.text
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Final result of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsResult {
    pub source: ProviderId,
    pub artist: String,
    pub title: String,
    pub lyrics: Lyrics,
    pub attempts: Vec<Attempt>,
    pub retrieved_at: DateTime<Utc>,
}

impl LyricsResult {
    pub fn has_timestamps(&self) -> bool {
        self.lyrics.has_timestamps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence_valid() {
        let seq = parse_sequence("2, 1,7").unwrap();
        assert_eq!(
            seq,
            vec![ProviderId::Lrclib, ProviderId::Genius, ProviderId::LyricsFreek]
        );
        assert_eq!(format_sequence(&seq), "2,1,7");
    }

    #[test]
    fn test_parse_sequence_rejects_malformed() {
        for raw in ["", "2,2", "0", "8", "2,x", "1,,3", "2,"] {
            let err = parse_sequence(raw).unwrap_err();
            assert!(
                matches!(err, LyricaError::Lyrics(LyricsError::InvalidSequence { .. })),
                "'{}' should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_query_trims_and_rejects_empty() {
        let q = Query::new("  Adele ", " Hello").unwrap();
        assert_eq!(q.artist(), "Adele");
        assert_eq!(q.title(), "Hello");
        assert!(!q.wants_timestamps());

        assert!(matches!(Query::new("   ", "Hello"), Err(LyricaError::Validation(_))));
        assert!(matches!(Query::new("Adele", ""), Err(LyricaError::Validation(_))));
    }

    #[test]
    fn test_normalize_field() {
        assert_eq!(normalize_field("  The   WEEKND "), "the weeknd");
    }

    #[test]
    fn test_timed_plain_text_is_join_of_lines() {
        let lyrics = Lyrics::Timed(vec![
            TimedLine { text: "one".into(), start_ms: 0, end_ms: 999, index: 1 },
            TimedLine { text: "two".into(), start_ms: 1000, end_ms: 6000, index: 2 },
        ]);
        assert_eq!(lyrics.plain_text(), "one\ntwo");
        assert!(lyrics.has_timestamps());
        assert_eq!(lyrics.to_lrc().unwrap(), "[00:00.00]one\n[00:01.00]two");
    }

    #[test]
    fn test_provider_numbers_round_trip_through_table() {
        for id in ProviderId::ALL {
            assert_eq!(ProviderId::from_number(id.number()), Some(id));
        }
        assert_eq!(ProviderId::from_number(0), None);
    }
}
