//! JSON envelopes returned by the HTTP API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::infrastructure::CacheStats;
use crate::core::model::{Attempt, AttemptStatus, LyricsResult, TimedLine};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub api: &'static str,
    pub id: u8,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&Attempt> for AttemptView {
    fn from(attempt: &Attempt) -> Self {
        Self {
            api: attempt.provider.display_name(),
            id: attempt.provider.number(),
            status: attempt.status,
            message: attempt.message.clone(),
        }
    }
}

pub fn attempt_views(attempts: &[Attempt]) -> Vec<AttemptView> {
    attempts.iter().map(AttemptView::from).collect()
}

#[derive(Debug, Serialize)]
pub struct LyricsData {
    pub source: &'static str,
    pub source_id: u8,
    pub artist: String,
    pub title: String,
    pub lyrics: String,
    #[serde(rename = "hasTimestamps")]
    pub has_timestamps: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed_lyrics: Option<Vec<TimedLine>>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessEnvelope {
    pub status: &'static str,
    pub data: LyricsData,
    pub attempts: Vec<AttemptView>,
}

impl From<&LyricsResult> for SuccessEnvelope {
    fn from(result: &LyricsResult) -> Self {
        Self {
            status: "success",
            data: LyricsData {
                source: result.source.source_tag(),
                source_id: result.source.number(),
                artist: result.artist.clone(),
                title: result.title.clone(),
                lyrics: result.lyrics.plain_text(),
                has_timestamps: result.has_timestamps(),
                timed_lyrics: result.lyrics.timed_lines().map(<[TimedLine]>::to_vec),
                timestamp: format_timestamp(result.retrieved_at),
            },
            attempts: attempt_views(&result.attempts),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<AttemptView>>,
}

#[derive(Debug, Serialize)]
pub struct StatsEnvelope {
    pub status: &'static str,
    #[serde(flatten)]
    pub stats: CacheStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Lyrics, ProviderId};
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let result = LyricsResult {
            source: ProviderId::Lrclib,
            artist: "Adele".to_string(),
            title: "Hello".to_string(),
            lyrics: Lyrics::Timed(vec![TimedLine {
                text: "Hello".to_string(),
                start_ms: 1000,
                end_ms: 2000,
                index: 1,
            }]),
            attempts: vec![Attempt::new(ProviderId::Genius, AttemptStatus::NotConfigured, None)],
            retrieved_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        };

        let value = serde_json::to_value(SuccessEnvelope::from(&result)).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "data": {
                    "source": "lrclib",
                    "source_id": 2,
                    "artist": "Adele",
                    "title": "Hello",
                    "lyrics": "Hello",
                    "hasTimestamps": true,
                    "timed_lyrics": [{"text": "Hello", "start_time": 1000, "end_time": 2000, "id": 1}],
                    "timestamp": "2024-05-01 12:30:00"
                },
                "attempts": [{"api": "Genius", "id": 1, "status": "not_configured"}]
            })
        );
    }

    #[test]
    fn test_plain_result_omits_timed_lyrics() {
        let result = LyricsResult {
            source: ProviderId::LyricsOvh,
            artist: "A".to_string(),
            title: "B".to_string(),
            lyrics: Lyrics::Plain("words".to_string()),
            attempts: Vec::new(),
            retrieved_at: Utc::now(),
        };
        let value = serde_json::to_value(SuccessEnvelope::from(&result)).unwrap();
        assert!(value["data"].get("timed_lyrics").is_none());
        assert_eq!(value["data"]["hasTimestamps"], json!(false));
        assert_eq!(value["attempts"], json!([]));
    }
}
