//! Sequential fallback over the configured providers.
//!
//! Providers are tried strictly one after another. Each adapter call runs on
//! its own task bounded by the provider timeout; if the caller's future is
//! dropped the in-flight task is left to finish against its own HTTP timeout.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::model::{
    parse_sequence, Attempt, AttemptStatus, Lyrics, LyricsResult, ProviderId, Query, TimingMode,
};
use crate::core::normalizer::{normalize, NormalizeError};
use crate::core::services::{LyricsProvider, ProviderError, ProviderHit, ProviderRegistry};
use crate::error::{LyricsError, Result};

pub const DEFAULT_PLAIN_SEQUENCE: [ProviderId; 7] = [
    ProviderId::Genius,
    ProviderId::Lrclib,
    ProviderId::SimpMusic,
    ProviderId::YoutubeMusic,
    ProviderId::LyricsOvh,
    ProviderId::ChartLyrics,
    ProviderId::LyricsFreek,
];

pub const DEFAULT_TIMED_SEQUENCE: [ProviderId; 7] = [
    ProviderId::Lrclib,
    ProviderId::SimpMusic,
    ProviderId::YoutubeMusic,
    ProviderId::Genius,
    ProviderId::LyricsOvh,
    ProviderId::ChartLyrics,
    ProviderId::LyricsFreek,
];

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub provider_timeout: Duration,
    /// Budget for the whole sequence. `None` means unbounded.
    pub request_deadline: Option<Duration>,
    pub plain_sequence: Vec<ProviderId>,
    pub timed_sequence: Vec<ProviderId>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(12),
            request_deadline: Some(Duration::from_secs(60)),
            plain_sequence: DEFAULT_PLAIN_SEQUENCE.to_vec(),
            timed_sequence: DEFAULT_TIMED_SEQUENCE.to_vec(),
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            provider_timeout: Duration::from_secs(config.provider_timeout_secs),
            request_deadline: Some(Duration::from_secs(config.request_deadline_secs)),
            plain_sequence: parse_sequence(&config.plain_sequence)?,
            timed_sequence: parse_sequence(&config.timed_sequence)?,
        })
    }
}

pub struct Orchestrator {
    registry: ProviderRegistry,
    settings: EngineSettings,
}

impl Orchestrator {
    pub fn new(registry: ProviderRegistry, settings: EngineSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The override if the query carries one, else the default for its timing mode.
    pub fn resolve_sequence(&self, query: &Query) -> Vec<ProviderId> {
        if let Some(sequence) = query.sequence_override() {
            return sequence.to_vec();
        }
        if query.wants_timestamps() {
            self.settings.timed_sequence.clone()
        } else {
            self.settings.plain_sequence.clone()
        }
    }

    /// Walk the sequence until a provider yields acceptable lyrics.
    ///
    /// On success the result carries the attempts made before the winner. When
    /// every provider fails the error carries one attempt per provider, in order.
    pub async fn resolve(&self, query: &Query) -> Result<LyricsResult> {
        let sequence = self.resolve_sequence(query);
        let timing = query.timing();
        let deadline = self.settings.request_deadline.map(|d| Instant::now() + d);
        let mut attempts = Vec::with_capacity(sequence.len());

        info!(
            "Resolving '{}' by '{}' (timing: {:?}, {} providers)",
            query.title(),
            query.artist(),
            timing,
            sequence.len()
        );

        for id in sequence {
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        attempts.push(Attempt::new(
                            id,
                            AttemptStatus::Error,
                            Some("request deadline exceeded".to_string()),
                        ));
                        continue;
                    }
                    Some(deadline - now)
                }
                None => None,
            };

            let Some(provider) = self.registry.get(id) else {
                debug!("{} is not configured", id.display_name());
                attempts.push(Attempt::new(id, AttemptStatus::NotConfigured, None));
                continue;
            };

            if timing == TimingMode::Required && !provider.supports_timestamps() {
                attempts.push(Attempt::new(
                    id,
                    AttemptStatus::Unsupported,
                    Some("provider does not supply timed lyrics".to_string()),
                ));
                continue;
            }

            let timeout = remaining.map_or(self.settings.provider_timeout, |r| {
                r.min(self.settings.provider_timeout)
            });
            let started = Instant::now();
            let outcome = call_provider(Arc::clone(&provider), query, timeout).await;
            let elapsed = started.elapsed();

            let hit = match outcome {
                Ok(hit) => hit,
                Err(err) => {
                    let attempt = attempt_from_error(id, err);
                    info!("{} -> {:?} in {:?}", id.display_name(), attempt.status, elapsed);
                    attempts.push(attempt);
                    continue;
                }
            };

            let (found_artist, found_title) = (hit.artist, hit.title);
            let lyrics = match normalize(hit.body, provider.markup_rules()) {
                Ok(lyrics) => lyrics,
                Err(NormalizeError::Empty) => {
                    info!("{} -> empty lyrics in {:?}", id.display_name(), elapsed);
                    attempts.push(Attempt::new(
                        id,
                        AttemptStatus::NoResults,
                        Some(NormalizeError::Empty.to_string()),
                    ));
                    continue;
                }
            };

            let lyrics = match timing {
                TimingMode::Required if !lyrics.has_timestamps() => {
                    info!("{} -> untimed lyrics in {:?}", id.display_name(), elapsed);
                    attempts.push(Attempt::new(
                        id,
                        AttemptStatus::Unsupported,
                        Some("provider returned lyrics without timestamps".to_string()),
                    ));
                    continue;
                }
                TimingMode::Off if lyrics.has_timestamps() => Lyrics::Plain(lyrics.plain_text()),
                _ => lyrics,
            };

            info!(
                "{} -> success in {:?} (timed: {})",
                id.display_name(),
                elapsed,
                lyrics.has_timestamps()
            );
            return Ok(LyricsResult {
                source: id,
                artist: found_artist.unwrap_or_else(|| query.artist().to_string()),
                title: found_title.unwrap_or_else(|| query.title().to_string()),
                lyrics,
                attempts,
                retrieved_at: Utc::now(),
            });
        }

        warn!(
            "No provider matched '{}' by '{}' after {} attempts",
            query.title(),
            query.artist(),
            attempts.len()
        );
        Err(LyricsError::NotFound {
            artist: query.artist().to_string(),
            title: query.title().to_string(),
            attempts,
        }
        .into())
    }
}

async fn call_provider(
    provider: Arc<dyn LyricsProvider>,
    query: &Query,
    timeout: Duration,
) -> std::result::Result<ProviderHit, ProviderError> {
    let artist = query.artist().to_string();
    let title = query.title().to_string();
    let want_timestamps = query.wants_timestamps();

    let handle =
        tokio::spawn(async move { provider.fetch(&artist, &title, want_timestamps).await });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ProviderError::Unavailable(format!(
            "provider task failed: {}",
            join_err
        ))),
        Err(_) => Err(ProviderError::Unavailable(format!("timed out after {:?}", timeout))),
    }
}

fn attempt_from_error(id: ProviderId, err: ProviderError) -> Attempt {
    match err {
        ProviderError::NotFound => Attempt::new(id, AttemptStatus::NoResults, None),
        ProviderError::Unavailable(msg) => Attempt::new(id, AttemptStatus::Error, Some(msg)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::normalizer::RawLyrics;
    use crate::error::LyricaError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process provider with a fixed answer and a call counter.
    pub(crate) struct ScriptedProvider {
        id: ProviderId,
        timed: bool,
        delay: Option<Duration>,
        answer: std::result::Result<ProviderHit, ProviderError>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(id: ProviderId, answer: std::result::Result<ProviderHit, ProviderError>) -> Self {
            Self {
                id,
                timed: id.supports_timestamps(),
                delay: None,
                answer,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn plain(id: ProviderId, text: &str) -> Self {
            Self::new(id, Ok(ProviderHit::new(RawLyrics::Plain(text.to_string()))))
        }

        pub(crate) fn lrc(id: ProviderId, text: &str) -> Self {
            Self::new(
                id,
                Ok(ProviderHit::new(RawLyrics::Lrc {
                    text: text.to_string(),
                    track_duration_ms: None,
                    plain_fallback: None,
                })),
            )
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl LyricsProvider for ScriptedProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn supports_timestamps(&self) -> bool {
            self.timed
        }

        async fn fetch(&self, _: &str, _: &str, _: bool) -> std::result::Result<ProviderHit, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answer.clone()
        }
    }

    fn engine(providers: Vec<ScriptedProvider>, sequence: &[ProviderId]) -> Orchestrator {
        let mut registry = ProviderRegistry::new();
        for p in providers {
            registry.register(Arc::new(p));
        }
        Orchestrator::new(
            registry,
            EngineSettings {
                provider_timeout: Duration::from_secs(2),
                request_deadline: None,
                plain_sequence: sequence.to_vec(),
                timed_sequence: sequence.to_vec(),
            },
        )
    }

    fn query() -> Query {
        Query::new("Adele", "Hello").unwrap()
    }

    fn not_found_attempts(err: LyricaError) -> Vec<Attempt> {
        match err {
            LyricaError::Lyrics(LyricsError::NotFound { attempts, .. }) => attempts,
            other => panic!("expected not found, got {:?}", other),
        }
    }

    const SEQ: [ProviderId; 3] = [ProviderId::LyricsOvh, ProviderId::Lrclib, ProviderId::ChartLyrics];

    #[tokio::test]
    async fn test_falls_back_to_next_provider() {
        let p1 = ScriptedProvider::new(ProviderId::LyricsOvh, Err(ProviderError::NotFound));
        let p2 = ScriptedProvider::plain(ProviderId::Lrclib, "Hello, it's me");
        let p3 = ScriptedProvider::plain(ProviderId::ChartLyrics, "never");
        let (c1, c2, c3) = (p1.counter(), p2.counter(), p3.counter());

        let result = engine(vec![p1, p2, p3], &SEQ).resolve(&query()).await.unwrap();

        assert_eq!(result.source, ProviderId::Lrclib);
        assert_eq!(result.lyrics, Lyrics::Plain("Hello, it's me".to_string()));
        assert_eq!(result.attempts, vec![Attempt::new(ProviderId::LyricsOvh, AttemptStatus::NoResults, None)]);
        assert_eq!(result.artist, "Adele");
        assert_eq!(
            (c1.load(Ordering::SeqCst), c2.load(Ordering::SeqCst), c3.load(Ordering::SeqCst)),
            (1, 1, 0)
        );
    }

    #[tokio::test]
    async fn test_all_failures_are_logged_in_order() {
        let providers = vec![
            ScriptedProvider::new(ProviderId::LyricsOvh, Err(ProviderError::NotFound)),
            ScriptedProvider::new(ProviderId::Lrclib, Err(ProviderError::Unavailable("HTTP 502".into()))),
            ScriptedProvider::plain(ProviderId::ChartLyrics, "   \n  "),
        ];
        let err = engine(providers, &SEQ).resolve(&query()).await.unwrap_err();
        let attempts = not_found_attempts(err);

        let summary: Vec<(ProviderId, AttemptStatus)> = attempts.iter().map(|a| (a.provider, a.status)).collect();
        assert_eq!(
            summary,
            vec![
                (ProviderId::LyricsOvh, AttemptStatus::NoResults),
                (ProviderId::Lrclib, AttemptStatus::Error),
                (ProviderId::ChartLyrics, AttemptStatus::NoResults),
            ]
        );
        assert_eq!(attempts[1].message.as_deref(), Some("HTTP 502"));
    }

    #[tokio::test]
    async fn test_missing_adapter_is_not_configured() {
        let providers = vec![ScriptedProvider::plain(ProviderId::Lrclib, "text")];
        let sequence = [ProviderId::Genius, ProviderId::Lrclib];
        let result = engine(providers, &sequence).resolve(&query()).await.unwrap();
        assert_eq!(
            result.attempts,
            vec![Attempt::new(ProviderId::Genius, AttemptStatus::NotConfigured, None)]
        );
    }

    #[tokio::test]
    async fn test_required_timing_skips_untimed_sources() {
        let ovh = ScriptedProvider::plain(ProviderId::LyricsOvh, "plain");
        let ovh_calls = ovh.counter();
        let lrclib = ScriptedProvider::plain(ProviderId::Lrclib, "plain from a timed source");
        let simp = ScriptedProvider::lrc(ProviderId::SimpMusic, "[00:01.00]Hello\n[00:02.00]World");
        let sequence = [ProviderId::LyricsOvh, ProviderId::Lrclib, ProviderId::SimpMusic];

        let q = query().with_timing(TimingMode::Required);
        let result = engine(vec![ovh, lrclib, simp], &sequence).resolve(&q).await.unwrap();

        assert_eq!(result.source, ProviderId::SimpMusic);
        assert!(result.has_timestamps());
        assert_eq!(ovh_calls.load(Ordering::SeqCst), 0);
        let statuses: Vec<AttemptStatus> = result.attempts.iter().map(|a| a.status).collect();
        assert_eq!(statuses, vec![AttemptStatus::Unsupported, AttemptStatus::Unsupported]);
    }

    #[tokio::test]
    async fn test_preferred_timing_accepts_plain() {
        let providers = vec![ScriptedProvider::plain(ProviderId::Lrclib, "plain only")];
        let q = query().with_timing(TimingMode::Preferred);
        let result = engine(providers, &[ProviderId::Lrclib]).resolve(&q).await.unwrap();
        assert!(!result.has_timestamps());
    }

    #[tokio::test]
    async fn test_off_mode_downgrades_timed_lyrics() {
        let providers = vec![ScriptedProvider::lrc(ProviderId::Lrclib, "[00:01.00]Hello\n[00:02.00]World")];
        let result = engine(providers, &[ProviderId::Lrclib]).resolve(&query()).await.unwrap();
        assert_eq!(result.lyrics, Lyrics::Plain("Hello\nWorld".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let slow = ScriptedProvider::plain(ProviderId::LyricsOvh, "late").with_delay(Duration::from_secs(30));
        let fast = ScriptedProvider::plain(ProviderId::Lrclib, "on time");
        let result = engine(vec![slow, fast], &[ProviderId::LyricsOvh, ProviderId::Lrclib])
            .resolve(&query())
            .await
            .unwrap();

        assert_eq!(result.source, ProviderId::Lrclib);
        assert_eq!(result.attempts[0].status, AttemptStatus::Error);
        assert!(result.attempts[0]
            .message
            .as_deref()
            .is_some_and(|m| m.starts_with("timed out after")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_stops_remaining_providers() {
        let slow = ScriptedProvider::plain(ProviderId::LyricsOvh, "late").with_delay(Duration::from_secs(30));
        let next = ScriptedProvider::plain(ProviderId::Lrclib, "never");
        let next_calls = next.counter();
        let mut orchestrator = engine(vec![slow, next], &[ProviderId::LyricsOvh, ProviderId::Lrclib]);
        orchestrator.settings.provider_timeout = Duration::from_secs(10);
        orchestrator.settings.request_deadline = Some(Duration::from_secs(5));

        let attempts = not_found_attempts(orchestrator.resolve(&query()).await.unwrap_err());

        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[1].message.as_deref(), Some("request deadline exceeded"));
        assert_eq!(next_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_override_sequence_wins_and_metadata_falls_back() {
        let hit = ProviderHit::new(RawLyrics::Plain("text".into())).with_metadata(Some("ADELE".into()), None);
        let providers = vec![
            ScriptedProvider::plain(ProviderId::LyricsOvh, "default"),
            ScriptedProvider::new(ProviderId::ChartLyrics, Ok(hit)),
        ];
        let q = query().with_sequence(vec![ProviderId::ChartLyrics]);
        let orchestrator = engine(providers, &SEQ);
        assert_eq!(orchestrator.resolve_sequence(&q), vec![ProviderId::ChartLyrics]);

        let result = orchestrator.resolve(&q).await.unwrap();
        assert_eq!(result.source, ProviderId::ChartLyrics);
        assert_eq!(result.artist, "ADELE");
        assert_eq!(result.title, "Hello");
    }

    #[test]
    fn test_default_sequences() {
        let orchestrator = Orchestrator::new(ProviderRegistry::new(), EngineSettings::default());
        let plain: Vec<u8> = orchestrator.resolve_sequence(&query()).iter().map(|p| p.number()).collect();
        assert_eq!(plain, vec![1, 2, 3, 4, 5, 6, 7]);
        let timed: Vec<u8> = orchestrator
            .resolve_sequence(&query().with_timing(TimingMode::Preferred))
            .iter()
            .map(|p| p.number())
            .collect();
        assert_eq!(timed, vec![2, 3, 4, 1, 5, 6, 7]);
    }
}
