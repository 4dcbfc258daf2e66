//! Conversion of provider lyric bodies into the canonical [`Lyrics`] shape.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::core::model::{Lyrics, TimedLine};

/// End time given to a final line when nothing else bounds it.
pub const FALLBACK_LINE_DURATION_MS: u64 = 5000;

/// Lyrics as an upstream returned them.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLyrics {
    Plain(String),
    /// LRC text, optionally with the track length reported by the provider.
    Lrc {
        text: String,
        track_duration_ms: Option<u64>,
        /// Plain lyrics from the same response, used if no tag parses.
        plain_fallback: Option<String>,
    },
    /// Lines with explicit millisecond offsets.
    Millis(Vec<RawTimedLine>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTimedLine {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: Option<u64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("provider returned empty lyrics")]
    Empty,
}

/// Provider-specific cleanup applied before lines are numbered.
#[derive(Debug, Clone, Default)]
pub struct MarkupRules {
    /// Drop whole-line `[Verse 1]`, `[Chorus]` style headers.
    pub strip_section_headers: bool,
    /// Drop the first non-empty line if it matches.
    pub leading_header: Option<Regex>,
    /// Cut the text at the first match.
    pub trailer: Option<Regex>,
}

impl MarkupRules {
    pub fn none() -> Self {
        Self::default()
    }
}

fn lrc_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\[(\d{1,3}):(\d{1,2})(?:[.:](\d{1,3}))?\]((?:\[\d{1,3}:\d{1,2}(?:[.:]\d{1,3})?\])*)(.*)$")
            .expect("static LRC pattern is valid")
    })
}

fn section_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\[[^\]]*\]\s*$").expect("static header pattern is valid"))
}

pub fn normalize(raw: RawLyrics, rules: &MarkupRules) -> Result<Lyrics, NormalizeError> {
    match raw {
        RawLyrics::Plain(text) => normalize_plain(&text, rules),
        RawLyrics::Lrc {
            text,
            track_duration_ms,
            plain_fallback,
        } => {
            let stamps = parse_lrc(&text);
            let lines = finish_lines(stamps, track_duration_ms, rules);
            if !lines.is_empty() {
                return Ok(Lyrics::Timed(lines));
            }
            match plain_fallback {
                Some(plain) => normalize_plain(&plain, rules),
                None => Err(NormalizeError::Empty),
            }
        }
        RawLyrics::Millis(raw_lines) => {
            let stamps = raw_lines
                .into_iter()
                .map(|l| Stamp {
                    start_ms: l.start_ms,
                    end_ms: l.end_ms,
                    text: l.text,
                })
                .collect();
            let lines = finish_lines(stamps, None, rules);
            if lines.is_empty() {
                Err(NormalizeError::Empty)
            } else {
                Ok(Lyrics::Timed(lines))
            }
        }
    }
}

fn normalize_plain(text: &str, rules: &MarkupRules) -> Result<Lyrics, NormalizeError> {
    let mut text = text.replace("\r\n", "\n").replace('\r', "\n");
    if let Some(trailer) = &rules.trailer {
        if let Some(m) = trailer.find(&text) {
            text.truncate(m.start());
        }
    }

    let mut lines: Vec<&str> = Vec::new();
    let mut header_checked = rules.leading_header.is_none();
    for line in text.lines() {
        let line = line.trim_end();
        if !header_checked && !line.trim().is_empty() {
            header_checked = true;
            if rules
                .leading_header
                .as_ref()
                .is_some_and(|re| re.is_match(line))
            {
                continue;
            }
        }
        if is_markup(line, rules) {
            continue;
        }
        lines.push(line);
    }

    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return Err(NormalizeError::Empty);
    }
    Ok(Lyrics::Plain(lines.join("\n")))
}

fn is_markup(line: &str, rules: &MarkupRules) -> bool {
    rules.strip_section_headers && section_header_re().is_match(line)
}

/// A timed line before end times and indices are settled. Empty text marks
/// a boundary that is not emitted.
#[derive(Debug)]
struct Stamp {
    start_ms: u64,
    end_ms: Option<u64>,
    text: String,
}

fn parse_lrc(text: &str) -> Vec<Stamp> {
    let re = lrc_line_re();
    let mut stamps = Vec::new();
    for line in text.lines() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let (Ok(minutes), Ok(seconds)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) else {
            continue;
        };
        let fraction_ms = caps.get(3).map_or(0, |m| fraction_to_ms(m.as_str()));
        stamps.push(Stamp {
            start_ms: (minutes * 60 + seconds) * 1000 + fraction_ms,
            end_ms: None,
            text: caps[5].trim().to_string(),
        });
    }
    stamps
}

/// `"5"` is tenths, `"05"` hundredths, `"005"` milliseconds.
fn fraction_to_ms(digits: &str) -> u64 {
    let value: u64 = digits.parse().unwrap_or(0);
    match digits.len() {
        1 => value * 100,
        2 => value * 10,
        _ => value,
    }
}

fn finish_lines(
    stamps: Vec<Stamp>,
    track_duration_ms: Option<u64>,
    rules: &MarkupRules,
) -> Vec<TimedLine> {
    let mut lines = Vec::new();
    for (i, stamp) in stamps.iter().enumerate() {
        if stamp.text.is_empty() || is_markup(&stamp.text, rules) {
            continue;
        }
        let start = stamp.start_ms;
        let end = match stamp.end_ms {
            Some(end) => end.max(start),
            None => match stamps.get(i + 1) {
                Some(next) => next.start_ms.saturating_sub(1).max(start),
                None => match track_duration_ms {
                    Some(total) if total > start => total,
                    _ => start.saturating_add(FALLBACK_LINE_DURATION_MS),
                },
            },
        };
        lines.push(TimedLine {
            text: stamp.text.clone(),
            start_ms: start,
            end_ms: end,
            index: lines.len() as u32 + 1,
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lrc(text: &str) -> RawLyrics {
        RawLyrics::Lrc {
            text: text.to_string(),
            track_duration_ms: None,
            plain_fallback: None,
        }
    }

    fn assert_invariants(lyrics: &Lyrics) {
        let lines = lyrics.timed_lines().expect("timed");
        for (i, line) in lines.iter().enumerate() {
            assert!(line.start_ms <= line.end_ms, "line {} ends before it starts", i);
            assert_eq!(line.index as usize, i + 1);
        }
        let joined: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lyrics.plain_text(), joined.join("\n"));
    }

    #[test]
    fn test_lrc_end_times_follow_next_start() {
        let lyrics = normalize(
            lrc("[ar: Someone]\n[00:01.50]First\n[00:04.25]Second\n[01:00.5]Third"),
            &MarkupRules::none(),
        )
        .unwrap();
        let lines = lyrics.timed_lines().unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!((lines[0].start_ms, lines[0].end_ms), (1500, 4249));
        assert_eq!((lines[1].start_ms, lines[1].end_ms), (4250, 60_499));
        assert_eq!(lines[2].start_ms, 60_500);
        assert_eq!(lines[2].end_ms, 60_500 + FALLBACK_LINE_DURATION_MS);
        assert_invariants(&lyrics);
    }

    #[test]
    fn test_lrc_blank_tag_is_a_boundary_only() {
        let lyrics = normalize(lrc("[00:01.00]Hello\n[00:03.00]\n[00:10.000]World"), &MarkupRules::none()).unwrap();
        let lines = lyrics.timed_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].end_ms, 2999);
        assert_eq!(lines[1].index, 2);
        assert_eq!(lyrics.plain_text(), "Hello\nWorld");
    }

    #[test]
    fn test_lrc_keeps_provider_order_and_first_tag() {
        let lyrics = normalize(lrc("[00:20.00]Later\n[00:05.00][00:30.00]Earlier"), &MarkupRules::none()).unwrap();
        let lines = lyrics.timed_lines().unwrap();
        assert_eq!(lines[0].text, "Later");
        assert_eq!(lines[1].text, "Earlier");
        assert_eq!(lines[0].end_ms, 20_000);
        assert_invariants(&lyrics);
    }

    #[test]
    fn test_lrc_final_line_uses_track_duration() {
        let raw = RawLyrics::Lrc {
            text: "[00:01.00]Only line".to_string(),
            track_duration_ms: Some(180_000),
            plain_fallback: None,
        };
        let lyrics = normalize(raw, &MarkupRules::none()).unwrap();
        assert_eq!(lyrics.timed_lines().unwrap()[0].end_ms, 180_000);
    }

    #[test]
    fn test_lrc_without_tags_falls_back_to_plain() {
        let raw = RawLyrics::Lrc {
            text: "no tags here".to_string(),
            track_duration_ms: None,
            plain_fallback: Some("Plain one\nPlain two\n".to_string()),
        };
        assert_eq!(
            normalize(raw, &MarkupRules::none()).unwrap(),
            Lyrics::Plain("Plain one\nPlain two".to_string())
        );
        assert_eq!(normalize(lrc("nothing"), &MarkupRules::none()), Err(NormalizeError::Empty));
    }

    #[test]
    fn test_millis_pairs_fill_and_clamp() {
        let raw = RawLyrics::Millis(vec![
            RawTimedLine { text: "a".into(), start_ms: 100, end_ms: Some(50) },
            RawTimedLine { text: "b".into(), start_ms: 900, end_ms: None },
            RawTimedLine { text: "c".into(), start_ms: 2000, end_ms: Some(2500) },
        ]);
        let lyrics = normalize(raw, &MarkupRules::none()).unwrap();
        let lines = lyrics.timed_lines().unwrap();
        assert_eq!(lines[0].end_ms, 100);
        assert_eq!(lines[1].end_ms, 1999);
        assert_eq!(lines[2].end_ms, 2500);
        assert_invariants(&lyrics);
    }

    #[test]
    fn test_final_line_end_saturates() {
        let raw = RawLyrics::Millis(vec![
            RawTimedLine { text: "a".into(), start_ms: 1000, end_ms: None },
            RawTimedLine { text: "b".into(), start_ms: u64::MAX - 10, end_ms: None },
        ]);
        let lyrics = normalize(raw, &MarkupRules::none()).unwrap();
        let lines = lyrics.timed_lines().unwrap();
        assert_eq!(lines[1].start_ms, u64::MAX - 10);
        assert_eq!(lines[1].end_ms, u64::MAX);
        assert_invariants(&lyrics);
    }

    #[test]
    fn test_plain_markup_rules() {
        let rules = MarkupRules {
            strip_section_headers: true,
            leading_header: Some(Regex::new(r"^Paroles de la chanson").unwrap()),
            trailer: Some(Regex::new(r"(?is)\n*Submit Corrections.*").unwrap()),
        };
        let text = "Paroles de la chanson Hello par Adele\r\n[Verse 1]\r\nHello, it's me  \r\n\r\nI was wondering\n\nSubmit Corrections\nfooter";
        assert_eq!(
            normalize(RawLyrics::Plain(text.to_string()), &rules).unwrap(),
            Lyrics::Plain("Hello, it's me\n\nI was wondering".to_string())
        );
    }

    #[test]
    fn test_plain_only_whitespace_is_empty() {
        assert_eq!(
            normalize(RawLyrics::Plain(" \n \r\n".to_string()), &MarkupRules::none()),
            Err(NormalizeError::Empty)
        );
    }
}
