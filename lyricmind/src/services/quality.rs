//! Lyrics quality validation
//!
//! Rejects placeholder, disclaimer and degenerate text returned by providers.
//! A rejected hit is skipped by the discovery engine, never stored.

use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Minimum trimmed length (in characters) for real lyrics
pub const MIN_LYRICS_CHARS: usize = 50;

/// Phrases that mark placeholder or disclaimer text (matched case-insensitively)
pub const DENYLIST: &[&str] = &[
    "lyrics not available",
    "instrumental",
    "no lyrics found",
    "sorry, we don't have",
    "we are not authorized",
    "lyrics are currently unavailable",
    "*******", // masked commercial-use disclaimer
    "not for commercial use",
];

/// Reason a lyrics text was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityIssue {
    Empty,
    TooShort { chars: usize },
    Denylisted { phrase: &'static str },
    ExcessiveRepetition { lines: usize, distinct: usize },
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityIssue::Empty => write!(f, "empty lyrics"),
            QualityIssue::TooShort { chars } => {
                write!(f, "too short ({} < {} chars)", chars, MIN_LYRICS_CHARS)
            }
            QualityIssue::Denylisted { phrase } => write!(f, "contains '{}'", phrase),
            QualityIssue::ExcessiveRepetition { lines, distinct } => {
                write!(f, "excessive repetition ({} distinct of {} lines)", distinct, lines)
            }
        }
    }
}

/// Validate a provider's lyrics text
pub fn validate_lyrics(lyrics: &str) -> Result<(), QualityIssue> {
    let stripped = lyrics.trim();
    if stripped.is_empty() {
        return Err(QualityIssue::Empty);
    }

    let chars = stripped.chars().count();
    if chars < MIN_LYRICS_CHARS {
        return Err(QualityIssue::TooShort { chars });
    }

    let lowered = stripped.to_lowercase();
    if let Some(phrase) = DENYLIST.iter().copied().find(|phrase| lowered.contains(phrase)) {
        return Err(QualityIssue::Denylisted { phrase });
    }

    // Repeated error banners: more than 5 lines and under half of them distinct
    let lines: Vec<&str> = stripped.split('\n').collect();
    if lines.len() > 5 {
        let distinct = lines.iter().collect::<HashSet<_>>().len();
        if distinct * 2 < lines.len() {
            return Err(QualityIssue::ExcessiveRepetition {
                lines: lines.len(),
                distinct,
            });
        }
    }

    Ok(())
}

/// Boolean form of [`validate_lyrics`], logging the rejection reason
pub fn is_valid_lyrics(lyrics: &str) -> bool {
    match validate_lyrics(lyrics) {
        Ok(()) => true,
        Err(issue) => {
            debug!(reason = %issue, "Lyrics rejected by quality validation");
            false
        }
    }
}
