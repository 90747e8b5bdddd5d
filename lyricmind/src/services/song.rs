//! Discover-then-analyze for one song

use crate::services::{AnalysisEngine, AnalysisError, DiscoveryEngine};
use crate::types::LyricsRecord;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Lyrics plus their analysis
#[derive(Debug, Clone, Serialize)]
pub struct SongAnalysis {
    pub lyrics: LyricsRecord,
    pub framework: String,
    pub analysis: Value,
}

/// Find lyrics for a song and analyze them
///
/// # Returns
/// `Ok(None)` when no lyrics were found; analysis is not attempted then
pub async fn analyze_song(
    discovery: &DiscoveryEngine,
    analyzer: &AnalysisEngine,
    artist: &str,
    title: &str,
    framework: Option<&str>,
    force_refresh: bool,
) -> Result<Option<SongAnalysis>, AnalysisError> {
    let Some(record) = discovery.search_lyrics(artist, title, force_refresh).await? else {
        info!(artist = %artist, title = %title, "No lyrics found, skipping analysis");
        return Ok(None);
    };

    let framework = framework
        .unwrap_or(analyzer.default_framework())
        .to_string();
    let analysis = analyzer.analyze_lyrics(&record.lyrics, Some(&framework)).await?;

    Ok(Some(SongAnalysis {
        lyrics: record,
        framework,
        analysis,
    }))
}
