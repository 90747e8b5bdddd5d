//! Core lyrics services
//!
//! - `discovery`: cache-first provider fallback
//! - `quality`: acceptance rules for provider lyrics
//! - `frameworks`: versioned prompt templates
//! - `analyzer`: cached LLM analysis
//! - `song`: discover-then-analyze

pub mod analyzer;
pub mod discovery;
pub mod frameworks;
pub mod quality;
pub mod song;

pub use analyzer::{AnalysisEngine, AnalysisError, LYRICS_PLACEHOLDER, SYSTEM_PROMPT};
pub use discovery::DiscoveryEngine;
pub use frameworks::{Framework, FrameworkInfo, FrameworkRegistry};
pub use quality::{is_valid_lyrics, validate_lyrics, QualityIssue};
pub use song::{analyze_song, SongAnalysis};
