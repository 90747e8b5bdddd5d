//! Analysis framework registry
//!
//! A framework is a `.txt` prompt template. The file stem is the framework
//! name; an optional first line `# version: X.Y[.Z]` sets its version
//! (default "1.0"). The registry is loaded once at startup and never
//! mutated afterwards.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_FRAMEWORK_VERSION: &str = "1.0";
const VERSION_PREFIX: &str = "# version:";

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("valid regex"));

/// One loaded prompt template
#[derive(Debug, Clone, PartialEq)]
pub struct Framework {
    pub name: String,
    pub version: String,
    pub prompt: String,
    pub path: PathBuf,
}

/// Framework listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkInfo {
    pub name: String,
    pub version: String,
}

/// Immutable name → framework mapping
#[derive(Debug, Clone, Default)]
pub struct FrameworkRegistry {
    directory: PathBuf,
    frameworks: BTreeMap<String, Framework>,
}

/// Split an optional version line off a framework file
///
/// Returns `(version, prompt)`. Content is trimmed first. A malformed
/// version line is left in the prompt and the default version is used.
pub fn parse_framework_text(content: &str) -> (String, String) {
    let content = content.trim();
    let (first, rest) = content.split_once('\n').unwrap_or((content, ""));

    let has_prefix = first
        .get(..VERSION_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(VERSION_PREFIX));
    if has_prefix {
        let candidate = first[VERSION_PREFIX.len()..].trim();
        if VERSION_PATTERN.is_match(candidate) {
            return (candidate.to_string(), rest.trim().to_string());
        }
        warn!(line = %first, "Invalid framework version line, using default {}", DEFAULT_FRAMEWORK_VERSION);
    }

    (DEFAULT_FRAMEWORK_VERSION.to_string(), content.to_string())
}

impl FrameworkRegistry {
    /// Scan `directory` for `*.txt` framework files
    ///
    /// A missing directory yields an empty registry. Unreadable or empty
    /// files are skipped with a warning.
    pub fn load(directory: &Path) -> Self {
        let mut frameworks = BTreeMap::new();

        let entries = match std::fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    directory = %directory.display(),
                    error = %e,
                    "Framework directory not readable, no frameworks loaded"
                );
                return Self {
                    directory: directory.to_path_buf(),
                    frameworks,
                };
            }
        };

        info!(directory = %directory.display(), "Loading frameworks");

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Failed to read framework file");
                    continue;
                }
            };

            let (version, prompt) = parse_framework_text(&content);
            if prompt.is_empty() {
                warn!(framework = %name, file = %path.display(), "Framework prompt is empty, skipping");
                continue;
            }

            debug!(framework = %name, version = %version, "Loaded framework");
            frameworks.insert(
                name.clone(),
                Framework {
                    name,
                    version,
                    prompt,
                    path,
                },
            );
        }

        if frameworks.is_empty() {
            warn!(directory = %directory.display(), "No frameworks loaded, analysis is unavailable");
        } else {
            info!(count = frameworks.len(), "Frameworks loaded");
        }

        Self {
            directory: directory.to_path_buf(),
            frameworks,
        }
    }

    /// Build a registry from in-memory frameworks
    pub fn from_frameworks(frameworks: impl IntoIterator<Item = Framework>) -> Self {
        Self {
            directory: PathBuf::new(),
            frameworks: frameworks
                .into_iter()
                .map(|f| (f.name.clone(), f))
                .collect(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn get(&self, name: &str) -> Option<&Framework> {
        self.frameworks.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frameworks.len()
    }

    /// Framework names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.frameworks.keys().cloned().collect()
    }

    /// Name and version of every framework, sorted by name
    pub fn list(&self) -> Vec<FrameworkInfo> {
        self.frameworks
            .values()
            .map(|f| FrameworkInfo {
                name: f.name.clone(),
                version: f.version.clone(),
            })
            .collect()
    }

    /// Raw file text of a framework, re-read from disk
    pub fn source(&self, name: &str) -> Option<std::io::Result<String>> {
        self.frameworks
            .get(name)
            .map(|f| std::fs::read_to_string(&f.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_with_version_line() {
        let (version, prompt) = parse_framework_text("# Version: 2.1.3\nAnalyze [PASTE LYRICS HERE]\n");
        assert_eq!(version, "2.1.3");
        assert_eq!(prompt, "Analyze [PASTE LYRICS HERE]");
    }

    #[test]
    fn test_parse_without_version_line() {
        let (version, prompt) = parse_framework_text("\n\nAnalyze these lyrics\n");
        assert_eq!(version, "1.0");
        assert_eq!(prompt, "Analyze these lyrics");
    }

    #[test]
    fn test_parse_malformed_version_keeps_whole_text() {
        let (version, prompt) = parse_framework_text("# version: beta\nAnalyze");
        assert_eq!(version, "1.0");
        assert_eq!(prompt, "# version: beta\nAnalyze");
    }

    #[test]
    fn test_parse_version_only_file_is_empty_prompt() {
        let (version, prompt) = parse_framework_text("# version: 1.2\n");
        assert_eq!(version, "1.2");
        assert!(prompt.is_empty());
    }

    #[test]
    fn test_load_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vanilla.txt"), "# version: 1.0\nBasic [PASTE LYRICS HERE]").unwrap();
        fs::write(dir.path().join("deep.txt"), "Deep analysis").unwrap();
        fs::write(dir.path().join("empty.txt"), "# version: 3.0\n   \n").unwrap();
        fs::write(dir.path().join("notes.md"), "not a framework").unwrap();

        let registry = FrameworkRegistry::load(dir.path());

        assert_eq!(registry.names(), vec!["deep", "vanilla"]);
        assert_eq!(registry.get("vanilla").unwrap().version, "1.0");
        assert_eq!(registry.get("deep").unwrap().version, "1.0");
        assert!(registry.get("empty").is_none());
        assert!(registry.get("notes").is_none());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = FrameworkRegistry::load(&dir.path().join("absent"));
        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_source_returns_raw_text() {
        let dir = TempDir::new().unwrap();
        let raw = "# version: 1.1\nPrompt body";
        fs::write(dir.path().join("raw.txt"), raw).unwrap();

        let registry = FrameworkRegistry::load(dir.path());

        assert_eq!(registry.source("raw").unwrap().unwrap(), raw);
        assert!(registry.source("missing").is_none());
    }
}
