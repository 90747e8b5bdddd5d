//! Secret resolution for lyricmind
//!
//! API keys and tokens may come from the environment or the TOML file.
//! Priority: ENV → TOML. Blank values count as absent.

use lyricmind_common::config::TomlConfig;
use tracing::{debug, warn};

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const GENIUS_TOKEN_ENV: &str = "GENIUS_TOKEN";
pub const MUSIXMATCH_API_KEY_ENV: &str = "MUSIXMATCH_API_KEY";

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one secret from the environment or the TOML value
///
/// **Priority:** ENV → TOML
pub fn resolve_secret(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_value = toml_value.filter(|k| is_valid_key(k));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in multiple sources: environment, TOML. Using environment (highest priority).",
            label
        );
    }

    if let Some(key) = env_value {
        debug!("{} loaded from environment variable {}", label, env_var);
        return Some(key.trim().to_string());
    }

    toml_value.map(|key| {
        debug!("{} loaded from TOML config", label);
        key.trim().to_string()
    })
}

/// Fold environment secrets into the loaded configuration
///
/// After this call every secret field holds the effective value (or `None`).
pub fn apply_env_overrides(config: &mut TomlConfig) {
    config.llm.openai_api_key = resolve_secret(
        "OpenAI API key",
        OPENAI_API_KEY_ENV,
        config.llm.openai_api_key.as_deref(),
    );
    config.llm.anthropic_api_key = resolve_secret(
        "Anthropic API key",
        ANTHROPIC_API_KEY_ENV,
        config.llm.anthropic_api_key.as_deref(),
    );
    config.providers.genius_token = resolve_secret(
        "Genius token",
        GENIUS_TOKEN_ENV,
        config.providers.genius_token.as_deref(),
    );
    config.providers.musixmatch_api_key = resolve_secret(
        "Musixmatch API key",
        MUSIXMATCH_API_KEY_ENV,
        config.providers.musixmatch_api_key.as_deref(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_resolve_secret_toml_only() {
        let key = resolve_secret("Test key", "LYRICMIND_TEST_UNSET_SECRET_VAR", Some(" toml-key "));
        assert_eq!(key.as_deref(), Some("toml-key"));
    }

    #[test]
    fn test_resolve_secret_blank_toml_is_absent() {
        let key = resolve_secret("Test key", "LYRICMIND_TEST_UNSET_SECRET_VAR", Some("  "));
        assert!(key.is_none());
    }
}
