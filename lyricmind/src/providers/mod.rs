//! External lyrics providers
//!
//! Each provider wraps one lyrics source behind [`LyricsProvider`]. The
//! active set and its order are fixed at startup by [`build_providers`]:
//! credentialed sources first, the free source always last.

pub mod genius;
pub mod lyrics_ovh;
pub mod musixmatch;

pub use genius::GeniusProvider;
pub use lyrics_ovh::LyricsOvhProvider;
pub use musixmatch::MusixmatchProvider;

use crate::types::{LyricsProvider, ProviderError};
use lyricmind_common::config::ProvidersConfig;
use lyricmind_common::time;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const USER_AGENT: &str = concat!("lyricmind/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all providers
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Build the ordered provider list from resolved configuration
///
/// Order: Musixmatch (if keyed) → Genius (if keyed) → lyrics.ovh.
/// Secrets must already have environment overrides applied.
pub fn build_providers(
    config: &ProvidersConfig,
) -> Result<Vec<Arc<dyn LyricsProvider>>, ProviderError> {
    let client = http_client(time::secs_to_duration(config.timeout_seconds))?;
    let mut providers: Vec<Arc<dyn LyricsProvider>> = Vec::new();

    if let Some(key) = &config.musixmatch_api_key {
        providers.push(Arc::new(MusixmatchProvider::new(client.clone(), key.clone())));
    } else {
        info!("Musixmatch provider disabled (no API key)");
    }

    if let Some(token) = &config.genius_token {
        providers.push(Arc::new(GeniusProvider::new(client.clone(), token.clone())));
    } else {
        info!("Genius provider disabled (no token)");
    }

    providers.push(Arc::new(LyricsOvhProvider::new(client)));

    info!(
        providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "Lyrics providers initialized"
    );
    Ok(providers)
}

/// Local HTTP stand-ins for provider APIs
#[cfg(test)]
pub(crate) mod stub {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Bind a random local port; returns the listener and its base URL
    pub async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        (listener, format!("http://127.0.0.1:{}", port))
    }

    /// Serve `router` on `listener` in a background task
    pub fn spawn(listener: TcpListener, router: Router) {
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
    }

    /// Bind and serve in one step
    pub async fn serve(router: Router) -> String {
        let (listener, base_url) = bind().await;
        spawn(listener, router);
        base_url
    }

    pub fn client() -> reqwest::Client {
        super::http_client(std::time::Duration::from_secs(5)).expect("client")
    }
}
