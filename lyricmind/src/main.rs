//! lyricmind - lyrics discovery and analysis
//!
//! `serve` runs the HTTP API; the other subcommands run one operation
//! against the same caches and exit.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lyricmind::config::apply_env_overrides;
use lyricmind::services::{self, SYSTEM_PROMPT};
use lyricmind::types::LyricsRecord;
use lyricmind::{build_router, AppState};
use lyricmind_common::config::{LoggingConfig, TomlConfig};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Command-line arguments for lyricmind
#[derive(Parser, Debug)]
#[command(name = "lyricmind")]
#[command(about = "Find song lyrics and analyze them with an LLM")]
#[command(version, long_version = env!("LYRICMIND_BUILD_ID"))]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, env = "LYRICMIND_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Search lyrics for a song
    Search {
        artist: String,
        title: String,
        /// Skip the lyrics cache
        #[arg(long)]
        force_refresh: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Analyze lyrics from a text file
    Analyze {
        file: PathBuf,
        /// Framework name (default from config)
        #[arg(short, long)]
        framework: Option<String>,
    },
    /// Find lyrics for a song and analyze them
    AnalyzeSong {
        artist: String,
        title: String,
        #[arg(short, long)]
        framework: Option<String>,
        #[arg(long)]
        force_refresh: bool,
    },
    /// List active lyrics providers in search order
    Providers,
    /// List available analysis frameworks
    Frameworks,
    /// Delete cache entries older than the given number of days
    ClearCache {
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,
    },
    /// Send a trivial request to the configured LLM backend
    TestLlm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref(), std::io::stderr)?;
    init_logging(&config.logging)?;
    apply_env_overrides(&mut config);

    info!("lyricmind {} ({})", env!("CARGO_PKG_VERSION"), env!("LYRICMIND_BUILD_ID"));

    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialize services")?;

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.api.host.clone());
            let port = port.unwrap_or(config.api.port);
            serve(state, &host, port).await
        }
        Command::Search {
            artist,
            title,
            force_refresh,
            format,
        } => {
            match state
                .discovery
                .search_lyrics(&artist, &title, force_refresh)
                .await?
            {
                Some(record) => print_record(&record, format)?,
                None => println!("No lyrics found for '{} - {}'", artist, title),
            }
            Ok(())
        }
        Command::Analyze { file, framework } => {
            let lyrics = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let analysis = state
                .analyzer
                .analyze_lyrics(&lyrics, framework.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }
        Command::AnalyzeSong {
            artist,
            title,
            framework,
            force_refresh,
        } => {
            let result = services::analyze_song(
                &state.discovery,
                &state.analyzer,
                &artist,
                &title,
                framework.as_deref(),
                force_refresh,
            )
            .await?;
            match result {
                Some(song) => println!("{}", serde_json::to_string_pretty(&song)?),
                None => println!("No lyrics found for '{} - {}'", artist, title),
            }
            Ok(())
        }
        Command::Providers => {
            for (rank, provider) in state.discovery.providers().iter().enumerate() {
                println!(
                    "{}. {} (confidence {:.1}{})",
                    rank + 1,
                    provider.name,
                    provider.confidence,
                    if provider.requires_credentials { ", keyed" } else { "" }
                );
            }
            Ok(())
        }
        Command::Frameworks => {
            let registry = state.analyzer.frameworks();
            if registry.is_empty() {
                println!("No frameworks found in {}", registry.directory().display());
            }
            for framework in registry.list() {
                let marker = if framework.name == state.analyzer.default_framework() {
                    " (default)"
                } else {
                    ""
                };
                println!("{} v{}{}", framework.name, framework.version, marker);
            }
            Ok(())
        }
        Command::ClearCache { days } => {
            let counts = lyricmind::db::clear_old_cache(&state.db, days).await?;
            println!(
                "Deleted {} lyrics and {} analysis entries older than {} days",
                counts.lyrics_deleted, counts.analysis_deleted, days
            );
            Ok(())
        }
        Command::TestLlm => {
            let Some(llm) = state.analyzer.llm() else {
                bail!("LLM backend is not available: {}", state.issues.join("; "));
            };
            println!("Testing {} ({})...", llm.name(), llm.model());
            let response = llm
                .complete(SYSTEM_PROMPT, "Reply with the JSON object {\"status\": \"ok\"}.")
                .await
                .context("LLM request failed")?;
            println!("LLM responded: {:?}", response);
            Ok(())
        }
    }
}

/// Load configuration under a temporary subscriber
///
/// The configured subscriber depends on the file being loaded, so warnings
/// about a missing or defaulted config go to `writer` at info level.
fn load_config<W>(path: Option<&Path>, writer: W) -> Result<TomlConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::with_default(bootstrap, || TomlConfig::load(path))
        .context("Failed to load configuration")
}

/// Stderr logging plus an optional plain-text log file
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)))
    };

    let file_layer = match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter()),
        )
        .with(file_layer)
        .init();

    Ok(())
}

fn print_record(record: &LyricsRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Text => {
            println!("{} - {}", record.artist, record.title);
            match record.confidence() {
                Some(confidence) => println!("Source: {} (confidence {:.1})", record.source, confidence),
                None => println!("Source: {}", record.source),
            }
            println!();
            println!("{}", record.lyrics);
        }
    }
    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
