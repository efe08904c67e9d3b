//! Tubescope - comment statistics for YouTube videos.
//!
//! Runs the HTTP API consumed by the browser extension, or analyzes a
//! single video from the command line with `--analyze <VIDEO_ID>`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tubescope_core::source::{TextFormat, DEFAULT_ENDPOINT};
use tubescope_core::{AnalysisConfig, AnalysisFacade, LexiconSource, RetryPolicy, SourceConfig};
use tubescope_server::{AppState, Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};

/// Tubescope - sentiment, emotion, and derision statistics for YouTube comments
#[derive(Parser, Debug)]
#[command(name = "tubescope", version, about)]
struct Args {
    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Host to bind the API server to
    #[arg(long, env = "TUBESCOPE_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port to bind the API server to
    #[arg(long, env = "TUBESCOPE_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Base URL of the YouTube Data API
    #[arg(long, env = "TUBESCOPE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Comment threads requested per page (1-100)
    #[arg(long, env = "TUBESCOPE_PAGE_SIZE", default_value_t = 100)]
    page_size: u32,

    /// Request plain text instead of HTML-formatted comment text
    #[arg(long, env = "TUBESCOPE_PLAIN_TEXT")]
    plain_text: bool,

    /// Stop after this many pages (0 = no limit)
    #[arg(long, env = "TUBESCOPE_MAX_PAGES")]
    max_pages: Option<u32>,

    /// Deadline for fetching all pages of one video, in seconds
    #[arg(long, env = "TUBESCOPE_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Total attempts per page request, including the first
    #[arg(long, env = "TUBESCOPE_RETRY_ATTEMPTS", default_value_t = 3)]
    retry_attempts: u32,

    /// Base retry delay in milliseconds (doubles on each retry)
    #[arg(long, env = "TUBESCOPE_RETRY_BASE_MS", default_value_t = 500)]
    retry_base_ms: u64,

    /// JSON sentiment lexicon (default: built in)
    #[arg(long, env = "TUBESCOPE_SENTIMENT_LEXICON")]
    sentiment_lexicon: Option<PathBuf>,

    /// JSON emotion lexicon (default: built in)
    #[arg(long, env = "TUBESCOPE_EMOTION_LEXICON")]
    emotion_lexicon: Option<PathBuf>,

    /// JSON derision cue list (default: built in)
    #[arg(long, env = "TUBESCOPE_DERISION_LEXICON")]
    derision_lexicon: Option<PathBuf>,

    /// Build all classifiers at startup instead of on first request
    #[arg(long, env = "TUBESCOPE_PRELOAD")]
    preload: bool,

    /// Analyze one video, print the statistics as JSON, and exit
    #[arg(long, env = "TUBESCOPE_ANALYZE", value_name = "VIDEO_ID")]
    analyze: Option<String>,

    /// Enable debug logging
    #[arg(long, env = "TUBESCOPE_DEBUG")]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, env = "TUBESCOPE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Also write daily-rotated log files to this directory
    #[arg(long, env = "TUBESCOPE_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn source_config(&self) -> SourceConfig {
        let retry = RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_ms),
            RetryPolicy::default().max_delay,
        )
        .with_jitter(true);

        let mut config = SourceConfig::new(self.api_key.clone())
            .with_endpoint(self.endpoint.clone())
            .with_page_size(self.page_size)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(retry);
        if self.plain_text {
            config = config.with_text_format(TextFormat::PlainText);
        }
        if let Some(max_pages) = self.max_pages {
            config = config.with_max_pages(max_pages);
        }
        config
    }

    fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig::default()
            .with_sentiment_lexicon(LexiconSource::from_path(self.sentiment_lexicon.clone()))
            .with_emotion_lexicon(LexiconSource::from_path(self.emotion_lexicon.clone()))
            .with_derision_lexicon(LexiconSource::from_path(self.derision_lexicon.clone()))
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig::default()
            .with_host(self.host.clone())
            .with_port(self.port)
    }
}

/// Initialize logging, with file rotation when a log directory is given.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tubescope={level},tubescope_core={level},tubescope_server={level},warn",
            level = log_level
        ))
    });

    if let Some(log_dir) = &args.log_dir {
        if std::fs::create_dir_all(log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("tubescope")
                .filename_suffix("log")
                .build(log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::info!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        tracing::warn!("File logging unavailable in {:?}, using console only", log_dir);
        return None;
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&args);

    tracing::info!("Starting Tubescope...");

    let analysis = Arc::new(AnalysisFacade::new(args.analysis_config()));
    if args.preload {
        let preload_facade = Arc::clone(&analysis);
        let failures = tokio::task::spawn_blocking(move || preload_facade.preload())
            .await
            .context("classifier preload task failed")?;
        for failure in &failures {
            tracing::warn!("{}", failure);
        }
        if failures.is_empty() {
            tracing::info!("All classifiers loaded");
        }
    }

    let state = AppState::youtube(args.source_config(), Arc::clone(&analysis))
        .context("failed to set up the comment source")?;

    if let Some(video_id) = &args.analyze {
        return analyze_once(&state, video_id).await;
    }

    let server = Server::with_state(args.server_config(), state)?;
    server.run().await?;

    tracing::info!("Tubescope shutting down");
    Ok(())
}

/// Fetches one video's comments and prints the statistics to stdout.
async fn analyze_once(state: &AppState, video_id: &str) -> anyhow::Result<()> {
    let batch = state
        .source
        .fetch_comments(video_id)
        .await
        .with_context(|| format!("failed to fetch comments for {video_id}"))?;

    let analysis = Arc::clone(&state.analysis);
    let summary = tokio::task::spawn_blocking(move || analysis.analyze_all(&batch))
        .await
        .context("analysis task failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "video_id": video_id.trim(),
            "analysis": summary,
        }))?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Drops every variable the CLI reads so defaults come from the flags alone.
    fn clear_env() {
        let ours: Vec<_> = std::env::vars_os()
            .map(|(key, _)| key)
            .filter(|key| {
                key.to_str().is_some_and(|k| {
                    k.starts_with("TUBESCOPE_") || k == "YOUTUBE_API_KEY"
                })
            })
            .collect();
        for key in ours {
            std::env::remove_var(key);
        }
    }

    fn parse(extra: &[&str]) -> Args {
        clear_env();
        let mut argv = vec!["tubescope", "--api-key", "k"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_library_defaults() {
        let args = parse(&[]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.host, "127.0.0.1");

        let config = args.source_config();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.text_format, TextFormat::Html);
        assert_eq!(config.max_pages, None);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));

        assert_eq!(args.analysis_config(), AnalysisConfig::default());
    }

    #[test]
    fn flags_reach_configs() {
        let args = parse(&[
            "--port",
            "9000",
            "--max-pages",
            "2",
            "--retry-attempts",
            "5",
            "--plain-text",
            "--emotion-lexicon",
            "/etc/tubescope/emotion.json",
        ]);

        assert_eq!(args.server_config().port, 9000);
        let config = args.source_config();
        assert_eq!(config.max_pages.map(|n| n.get()), Some(2));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.text_format, TextFormat::PlainText);
        assert_eq!(
            args.analysis_config().emotion_lexicon,
            LexiconSource::File(PathBuf::from("/etc/tubescope/emotion.json"))
        );
    }

    #[test]
    fn api_key_is_required() {
        clear_env();
        assert!(Args::try_parse_from(["tubescope"]).is_err());
    }

    #[test]
    fn every_flag_has_an_environment_variable() {
        let command = Args::command();
        let missing: Vec<_> = command
            .get_arguments()
            .filter(|arg| !matches!(arg.get_id().as_str(), "help" | "version"))
            .filter(|arg| arg.get_env().is_none())
            .map(|arg| arg.get_id().to_string())
            .collect();

        assert!(missing.is_empty(), "flags without env: {missing:?}");
    }
}
