//! Structured logging for the `team-normalizer` binary.
//!
//! Console output goes to stderr so stdout carries only results; a daily
//! rotated copy goes to LOG_DIR. Every line carries the run id from the
//! binary's root span.
//!
//! Environment variables:
//! - LOG_FORMAT=pretty|json (default: pretty)
//! - LOG_DIR=/path/to/logs (default: ./logs)
//! - RUN_ID=<uuid> (default: auto-generated)
//! - RUST_LOG=filter (default: warnings, plus this crate's refresh events)

use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};
use uuid::Uuid;

const DEFAULT_FILTER: &str = "warn,ncaa_team_normalizer=info,hyper=warn,reqwest=warn";
const LOG_FILE_PREFIX: &str = "team_normalizer.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub log_dir: String,
    pub run_id: Uuid,
    pub filter: String,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            format: LogFormat::from_env(),
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
            run_id: get_run_id(),
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// One fmt layer in the configured format. Console layers stay terse, file
/// layers carry targets, thread ids and line numbers.
fn format_layer<S, W>(format: LogFormat, writer: W, console: bool) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(console && format == LogFormat::Pretty)
        .with_target(!console || format == LogFormat::Json)
        .with_thread_ids(!console)
        .with_line_number(!console);

    match format {
        LogFormat::Pretty => base.compact().boxed(),
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit; dropping it flushes and stops
/// the background file writer.
pub fn init_logging() -> (WorkerGuard, LogConfig) {
    let config = LogConfig::from_env();

    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("Failed to create log directory {}: {}", config.log_dir, e);
    }
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(format_layer(config.format, io::stderr, true).with_filter(config.env_filter()))
        .with(format_layer(config.format, file_writer, false).with_filter(config.env_filter()))
        .init();

    tracing::debug!(
        run_id = %config.run_id,
        log_format = ?config.format,
        log_dir = %config.log_dir,
        "Logging initialized"
    );

    (guard, config)
}

/// Run ID from RUN_ID, or a fresh one
pub fn get_run_id() -> Uuid {
    std::env::var("RUN_ID")
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
}
