pub mod utils;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use common::version::BuildInfo;

use crate::http::{self, HttpServerError};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: tracing::Level,
    /// Directory for log files (logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
    /// Prefix of the daily rolling log file
    pub file_name: &'static str,
}

/// Initialize logging.
/// Returns guards that must be kept alive for the duration of the program.
pub fn init_logging(config: &LogConfig) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    // Stdout layer
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    // File layer (if log_dir is set)
    if let Some(log_dir) = &config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, config.file_name);
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    guards
}

/// Serve `router` until SIGINT/SIGTERM, then wait for in-flight requests to drain.
pub async fn run(
    listen_addr: SocketAddr,
    router: Router,
    log_level: tracing::Level,
    build_info: BuildInfo,
) -> Result<(), HttpServerError> {
    utils::register_panic_logger();
    utils::report_build_info(&build_info);

    let (graceful_waiter, _shutdown_tx, shutdown_rx) = utils::graceful_shutdown_blocker()?;
    let mut server = tokio::spawn(http::serve(listen_addr, router, log_level, shutdown_rx));

    tokio::select! {
        result = &mut server => {
            // the server stopped on its own, most likely a bind failure
            return result?;
        }
        _ = graceful_waiter => {}
    }

    match timeout(FINAL_SHUTDOWN_TIMEOUT, server).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::error!(
                "Failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            );
            std::process::exit(4);
        }
    }
}
