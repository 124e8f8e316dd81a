use crate::error::StartupError;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Where log lines go.
pub enum LogSink<'a> {
    Stderr,
    File(&'a Path),
    /// The dashboard owns the terminal and no file was given.
    Discard,
}

pub fn init_tracing(sink: LogSink<'_>) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter);

    match sink {
        LogSink::Stderr => builder.with_writer(std::io::stderr).init(),
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| StartupError::LogFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        LogSink::Discard => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

/// Cancels `cancel` on Ctrl+C or SIGTERM.
pub async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received"),
        _ = terminate => info!("SIGTERM received"),
        _ = cancel.cancelled() => return,
    }
    cancel.cancel();
}
