use clap::Parser;
use host_monitor::config::{Config, Mode};
use host_monitor::error::StartupError;
use host_monitor::host::SysHostProbe;
use host_monitor::render::{JsonRenderer, TerminalRenderer};
use host_monitor::runtime::{self, LogSink};
use host_monitor::sampler::MetricsSampler;
use host_monitor::scheduler::RefreshScheduler;
use host_monitor::source::ProcSource;
use host_monitor::terminal::{self, TerminalGuard};
use std::io::stdout;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Config::parse();
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("host_monitor: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    config.validate()?;

    let sink = match (&config.mode, &config.log_file) {
        (_, Some(path)) => LogSink::File(path),
        (Mode::Json, None) => LogSink::Stderr,
        (Mode::Tui, None) => LogSink::Discard,
    };
    runtime::init_tracing(sink)?;
    info!(
        "Starting: mode={:?}, interval={}ms, proc_root={}, disk={:?}, mount={}",
        config.mode,
        config.interval_ms,
        config.proc_root.display(),
        config.disk,
        config.mount.display()
    );

    let sampler = MetricsSampler::new(config.disk_selection());
    let source = ProcSource::new(&config.proc_root);
    let host = SysHostProbe::new(&config.mount);

    let cancel = CancellationToken::new();
    let signal_handle = tokio::spawn(runtime::shutdown_signal(cancel.clone()));

    let summary = match config.mode {
        Mode::Tui => {
            let _guard = TerminalGuard::acquire()?;
            let renderer = TerminalRenderer::new(stdout());
            let mut scheduler =
                RefreshScheduler::new(sampler, source, host, renderer, config.interval());
            scheduler.run(terminal::input_events(), cancel.clone()).await
        }
        Mode::Json => {
            let renderer = JsonRenderer::new(stdout());
            let mut scheduler =
                RefreshScheduler::new(sampler, source, host, renderer, config.interval());
            scheduler
                .run(futures::stream::pending(), cancel.clone())
                .await
        }
    };

    cancel.cancel();
    let _ = signal_handle.await;
    info!(
        "Exiting after {} frames ({} skipped)",
        summary.cycles_rendered, summary.cycles_skipped
    );
    Ok(())
}
