use crate::dashboard::compose;
use crate::host::HostProbe;
use crate::render::DashboardRenderer;
use crate::sampler::MetricsSampler;
use crate::source::CounterSource;
use futures::{Stream, StreamExt};
use std::io;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    /// New terminal size. Layout is the renderer's business.
    Resize(u16, u16),
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles_rendered: u64,
    pub cycles_skipped: u64,
}

/// Drives sample, derive, render cycles on a fixed interval.
///
/// Cycles run inside the loop body, so they never overlap and a quit is only
/// acted on between cycles.
pub struct RefreshScheduler<S, H, R> {
    sampler: MetricsSampler,
    source: S,
    host: H,
    renderer: R,
    interval: Duration,
    state: SchedulerState,
    summary: RunSummary,
}

impl<S, H, R> RefreshScheduler<S, H, R>
where
    S: CounterSource,
    H: HostProbe,
    R: DashboardRenderer,
{
    pub fn new(sampler: MetricsSampler, source: S, host: H, renderer: R, interval: Duration) -> Self {
        Self {
            sampler,
            source,
            host,
            renderer,
            interval,
            state: SchedulerState::Running,
            summary: RunSummary::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn sampler(&self) -> &MetricsSampler {
        &self.sampler
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => {
                info!("Quit requested");
                self.state = SchedulerState::Stopped;
            }
            InputEvent::Resize(w, h) => {
                debug!("Terminal resized to {}x{}", w, h);
            }
            InputEvent::Other => {}
        }
    }

    /// One sample-and-render cycle. Returns whether a frame was rendered.
    ///
    /// Failures are contained here: the frame is skipped and whatever was
    /// last drawn stays on screen. The one exception is a closed output
    /// (`BrokenPipe`), which stops the scheduler.
    pub fn run_cycle(&mut self) -> bool {
        let snapshot = match self.source.read_counters() {
            Ok(s) => s,
            Err(e) => {
                warn!("Sample skipped: {}", e);
                self.summary.cycles_skipped += 1;
                return false;
            }
        };
        let derived = match self.sampler.derive(snapshot) {
            Ok(d) => d,
            Err(e) => {
                warn!("Derivation skipped: {}", e);
                self.summary.cycles_skipped += 1;
                return false;
            }
        };
        let host = self.host.probe();
        let panels = compose(&derived, &host);
        if let Err(e) = self.renderer.apply(&panels) {
            self.summary.cycles_skipped += 1;
            if e.kind() == io::ErrorKind::BrokenPipe {
                info!("Output closed; stopping");
                self.state = SchedulerState::Stopped;
            } else {
                error!("Render error: {}", e);
            }
            return false;
        }
        self.summary.cycles_rendered += 1;
        true
    }

    /// Runs until a quit event, cancellation, or closed output.
    pub async fn run<I>(&mut self, mut input: I, cancel: CancellationToken) -> RunSummary
    where
        I: Stream<Item = InputEvent> + Unpin,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut input_open = true;

        info!("Refresh loop started with interval {:?}", self.interval);
        while self.state == SchedulerState::Running {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown signal received");
                    self.state = SchedulerState::Stopped;
                }
                _ = ticker.tick() => {
                    self.run_cycle();
                }
                event = input.next(), if input_open => match event {
                    Some(event) => self.handle_input(event),
                    None => {
                        debug!("Input stream closed; continuing on timer only");
                        input_open = false;
                    }
                },
            }
        }

        info!(
            "Refresh loop stopped: {} rendered, {} skipped",
            self.summary.cycles_rendered, self.summary.cycles_skipped
        );
        self.summary
    }
}
