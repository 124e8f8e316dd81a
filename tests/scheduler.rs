mod common;

use common::{snapshot_at, ScriptedSource};
use futures::channel::mpsc;
use host_monitor::dashboard::{PanelSet, PanelValue, CPU_USAGE, HOSTNAME};
use host_monitor::error::SampleError;
use host_monitor::host::{HostFacts, StaticHost};
use host_monitor::render::DashboardRenderer;
use host_monitor::sampler::{DiskSelection, MetricsSampler};
use host_monitor::scheduler::{InputEvent, RefreshScheduler, SchedulerState};
use std::io;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Records frames and optionally asks to quit after a number of them.
struct RecordingRenderer {
    frames: Vec<PanelSet>,
    quit_after: Option<(usize, mpsc::UnboundedSender<InputEvent>)>,
}

impl RecordingRenderer {
    fn new() -> Self {
        Self {
            frames: Vec::new(),
            quit_after: None,
        }
    }

    fn quitting_after(n: usize, tx: mpsc::UnboundedSender<InputEvent>) -> Self {
        Self {
            frames: Vec::new(),
            quit_after: Some((n, tx)),
        }
    }
}

impl DashboardRenderer for RecordingRenderer {
    fn apply(&mut self, panels: &PanelSet) -> io::Result<()> {
        self.frames.push(panels.clone());
        if let Some((n, tx)) = &self.quit_after {
            if self.frames.len() == *n {
                let _ = tx.unbounded_send(InputEvent::Quit);
            }
        }
        Ok(())
    }
}

/// Fails every frame with a transient error.
struct FlakyRenderer;

impl DashboardRenderer for FlakyRenderer {
    fn apply(&mut self, _panels: &PanelSet) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::WouldBlock, "terminal busy"))
    }
}

/// Output whose reader went away, like `host_monitor --mode json | head -n1`.
struct ClosedPipeRenderer {
    attempts: usize,
}

impl DashboardRenderer for ClosedPipeRenderer {
    fn apply(&mut self, _panels: &PanelSet) -> io::Result<()> {
        self.attempts += 1;
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }
}

/// Records when each frame started and finished; the first frame blocks.
struct SlowFirstFrameRenderer {
    first_frame: Duration,
    spans: Vec<(Instant, Instant)>,
}

impl DashboardRenderer for SlowFirstFrameRenderer {
    fn apply(&mut self, _panels: &PanelSet) -> io::Result<()> {
        let start = Instant::now();
        if self.spans.is_empty() {
            std::thread::sleep(self.first_frame);
        }
        self.spans.push((start, Instant::now()));
        Ok(())
    }
}

fn host() -> StaticHost {
    StaticHost(HostFacts {
        hostname: Some("testhost".to_string()),
        free_disk_bytes: Some(1024),
    })
}

fn scripted(count: u64) -> ScriptedSource {
    let base = Instant::now();
    ScriptedSource::new(
        (0..count)
            .map(|i| Ok(snapshot_at(base, i, 200 + i * 50, 800 + i * 50)))
            .collect(),
    )
}

#[tokio::test]
async fn quit_stops_after_current_cycle() {
    let (tx, rx) = mpsc::unbounded();
    let mut scheduler = RefreshScheduler::new(
        MetricsSampler::new(DiskSelection::Auto),
        scripted(10),
        host(),
        RecordingRenderer::quitting_after(3, tx),
        Duration::from_millis(50),
    );

    let summary = scheduler.run(rx, CancellationToken::new()).await;

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(summary.cycles_rendered, 3);
    assert_eq!(summary.cycles_skipped, 0);

    let frames = &scheduler.renderer().frames;
    assert_eq!(
        frames[0].get(CPU_USAGE),
        Some(&PanelValue::Gauge {
            percent: None,
            band: None
        })
    );
    assert!(matches!(
        frames[1].get(CPU_USAGE),
        Some(PanelValue::Gauge {
            percent: Some(50),
            ..
        })
    ));
    assert!(matches!(
        frames[2].get(HOSTNAME),
        Some(PanelValue::Text { text, .. }) if text == "testhost"
    ));
}

#[tokio::test]
async fn failing_source_never_stops_the_loop() {
    let base = Instant::now();
    let source = ScriptedSource::new(vec![
        Ok(snapshot_at(base, 0, 200, 800)),
        Err(SampleError::unavailable(
            "/proc/stat",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        )),
        Err(SampleError::malformed("truncated")),
        Ok(snapshot_at(base, 3, 250, 850)),
    ]);
    let cancel = CancellationToken::new();
    let mut scheduler = RefreshScheduler::new(
        MetricsSampler::new(DiskSelection::Auto),
        source,
        host(),
        RecordingRenderer::new(),
        Duration::from_millis(10),
    );

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        stopper.cancel();
    });
    let summary = scheduler.run(futures::stream::pending(), cancel).await;

    assert_eq!(summary.cycles_rendered, 2);
    // Two failures from the script, the rest from the exhausted script.
    assert!(summary.cycles_skipped >= 2);

    // The second frame diffs against the first good snapshot.
    let frames = &scheduler.renderer().frames;
    assert!(matches!(
        frames[1].get(CPU_USAGE),
        Some(PanelValue::Gauge {
            percent: Some(50),
            ..
        })
    ));
}

#[tokio::test]
async fn cancellation_stops_the_loop() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut scheduler = RefreshScheduler::new(
        MetricsSampler::new(DiskSelection::Auto),
        scripted(5),
        host(),
        RecordingRenderer::new(),
        Duration::from_secs(60),
    );

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        scheduler.run(futures::stream::pending(), cancel),
    )
    .await
    .expect("loop should stop on cancellation");

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(summary.cycles_rendered <= 1);
}

#[tokio::test]
async fn resize_and_other_input_are_ignored() {
    let cancel = CancellationToken::new();
    let mut scheduler = RefreshScheduler::new(
        MetricsSampler::new(DiskSelection::Auto),
        scripted(100),
        host(),
        RecordingRenderer::new(),
        Duration::from_millis(10),
    );

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stopper.cancel();
    });
    // The stream ends after these events; the timer keeps the loop alive.
    let input = futures::stream::iter(vec![
        InputEvent::Resize(80, 24),
        InputEvent::Other,
        InputEvent::Resize(120, 40),
    ]);
    let summary = scheduler.run(input, cancel).await;

    assert!(summary.cycles_rendered >= 2);
    assert_eq!(summary.cycles_skipped, 0);
}

#[test]
fn render_failure_is_counted_as_skipped() {
    let mut scheduler = RefreshScheduler::new(
        MetricsSampler::new(DiskSelection::Auto),
        scripted(2),
        host(),
        FlakyRenderer,
        Duration::from_secs(1),
    );
    assert!(!scheduler.run_cycle());
    assert!(!scheduler.run_cycle());
    assert_eq!(scheduler.state(), SchedulerState::Running);
    assert_eq!(scheduler.summary().cycles_rendered, 0);
    assert_eq!(scheduler.summary().cycles_skipped, 2);
    // Derivation still advanced the baseline.
    assert!(scheduler.sampler().has_baseline());
}

#[tokio::test]
async fn closed_output_stops_the_loop() {
    let mut scheduler = RefreshScheduler::new(
        MetricsSampler::new(DiskSelection::Auto),
        scripted(100),
        host(),
        ClosedPipeRenderer { attempts: 0 },
        Duration::from_millis(10),
    );

    // No quit and no cancellation: only the closed pipe can end the run.
    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        scheduler.run(futures::stream::pending(), CancellationToken::new()),
    )
    .await
    .expect("loop should stop once the output is closed");

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(scheduler.renderer().attempts, 1);
    assert_eq!(summary.cycles_rendered, 0);
    assert_eq!(summary.cycles_skipped, 1);
}

#[tokio::test]
async fn slow_cycle_delays_the_next_tick() {
    let cancel = CancellationToken::new();
    let interval = Duration::from_millis(20);
    let mut scheduler = RefreshScheduler::new(
        MetricsSampler::new(DiskSelection::Auto),
        scripted(100),
        host(),
        SlowFirstFrameRenderer {
            first_frame: Duration::from_millis(100),
            spans: Vec::new(),
        },
        interval,
    );

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        stopper.cancel();
    });
    scheduler.run(futures::stream::pending(), cancel).await;

    let spans = &scheduler.renderer().spans;
    assert!(spans.len() >= 3, "only {} frames", spans.len());
    // Cycles never overlap.
    for pair in spans.windows(2) {
        assert!(pair[1].0 >= pair[0].1);
    }
    // The ticks missed during the slow frame are not replayed as a burst:
    // after the catch-up tick, frames are a full interval apart again.
    for pair in spans[1..].windows(2) {
        let gap = pair[1].0.duration_since(pair[0].0);
        assert!(gap >= interval - Duration::from_millis(5), "gap {gap:?}");
    }
}

#[test]
fn quit_input_moves_to_stopped() {
    let mut scheduler = RefreshScheduler::new(
        MetricsSampler::new(DiskSelection::Auto),
        scripted(1),
        host(),
        RecordingRenderer::new(),
        Duration::from_secs(1),
    );
    scheduler.handle_input(InputEvent::Resize(10, 10));
    assert_eq!(scheduler.state(), SchedulerState::Running);
    scheduler.handle_input(InputEvent::Quit);
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}
