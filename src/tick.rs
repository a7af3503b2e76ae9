//! Cooperative tick loop: animation frames and route requests.
//!
//! Nothing here blocks for long. Each tick reads the latest signal snapshot,
//! renders at most one frame and fires at most one request.

use crate::animation::{AnimationEngine, Frame};
use crate::clock::{MonotonicClock, WallClock};
use crate::error::AppError;
use crate::led::PixelSink;
use crate::link::{RequestScheduler, RouteRequest, Transport};
use crate::state::SignalSnapshot;
use rand::Rng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// One random color per pixel at the given brightness, shown once.
pub fn startup_fill<S, R>(sink: &mut S, pixel_count: usize, brightness: u8, rng: &mut R) -> Result<(), AppError>
where
    S: PixelSink + ?Sized,
    R: Rng + ?Sized,
{
    sink.set_brightness(brightness)?;
    Frame::random_fill(pixel_count, rng).apply(sink)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub frame_rendered: bool,
    pub request_sent: bool,
}

pub struct TickLoop<S, T, C> {
    engine: AnimationEngine,
    scheduler: RequestScheduler,
    sink: S,
    transport: T,
    wall_clock: C,
    signal: watch::Receiver<SignalSnapshot>,
    coordinates: String,
    rng: StdRng,
    brightness: u8,
}

impl<S, T, C> TickLoop<S, T, C>
where
    S: PixelSink,
    T: Transport,
    C: WallClock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: AnimationEngine,
        scheduler: RequestScheduler,
        sink: S,
        transport: T,
        wall_clock: C,
        signal: watch::Receiver<SignalSnapshot>,
        coordinates: impl Into<String>,
        rng: StdRng,
    ) -> Self {
        let brightness = signal.borrow().pixel_brightness;
        Self {
            engine,
            scheduler,
            sink,
            transport,
            wall_clock,
            signal,
            coordinates: coordinates.into(),
            rng,
            brightness,
        }
    }

    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one tick at monotonic time `now_ms`. Sink and transport failures
    /// are logged and never stop the loop.
    pub fn tick(&mut self, now_ms: u32) -> TickReport {
        let signal = *self.signal.borrow_and_update();
        let mut report = TickReport::default();

        if signal.pixel_brightness != self.brightness {
            match self.sink.set_brightness(signal.pixel_brightness) {
                Ok(()) => {
                    debug!(brightness = signal.pixel_brightness, "Brightness applied");
                    self.brightness = signal.pixel_brightness;
                }
                Err(err) => warn!(error = %err, "Failed to apply brightness"),
            }
        }

        if let Some(frame) = self.engine.advance(signal.urgency, now_ms, &mut self.rng) {
            match frame.apply(&mut self.sink) {
                Ok(()) => report.frame_rendered = true,
                Err(err) => warn!(error = %err, "Failed to push frame"),
            }
        }

        let connected = self.transport.is_connected();
        if self
            .scheduler
            .poll(now_ms, signal.logic_call_interval_ms, connected)
        {
            let request = RouteRequest::new(self.coordinates.as_str(), &self.wall_clock.now());
            match self.transport.publish(&request) {
                Ok(()) => {
                    info!(
                        hour = request.hour,
                        minute = request.minute,
                        weekday = request.weekday,
                        "Route request published"
                    );
                    report.request_sent = true;
                }
                Err(err) => warn!(error = %err, "Route request failed"),
            }
        }

        report
    }

    /// Tick every `period` until `stop` is set.
    pub async fn run(mut self, period: Duration, monotonic: MonotonicClock, stop: Arc<AtomicBool>) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis(), "Tick loop started");

        while !stop.load(Ordering::Relaxed) {
            interval.tick().await;
            self.tick(monotonic.millis());
        }
        info!("Tick loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Palette;
    use crate::clock::FixedClock;
    use crate::led::mock::{RecordingSink, SinkOp};
    use crate::signal::Urgency;
    use rand::SeedableRng;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        connected: bool,
        fail: bool,
        published: Vec<RouteRequest>,
    }

    impl Transport for RecordingTransport {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn publish(&mut self, request: &RouteRequest) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Transport("offline".to_string()));
            }
            self.published.push(request.clone());
            Ok(())
        }
    }

    fn snapshot(urgency: Urgency, brightness: u8) -> SignalSnapshot {
        SignalSnapshot {
            urgency,
            pixel_brightness: brightness,
            logic_call_interval_ms: 60_000,
        }
    }

    fn tick_loop(
        transport: RecordingTransport,
        signal: watch::Receiver<SignalSnapshot>,
    ) -> TickLoop<RecordingSink, RecordingTransport, FixedClock> {
        let mut rng = StdRng::seed_from_u64(7);
        let engine = AnimationEngine::new(8, 222, Palette::default(), 0, &mut rng);
        TickLoop::new(
            engine,
            RequestScheduler::with_warmup(0, 60_000, 1_000),
            RecordingSink::new(8),
            transport,
            FixedClock::at(8, 15),
            signal,
            "34.1,-118.3:33.9,-118.4",
            rng,
        )
    }

    #[test]
    fn startup_fill_sets_brightness_then_shows_every_pixel() -> Result<(), AppError> {
        let mut sink = RecordingSink::new(4);
        let mut rng = StdRng::seed_from_u64(1);

        startup_fill(&mut sink, 4, 80, &mut rng)?;

        assert_eq!(sink.ops().first(), Some(&SinkOp::SetBrightness(80)));
        assert_eq!(sink.pixel_writes(), 4);
        assert_eq!(sink.shows(), 1);
        Ok(())
    }

    #[test]
    fn first_tick_renders_and_frames_are_gated() {
        let (_tx, rx) = watch::channel(snapshot(Urgency::Ambient, 100));
        let mut ticks = tick_loop(RecordingTransport::default(), rx);

        assert!(ticks.tick(0).frame_rendered);
        assert!(!ticks.tick(100).frame_rendered);
        assert!(!ticks.tick(222).frame_rendered);
        assert!(ticks.tick(223).frame_rendered);
        assert_eq!(ticks.sink().shows(), 2);
    }

    #[test]
    fn brightness_change_reaches_sink_once() {
        let (tx, rx) = watch::channel(snapshot(Urgency::Ambient, 100));
        let mut ticks = tick_loop(RecordingTransport::default(), rx);

        tx.send_replace(snapshot(Urgency::Ambient, 255));
        ticks.tick(0);
        ticks.tick(10);

        let changes = ticks
            .sink()
            .ops()
            .iter()
            .filter(|op| matches!(op, SinkOp::SetBrightness(_)))
            .count();
        assert_eq!(changes, 1);
        assert_eq!(ticks.sink().brightness(), 255);
    }

    #[test]
    fn urgency_switch_changes_pattern_on_next_frame() {
        let (tx, rx) = watch::channel(snapshot(Urgency::Ambient, 100));
        let mut ticks = tick_loop(RecordingTransport::default(), rx);

        ticks.tick(0);
        tx.send_replace(snapshot(Urgency::Late, 100));
        ticks.tick(300);

        assert_eq!(ticks.engine().state().pattern, Urgency::Late);
        assert_eq!(ticks.sink().pixel_writes(), 1 + 8);
    }

    #[test]
    fn request_fires_after_warmup_when_connected() {
        let (_tx, rx) = watch::channel(snapshot(Urgency::Ambient, 100));
        let transport = RecordingTransport {
            connected: true,
            ..RecordingTransport::default()
        };
        let mut ticks = tick_loop(transport, rx);

        assert!(!ticks.tick(500).request_sent);
        assert!(ticks.tick(1_001).request_sent);
        assert!(!ticks.tick(1_011).request_sent);

        let published = &ticks.transport().published;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].hour, 8);
        assert_eq!(published[0].minute, 15);
        assert_eq!(published[0].coordinates, "34.1,-118.3:33.9,-118.4");
    }

    #[test]
    fn disconnected_transport_is_not_polled_for_requests() {
        let (_tx, rx) = watch::channel(snapshot(Urgency::Ambient, 100));
        let mut ticks = tick_loop(RecordingTransport::default(), rx);

        assert!(!ticks.tick(120_000).request_sent);
        assert!(ticks.transport().published.is_empty());
    }

    #[test]
    fn publish_failure_keeps_animating() {
        let (_tx, rx) = watch::channel(snapshot(Urgency::DepartNow, 100));
        let transport = RecordingTransport {
            connected: true,
            fail: true,
            ..RecordingTransport::default()
        };
        let mut ticks = tick_loop(transport, rx);

        let report = ticks.tick(2_000);

        assert!(report.frame_rendered);
        assert!(!report.request_sent);
    }

    #[test]
    fn show_failure_is_reported_as_no_frame() {
        let (_tx, rx) = watch::channel(snapshot(Urgency::Ambient, 100));
        let mut rng = StdRng::seed_from_u64(3);
        let engine = AnimationEngine::new(2, 222, Palette::default(), 0, &mut rng);
        let mut ticks = TickLoop::new(
            engine,
            RequestScheduler::new(0),
            RecordingSink::failing_show(2),
            RecordingTransport::default(),
            FixedClock::at(9, 0),
            rx,
            "x",
            rng,
        );

        assert!(!ticks.tick(0).frame_rendered);
    }
}
