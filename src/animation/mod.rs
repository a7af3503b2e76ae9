//! Frame-gated LED animation for the urgency levels.
//!
//! Ambient walks a single held color along the strip and picks a new random
//! color each lap. Every other level flashes the whole strip with a color drawn
//! from its palette range on every frame.

use crate::error::AppError;
use crate::led::PixelSink;
use crate::signal::Urgency;
use rand::Rng;

pub mod palette;

pub use palette::{ColorRange, Palette, Rgb};

pub const DEFAULT_FRAME_INTERVAL_MS: u32 = 222;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWrite {
    pub index: usize,
    pub color: Rgb,
}

/// Pixel writes for one frame, flushed with a single `show`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub writes: Vec<PixelWrite>,
}

impl Frame {
    pub fn fill(pixel_count: usize, color: Rgb) -> Self {
        Self {
            writes: (0..pixel_count)
                .map(|index| PixelWrite { index, color })
                .collect(),
        }
    }

    /// Every pixel gets its own random color.
    pub fn random_fill<R: Rng + ?Sized>(pixel_count: usize, rng: &mut R) -> Self {
        Self {
            writes: (0..pixel_count)
                .map(|index| PixelWrite {
                    index,
                    color: Rgb::random(rng),
                })
                .collect(),
        }
    }

    pub fn apply<S: PixelSink + ?Sized>(&self, sink: &mut S) -> Result<(), AppError> {
        for write in &self.writes {
            sink.set_pixel(write.index, write.color)?;
        }
        sink.show()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub pattern: Urgency,
    pub cursor: usize,
    pub color: Rgb,
    pub last_frame_ms: u32,
}

#[derive(Debug, Clone)]
pub struct AnimationEngine {
    state: AnimationState,
    pixel_count: usize,
    frame_interval_ms: u32,
    palette: Palette,
}

impl AnimationEngine {
    /// The first `advance` call after construction always renders.
    pub fn new<R: Rng + ?Sized>(
        pixel_count: usize,
        frame_interval_ms: u32,
        palette: Palette,
        now_ms: u32,
        rng: &mut R,
    ) -> Self {
        Self {
            state: AnimationState {
                pattern: Urgency::Ambient,
                cursor: 0,
                color: Rgb::random(rng),
                last_frame_ms: now_ms.wrapping_sub(frame_interval_ms).wrapping_sub(1),
            },
            pixel_count,
            frame_interval_ms,
            palette,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Render the next frame of `pattern` if the frame gate has elapsed.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        pattern: Urgency,
        now_ms: u32,
        rng: &mut R,
    ) -> Option<Frame> {
        if now_ms.wrapping_sub(self.state.last_frame_ms) <= self.frame_interval_ms {
            return None;
        }

        self.state.pattern = pattern;
        let frame = match self.palette.range_for(pattern).copied() {
            None => {
                let frame = Frame {
                    writes: vec![PixelWrite {
                        index: self.state.cursor,
                        color: self.state.color,
                    }],
                };
                if self.step_cursor() {
                    self.state.color = Rgb::random(rng);
                }
                frame
            }
            Some(range) => {
                self.state.color = range.sample(rng);
                self.step_cursor();
                Frame::fill(self.pixel_count, self.state.color)
            }
        };

        self.state.last_frame_ms = now_ms;
        Some(frame)
    }

    /// Returns true when the cursor wrapped back to the first pixel.
    fn step_cursor(&mut self) -> bool {
        self.state.cursor += 1;
        if self.state.cursor >= self.pixel_count {
            self.state.cursor = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::led::mock::{RecordingSink, SinkOp};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn engine(pixel_count: usize, rng: &mut StdRng) -> AnimationEngine {
        AnimationEngine::new(
            pixel_count,
            DEFAULT_FRAME_INTERVAL_MS,
            Palette::default(),
            1_000,
            rng,
        )
    }

    #[test]
    fn first_advance_renders_immediately() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut engine = engine(8, &mut rng);

        assert!(engine.advance(Urgency::Ambient, 1_000, &mut rng).is_some());
    }

    #[test]
    fn frame_gate_blocks_second_call_inside_interval() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut engine = engine(8, &mut rng);
        let mut sink = RecordingSink::new(8);

        let first = engine
            .advance(Urgency::LowTraffic, 1_000, &mut rng)
            .expect("first frame");
        first.apply(&mut sink).expect("apply frame");
        let writes_after_first = sink.pixel_writes();

        assert!(engine.advance(Urgency::LowTraffic, 1_100, &mut rng).is_none());
        assert!(engine.advance(Urgency::LowTraffic, 1_222, &mut rng).is_none());
        assert_eq!(sink.pixel_writes(), writes_after_first);

        assert!(engine.advance(Urgency::LowTraffic, 1_223, &mut rng).is_some());
    }

    #[test]
    fn frame_gate_survives_tick_wraparound() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut engine = AnimationEngine::new(
            4,
            DEFAULT_FRAME_INTERVAL_MS,
            Palette::default(),
            u32::MAX - 50,
            &mut rng,
        );

        assert!(engine.advance(Urgency::Ambient, u32::MAX - 50, &mut rng).is_some());
        assert!(engine.advance(Urgency::Ambient, 100, &mut rng).is_none());
        assert!(engine.advance(Urgency::Ambient, 200, &mut rng).is_some());
    }

    #[test]
    fn ambient_walks_one_pixel_per_frame_and_recolors_on_wrap() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut engine = engine(3, &mut rng);
        let held = engine.state().color;

        let mut indices = Vec::new();
        let mut now = 1_000;
        for _ in 0..3 {
            let frame = engine
                .advance(Urgency::Ambient, now, &mut rng)
                .expect("frame");
            assert_eq!(frame.writes.len(), 1);
            assert_eq!(frame.writes[0].color, held);
            indices.push(frame.writes[0].index);
            now += 300;
        }

        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(engine.state().cursor, 0);

        let next = engine
            .advance(Urgency::Ambient, now, &mut rng)
            .expect("frame");
        assert_eq!(next.writes[0].index, 0);
        assert_eq!(next.writes[0].color, engine.state().color);
    }

    #[test]
    fn cursor_never_addresses_past_the_strip() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut engine = engine(5, &mut rng);

        let mut now = 1_000;
        for _ in 0..40 {
            if let Some(frame) = engine.advance(Urgency::Ambient, now, &mut rng) {
                assert!(frame.writes.iter().all(|write| write.index < 5));
            }
            now += 223;
        }
    }

    #[test]
    fn flash_levels_fill_whole_strip_from_their_range() {
        let palette = Palette::default();
        for urgency in [
            Urgency::LowTraffic,
            Urgency::HeavyTraffic,
            Urgency::DepartNow,
            Urgency::Late,
        ] {
            let mut rng = StdRng::seed_from_u64(6);
            let mut engine = engine(6, &mut rng);
            let mut sink = RecordingSink::new(6);

            let frame = engine.advance(urgency, 1_000, &mut rng).expect("frame");
            frame.apply(&mut sink).expect("apply");

            let color = engine.state().color;
            let range = palette.range_for(urgency).expect("range");
            assert!(range.contains(color));
            assert_eq!(frame, Frame::fill(6, color));
            assert_eq!(sink.pixels(), &[color; 6]);
            assert_eq!(engine.state().cursor, 1);
            assert_eq!(engine.state().pattern, urgency);
        }
    }

    #[test]
    fn apply_flushes_exactly_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sink = RecordingSink::new(4);

        Frame::random_fill(4, &mut rng)
            .apply(&mut sink)
            .expect("apply");

        let shows = sink
            .ops()
            .iter()
            .filter(|op| matches!(op, SinkOp::Show))
            .count();
        assert_eq!(shows, 1);
        assert_eq!(sink.pixel_writes(), 4);
        assert_eq!(sink.ops().last(), Some(&SinkOp::Show));
    }
}
