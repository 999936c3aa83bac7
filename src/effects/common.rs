use crate::render::{Canvas, CellSize};
use std::time::Duration;

/// The frame rate the per-frame constants were tuned for.
pub const REFERENCE_FPS: f32 = 60.0;

/// Frame context passed to every effect update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Seconds since the previous frame
    pub dt: f32,
    /// Seconds since the scene started
    pub elapsed: f32,
    /// Frame counter
    pub frame: u64,
}

impl FrameContext {
    /// The elapsed time expressed in reference frames, for constants defined per frame.
    pub fn steps(&self) -> f32 {
        self.dt * REFERENCE_FPS
    }
}

/// The drawable area in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_terminal(columns: u16, rows: u16, cell: CellSize) -> Self {
        Self::new(columns as f32 * cell.width, rows as f32 * cell.height)
    }

    /// Whether there's anything to draw on.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// The top of a band of `height` centered vertically.
    pub fn band_top(&self, height: f32) -> f32 {
        (self.height - height) / 2.0
    }
}

/// The vertical scan line, anchored at a fixed fraction of the viewport width.
///
/// Every effect that cares about the scan line derives its x coordinate from a copy of
/// this value so they can't drift apart on resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanLine {
    fraction: f32,
}

impl ScanLine {
    pub fn new(fraction: f32) -> Self {
        Self { fraction: fraction.clamp(0.0, 1.0) }
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn x_for(&self, viewport: Viewport) -> f32 {
        viewport.width * self.fraction
    }
}

/// Trait for the background effects
pub trait Effect {
    /// Advance the simulation by one frame.
    fn update(&mut self, frame: &FrameContext);

    /// Draw the current state.
    fn render(&self, canvas: &mut Canvas);

    /// React to a viewport change without restarting.
    fn resize(&mut self, viewport: Viewport);
}

/// A fixed period timer driven by frame deltas.
#[derive(Debug, Clone)]
pub struct Interval {
    period: f32,
    accumulated: f32,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self { period: period.as_secs_f32().max(f32::EPSILON), accumulated: 0.0 }
    }

    /// Advance by `dt` seconds and return how many periods elapsed.
    pub fn tick(&mut self, dt: f32) -> u32 {
        self.accumulated += dt.max(0.0);
        let fired = (self.accumulated / self.period).floor();
        self.accumulated -= fired * self.period;
        fired as u32
    }
}

/// Move `current` towards `target` by `rate` per reference frame.
///
/// The per-step factor is `1 - (1 - rate)^steps`, which stays within [0, 1] for any
/// `steps`, so the result never crosses `target`.
pub(crate) fn approach(current: f32, target: f32, rate: f32, steps: f32) -> f32 {
    let factor = 1.0 - (1.0 - rate.clamp(0.0, 1.0)).powf(steps.max(0.0));
    current + (target - current) * factor
}

/// How many per-frame draws `steps` reference frames are worth. The fractional part is
/// rolled, so the expected count is exactly `steps`.
pub(crate) fn frame_draws(rng: &mut fastrand::Rng, steps: f32) -> u32 {
    let steps = steps.max(0.0);
    let whole = steps.floor();
    whole as u32 + u32::from(rng.f32() < steps - whole)
}

/// A uniform value in `[min, max)`.
pub(crate) fn random_range(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    min + rng.f32() * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_interval_fires_per_period() {
        let mut interval = Interval::new(Duration::from_millis(200));
        assert_eq!(interval.tick(0.1), 0);
        assert_eq!(interval.tick(0.1), 1);
        assert_eq!(interval.tick(0.45), 2);
        assert_eq!(interval.tick(0.0), 0);
    }

    #[rstest]
    #[case(0.0, 1.0, 0.05, 1.0, 0.05)]
    #[case(0.0, 1.0, 0.05, 0.0, 0.0)]
    #[case(1.0, 1.0, 0.05, 3.0, 1.0)]
    #[case(2.0, 0.0, 1.0, 1.0, 0.0)]
    fn test_approach(
        #[case] current: f32,
        #[case] target: f32,
        #[case] rate: f32,
        #[case] steps: f32,
        #[case] expected: f32,
    ) {
        assert!((approach(current, target, rate, steps) - expected).abs() < 1e-6);
    }

    #[rstest]
    #[case::whole(4.0, 4, 4)]
    #[case::none(0.0, 0, 0)]
    #[case::fraction(2.5, 2, 3)]
    fn test_frame_draws_bounds(#[case] steps: f32, #[case] min: u32, #[case] max: u32) {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..100 {
            assert!((min..=max).contains(&frame_draws(&mut rng, steps)));
        }
    }

    #[test]
    fn test_frame_draws_average() {
        let mut rng = fastrand::Rng::with_seed(11);
        let total: u32 = (0..10_000).map(|_| frame_draws(&mut rng, 0.25)).sum();
        assert!((2_300..=2_700).contains(&total));
    }

    #[test]
    fn test_approach_never_overshoots() {
        let mut value = 0.8;
        for steps in [0.5, 1.0, 2.0, 10.0, 100.0] {
            let next = approach(value, 1.8, 0.05, steps);
            assert!(next >= value && next <= 1.8);
            value = next;
        }
    }

    #[test]
    fn test_scan_line_follows_width() {
        let line = ScanLine::new(0.6);
        assert_eq!(line.x_for(Viewport::new(1000.0, 10.0)), 600.0);
        assert_eq!(line.x_for(Viewport::new(500.0, 10.0)), 300.0);
    }

    #[test]
    fn test_band_top_centers() {
        assert_eq!(Viewport::new(100.0, 400.0).band_top(300.0), 50.0);
    }
}
