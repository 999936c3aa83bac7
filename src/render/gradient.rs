use super::color::Rgba;

/// A one dimensional gradient defined by color stops over [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<(f32, Rgba)>,
}

impl Gradient {
    /// Create a gradient out of `(offset, color)` stops. Offsets are clamped and sorted.
    pub fn new(stops: impl IntoIterator<Item = (f32, Rgba)>) -> Self {
        let mut stops: Vec<_> = stops.into_iter().map(|(offset, color)| (offset.clamp(0.0, 1.0), color)).collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    /// A gradient that goes transparent -> `peak` -> transparent, like a glowing band.
    pub fn band(peak: Rgba) -> Self {
        Self::new([(0.0, Rgba::TRANSPARENT), (0.5, peak), (1.0, Rgba::TRANSPARENT)])
    }

    /// A vertical mask that is transparent at both edges and opaque within `fade / height`
    /// of them.
    pub fn edge_fade(fade: f32, height: f32) -> Self {
        let opaque = Rgba { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
        let zone = if height > 0.0 { (fade / height).clamp(0.0, 0.5) } else { 0.0 };
        Self::new([(0.0, Rgba::TRANSPARENT), (zone, opaque), (1.0 - zone, opaque), (1.0, Rgba::TRANSPARENT)])
    }

    /// Sample the gradient at `t`. Values before the first stop or after the last one
    /// extend those stops.
    pub fn sample(&self, t: f32) -> Rgba {
        let Some(first) = self.stops.first() else {
            return Rgba::TRANSPARENT;
        };
        if t <= first.0 {
            return first.1;
        }
        for window in self.stops.windows(2) {
            let (start, end) = (window[0], window[1]);
            if t <= end.0 {
                let span = end.0 - start.0;
                if span <= f32::EPSILON {
                    return end.1;
                }
                return start.1.lerp(end.1, (t - start.0) / span);
            }
        }
        self.stops.last().map(|stop| stop.1).unwrap_or(Rgba::TRANSPARENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;

    #[test]
    fn test_band_peaks_in_the_middle() {
        let gradient = Gradient::band(Rgba::opaque(Color::WHITE));
        assert_eq!(gradient.sample(0.0), Rgba::TRANSPARENT);
        assert_eq!(gradient.sample(0.5).a, 1.0);
        assert!((gradient.sample(0.25).a - 0.5).abs() < 1e-6);
        assert_eq!(gradient.sample(1.0), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_edge_fade() {
        let mask = Gradient::edge_fade(60.0, 300.0);
        assert_eq!(mask.sample(0.0).a, 0.0);
        assert!((mask.sample(0.1).a - 0.5).abs() < 1e-5);
        assert_eq!(mask.sample(0.5).a, 1.0);
        assert_eq!(mask.sample(1.0).a, 0.0);
    }

    #[test]
    fn test_sample_outside_range() {
        let gradient = Gradient::new([(0.2, Rgba::opaque(Color::WHITE)), (0.8, Rgba::TRANSPARENT)]);
        assert_eq!(gradient.sample(-1.0).a, 1.0);
        assert_eq!(gradient.sample(2.0).a, 0.0);
    }

    #[test]
    fn test_empty_gradient() {
        assert_eq!(Gradient::new([]).sample(0.5), Rgba::TRANSPARENT);
    }
}
