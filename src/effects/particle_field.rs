use super::common::{Effect, FrameContext, Viewport, frame_draws, random_range};
use crate::config::ParticleFieldConfig;
use crate::render::{BlendMode, Canvas, Color, Gradient, Rgba, hsl_to_rgb};

/// Alpha change applied by a single twinkle.
const TWINKLE_STEP: f32 = 0.05;
/// Amplitude of the vertical sway per reference frame.
const SWAY: f32 = 0.5;

/// A point drifting across the field, in coordinates centered on the band.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParticle {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
    pub size: f32,
    pub alpha: f32,
}

/// Ambient field of glowing points drifting left to right across a horizontal band.
#[derive(Debug)]
pub struct ParticleField {
    particles: Vec<FieldParticle>,
    viewport: Viewport,
    band_height: f32,
    margin: f32,
    sprite: Gradient,
    rng: fastrand::Rng,
}

impl ParticleField {
    pub fn new(config: &ParticleFieldConfig, viewport: Viewport, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let (width, height) = (viewport.width, config.band_height);
        let particles = (0..config.count)
            .map(|_| FieldParticle {
                x: (rng.f32() - 0.5) * width * 2.0,
                y: (rng.f32() - 0.5) * height,
                size: (rng.f32() * 140.0 + 60.0) / 8.0,
                velocity: rng.f32() * 60.0 + 30.0,
                alpha: (rng.f32() * 8.0 + 2.0) / 10.0,
            })
            .collect();
        Self {
            particles,
            viewport,
            band_height: config.band_height,
            margin: config.margin,
            sprite: point_sprite(),
            rng,
        }
    }

    pub fn particles(&self) -> &[FieldParticle] {
        &self.particles
    }

    /// The x coordinate past which particles wrap around.
    pub fn right_bound(&self) -> f32 {
        self.viewport.width / 2.0 + self.margin
    }

    fn twinkle(rng: &mut fastrand::Rng, particle: &mut FieldParticle) {
        match rng.u8(0..10) {
            1 if particle.alpha > 0.0 => particle.alpha -= TWINKLE_STEP,
            2 if particle.alpha < 1.0 => particle.alpha += TWINKLE_STEP,
            _ => {}
        }
        particle.alpha = particle.alpha.clamp(0.0, 1.0);
    }
}

impl Effect for ParticleField {
    fn update(&mut self, frame: &FrameContext) {
        let right = self.right_bound();
        let steps = frame.steps();
        for (index, particle) in self.particles.iter_mut().enumerate() {
            particle.x += particle.velocity * frame.dt;
            if particle.x > right {
                particle.x = -right;
                particle.y = random_range(&mut self.rng, -0.5, 0.5) * self.band_height;
            }
            particle.y += (frame.elapsed + index as f32 * 0.1).sin() * SWAY * steps;
            for _ in 0..frame_draws(&mut self.rng, steps) {
                Self::twinkle(&mut self.rng, particle);
            }
        }
    }

    fn render(&self, canvas: &mut Canvas) {
        let center_x = self.viewport.width / 2.0;
        let center_y = self.viewport.height / 2.0;
        for particle in &self.particles {
            // y grows upwards in field coordinates
            let x = center_x + particle.x;
            let y = center_y - particle.y;
            canvas.draw_sprite(x, y, particle.size / 2.0, &self.sprite, particle.alpha, BlendMode::Lighter);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

/// Soft white core fading through deep blue into nothing.
fn point_sprite() -> Gradient {
    Gradient::new([
        (0.0, Rgba::opaque(Color::WHITE)),
        (0.025, Rgba::opaque(Color::WHITE)),
        (0.1, Rgba::opaque(hsl_to_rgb(217.0, 61.0, 33.0))),
        (0.25, Rgba::opaque(hsl_to_rgb(217.0, 64.0, 6.0))),
        (1.0, Rgba::TRANSPARENT),
    ])
}
