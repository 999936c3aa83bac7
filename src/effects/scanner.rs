use super::common::{Effect, FrameContext, ScanLine, Viewport, approach, frame_draws, random_range};
use super::pool::ParticlePool;
use crate::config::{ScanTuning, ScannerConfig};
use crate::render::{BlendMode, Canvas, Color, Gradient, Rect, Rgba};
use crate::signal::ScanSignal;

/// Particles past the right edge by this much are recycled.
const RIGHT_SLACK: f32 = 10.0;
/// Extra spawn attempts once the intensity ratio passes a threshold, as
/// `(threshold, probability multiplier)`.
const SPAWN_TIERS: [(f32, f32); 4] = [(1.1, 1.2), (1.3, 1.4), (1.5, 1.8), (2.0, 2.0)];
/// Horizontal samples per pixel when drawing the light bar, which is narrower than a cell.
const BAR_SAMPLES: usize = 4;

const LAVENDER: Color = Color::new(196, 181, 253);
const VIOLET: Color = Color::new(139, 92, 246);

/// A single spark emitted from the scan line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannerParticle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub alpha: f32,
    pub original_alpha: f32,
    pub decay: f32,
    pub life: f32,
    pub time: f32,
    pub twinkle_speed: f32,
    pub twinkle_amount: f32,
}

/// The smoothed emission parameters, eased towards either the idle or the scanning set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterState {
    pub intensity: f32,
    pub max_particles: f32,
    pub fade_zone: f32,
    pub glow: f32,
}

impl From<&ScanTuning> for EmitterState {
    fn from(tuning: &ScanTuning) -> Self {
        Self {
            intensity: tuning.intensity,
            max_particles: tuning.max_particles as f32,
            fade_zone: tuning.fade_zone,
            glow: tuning.glow,
        }
    }
}

/// A bright vertical bar at the scan line plus a column of sparks whose emission ramps up
/// while cards are being scanned.
#[derive(Debug)]
pub struct Scanner {
    config: ScannerConfig,
    pool: ParticlePool<ScannerParticle>,
    state: EmitterState,
    viewport: Viewport,
    scan_line: ScanLine,
    light_bar_x: f32,
    signal: ScanSignal,
    rng: fastrand::Rng,
}

impl Scanner {
    pub fn new(config: &ScannerConfig, viewport: Viewport, scan_line: ScanLine, signal: ScanSignal, seed: u64) -> Self {
        let capacity = config.idle.max_particles.max(config.scanning.max_particles) + config.overflow;
        let mut scanner = Self {
            config: config.clone(),
            pool: ParticlePool::with_capacity(capacity),
            state: EmitterState::from(&config.idle),
            viewport,
            scan_line,
            light_bar_x: scan_line.x_for(viewport),
            signal,
            rng: fastrand::Rng::with_seed(seed),
        };
        for _ in 0..config.idle.max_particles {
            scanner.spawn();
        }
        tracing::debug!(capacity, live = scanner.pool.len(), "scanner ready");
        scanner
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    pub fn light_bar_x(&self) -> f32 {
        self.light_bar_x
    }

    pub fn live_particles(&self) -> usize {
        self.pool.len()
    }

    pub fn particles(&self) -> impl Iterator<Item = &ScannerParticle> {
        self.pool.iter()
    }

    /// The particle count the emitter is currently allowed to grow to.
    pub fn particle_cap(&self) -> usize {
        self.state.max_particles.floor().max(0.0) as usize
    }

    fn intensity_ratio(&self) -> f32 {
        let base = self.config.idle.intensity;
        if base > 0.0 { self.state.intensity / base } else { 1.0 }
    }

    fn spawn(&mut self) -> bool {
        let ratio = self.intensity_ratio();
        let band = self.band();
        let Some(slot) = self.pool.spawn() else {
            return false;
        };
        *slot = new_particle(&mut self.rng, ratio, band);
        true
    }

    fn band(&self) -> SpawnBand {
        SpawnBand {
            x: self.light_bar_x,
            half_width: self.config.light_bar_width / 2.0,
            height: self.config.band_height,
        }
    }

    fn smooth_state(&mut self, steps: f32) {
        let target = if self.signal.is_active() { &self.config.scanning } else { &self.config.idle };
        let rate = self.config.transition_speed;
        self.state = EmitterState {
            intensity: approach(self.state.intensity, target.intensity, rate, steps),
            max_particles: approach(self.state.max_particles, target.max_particles as f32, rate, steps),
            fade_zone: approach(self.state.fade_zone, target.fade_zone, rate, steps),
            glow: approach(self.state.glow, target.glow, rate, steps),
        };
    }

    fn step_particles(&mut self, steps: f32) {
        let right_edge = self.viewport.width + RIGHT_SLACK;
        let band = self.band();
        for particle in self.pool.iter_mut() {
            particle.x += particle.vx * steps;
            particle.y += particle.vy * steps;
            particle.time += steps;
            let twinkle = (particle.time * particle.twinkle_speed).sin() * particle.twinkle_amount;
            particle.alpha = (particle.original_alpha * particle.life + twinkle).clamp(0.0, 1.0);
            particle.life -= particle.decay * steps;
            if particle.x > right_edge || particle.life <= 0.0 {
                reset_particle(&mut self.rng, particle, band);
            }
        }
    }

    /// Run one emission round per reference frame covered by `steps`.
    fn emit(&mut self, steps: f32) {
        for _ in 0..frame_draws(&mut self.rng, steps) {
            self.emit_once();
        }
    }

    /// Spawn new particles according to the current intensity, then trim any overflow.
    fn emit_once(&mut self) {
        let cap = self.particle_cap();
        let hard_cap = cap + self.config.overflow;
        let ratio = self.intensity_ratio();

        if self.rng.f32() < self.state.intensity && self.pool.len() < cap {
            self.spawn();
        }
        for (threshold, multiplier) in SPAWN_TIERS {
            if ratio > threshold && self.rng.f32() < (ratio - threshold) * multiplier && self.pool.len() < hard_cap {
                self.spawn();
            }
        }

        if self.pool.len() > hard_cap {
            let excess = self.config.trim_per_frame.min(self.pool.len() - cap);
            self.pool.truncate(self.pool.len() - excess);
        }
    }

    /// How much a particle at `y` (band coordinates) is faded by the top and bottom zones.
    fn vertical_fade(&self, y: f32) -> f32 {
        let fade = self.state.fade_zone;
        let height = self.config.band_height;
        if fade <= 0.0 {
            return 1.0;
        }
        let factor = if y < fade {
            y / fade
        } else if y > height - fade {
            (height - y) / fade
        } else {
            1.0
        };
        factor.clamp(0.0, 1.0)
    }

    fn render_light_bar(&self, canvas: &mut Canvas, top: f32) {
        let scanning = self.signal.is_active();
        let glow = self.state.glow;
        let width = self.config.light_bar_width;
        let height = self.config.band_height;

        let mut bands = vec![
            (width, Rgba::from_color(Color::WHITE, glow), 1.0),
            (width * 2.0, Rgba::from_color(LAVENDER, 0.8 * glow), if scanning { 1.0 } else { 0.8 }),
            (width * 4.0, Rgba::from_color(VIOLET, 0.4 * glow), if scanning { 0.8 } else { 0.6 }),
        ];
        if scanning {
            bands.push((width * 8.0, Rgba::from_color(VIOLET, 0.2), 0.6));
        }

        for (half_width, color, global_alpha) in bands {
            let gradient = Gradient::band(color.scale(global_alpha));
            let left = self.light_bar_x - half_width;
            let rect = Rect::new(left, top, half_width * 2.0, height);
            canvas.fill_rect_supersampled(rect, BAR_SAMPLES, BlendMode::Lighter, |x, _| {
                gradient.sample((x - left) / (half_width * 2.0))
            });
        }
        canvas.mask_rows(top, height, &Gradient::edge_fade(self.state.fade_zone, height));
    }
}

impl Effect for Scanner {
    fn update(&mut self, frame: &FrameContext) {
        let steps = frame.steps();
        self.smooth_state(steps);
        self.step_particles(steps);
        self.emit(steps);
    }

    /// Draw into a dedicated layer: the light bar mask clears everything drawn before it.
    fn render(&self, canvas: &mut Canvas) {
        let top = self.viewport.band_top(self.config.band_height);
        self.render_light_bar(canvas, top);

        let sprite = spark_sprite();
        for particle in self.pool.iter() {
            if particle.life <= 0.0 {
                continue;
            }
            let alpha = particle.alpha * self.vertical_fade(particle.y);
            canvas.draw_sprite(particle.x, top + particle.y, particle.radius, &sprite, alpha, BlendMode::Lighter);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.light_bar_x = self.scan_line.x_for(viewport);
    }
}

/// Where fresh particles appear.
#[derive(Debug, Clone, Copy)]
struct SpawnBand {
    x: f32,
    half_width: f32,
    height: f32,
}

fn new_particle(rng: &mut fastrand::Rng, ratio: f32, band: SpawnBand) -> ScannerParticle {
    let speed = 1.0 + (ratio - 1.0) * 1.2;
    let alpha = random_range(rng, 0.6, 1.0);
    ScannerParticle {
        x: band.x + random_range(rng, -band.half_width, band.half_width),
        y: random_range(rng, 0.0, band.height),
        vx: random_range(rng, 0.2, 1.0) * speed,
        vy: random_range(rng, -0.15, 0.15) * speed,
        radius: random_range(rng, 0.4, 1.0) * (1.0 + (ratio - 1.0) * 0.7),
        alpha,
        original_alpha: alpha,
        decay: random_range(rng, 0.005, 0.025) * (2.0 - ratio * 0.5),
        life: 1.0,
        time: 0.0,
        twinkle_speed: random_range(rng, 0.02, 0.08) * speed,
        twinkle_amount: random_range(rng, 0.1, 0.25),
    }
}

/// Recycle a particle in place: back to the scan line with fresh motion and full life.
fn reset_particle(rng: &mut fastrand::Rng, particle: &mut ScannerParticle, band: SpawnBand) {
    particle.x = band.x + random_range(rng, -band.half_width, band.half_width);
    particle.y = random_range(rng, 0.0, band.height);
    particle.vx = random_range(rng, 0.2, 1.0);
    particle.vy = random_range(rng, -0.15, 0.15);
    particle.alpha = random_range(rng, 0.6, 1.0);
    particle.original_alpha = particle.alpha;
    particle.life = 1.0;
    particle.time = 0.0;
}

fn spark_sprite() -> Gradient {
    Gradient::new([
        (0.0, Rgba::opaque(Color::WHITE)),
        (0.3, Rgba::from_color(LAVENDER, 0.8)),
        (0.7, Rgba::from_color(VIOLET, 0.4)),
        (1.0, Rgba::TRANSPARENT),
    ])
}
