use crate::config::Config;
use crate::effects::{
    CardArt, CardStream, Effect, FrameContext, Interval, LayerKind, ParticleField, ScanLine, Scanner, Viewport,
    load_card_art,
};
use crate::render::{BlendMode, Canvas, CellSize};
use crate::signal::ScanSignal;
use std::rc::Rc;
use strum::IntoEnumIterator;

/// The composed background: the three effects, the signal coupling them and the canvases
/// they are drawn into.
///
/// Effects are `None` while the viewport has no area or when disabled in the config.
#[derive(Debug)]
pub struct Scene {
    config: Config,
    cell: CellSize,
    viewport: Viewport,
    scan_line: ScanLine,
    signal: ScanSignal,
    art: Vec<Rc<CardArt>>,
    rng: fastrand::Rng,
    card_stream: Option<CardStream>,
    particle_field: Option<ParticleField>,
    scanner: Option<Scanner>,
    ascii_refresh: Interval,
    elapsed: f32,
    frames: u64,
    output: Canvas,
    layer: Canvas,
}

impl Scene {
    pub fn new(config: &Config, columns: u16, rows: u16, seed: u64) -> Self {
        let cell = config.cell;
        let (art_width, art_height) = card_art_size(config);
        let art = load_card_art(&config.card_stream.images, art_width, art_height);
        let signal = ScanSignal::new();
        signal.subscribe(|active| tracing::debug!(active, "scan state changed"));

        let mut scene = Self {
            config: config.clone(),
            cell,
            viewport: Viewport::from_terminal(columns, rows, cell),
            scan_line: ScanLine::new(config.scan_line),
            signal,
            art,
            rng: fastrand::Rng::with_seed(seed),
            card_stream: None,
            particle_field: None,
            scanner: None,
            ascii_refresh: Interval::new(config.card_stream.ascii_refresh_interval()),
            elapsed: 0.0,
            frames: 0,
            output: Canvas::new(columns as usize, rows as usize, cell),
            layer: Canvas::new(columns as usize, rows as usize, cell),
        };
        scene.build_effects();
        scene
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn signal(&self) -> &ScanSignal {
        &self.signal
    }

    pub fn is_scanning(&self) -> bool {
        self.signal.is_active()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn card_stream(&self) -> Option<&CardStream> {
        self.card_stream.as_ref()
    }

    pub fn particle_field(&self) -> Option<&ParticleField> {
        self.particle_field.as_ref()
    }

    pub fn scanner(&self) -> Option<&Scanner> {
        self.scanner.as_ref()
    }

    /// Advance every effect by `dt` seconds.
    ///
    /// The card stream goes first since it publishes the signal the scanner reacts to.
    pub fn tick(&mut self, dt: f32) {
        let frame = FrameContext { dt, elapsed: self.elapsed, frame: self.frames };
        let refreshes = self.ascii_refresh.tick(dt);
        if let Some(card_stream) = &mut self.card_stream {
            card_stream.update(&frame);
            for _ in 0..refreshes {
                card_stream.refresh_ascii();
            }
        }
        if let Some(field) = &mut self.particle_field {
            field.update(&frame);
        }
        if let Some(scanner) = &mut self.scanner {
            scanner.update(&frame);
        }
        self.elapsed += dt;
        self.frames += 1;
    }

    /// Draw every layer and return the composed frame.
    pub fn render(&mut self) -> &Canvas {
        self.output.clear();
        if let Some(field) = &self.particle_field {
            self.layer.clear();
            field.render(&mut self.layer);
            self.output.composite(&self.layer, BlendMode::Lighter);
        }
        if let Some(card_stream) = &self.card_stream {
            self.layer.clear();
            card_stream.render(&mut self.layer);
            self.output.composite(&self.layer, BlendMode::SourceOver);
        }
        if let Some(scanner) = &self.scanner {
            self.layer.clear();
            scanner.render(&mut self.layer);
            self.output.composite(&self.layer, BlendMode::SourceOver);
        }
        &self.output
    }

    /// Follow a terminal size change. Effects keep their state unless the viewport
    /// disappears entirely.
    pub fn resize(&mut self, columns: u16, rows: u16) {
        let viewport = Viewport::from_terminal(columns, rows, self.cell);
        if viewport == self.viewport {
            return;
        }
        tracing::info!(columns, rows, "resizing scene");
        self.viewport = viewport;
        self.output = Canvas::new(columns as usize, rows as usize, self.cell);
        self.layer = Canvas::new(columns as usize, rows as usize, self.cell);

        if viewport.is_empty() {
            self.drop_effects();
            return;
        }
        let mut any_missing = false;
        match &mut self.card_stream {
            Some(card_stream) => card_stream.resize(viewport),
            None => any_missing |= self.config.card_stream.enabled,
        }
        match &mut self.particle_field {
            Some(field) => field.resize(viewport),
            None => any_missing |= self.config.particle_field.enabled,
        }
        match &mut self.scanner {
            Some(scanner) => scanner.resize(viewport),
            None => any_missing |= self.config.scanner.enabled,
        }
        if any_missing {
            self.build_effects();
        }
    }

    fn build_effects(&mut self) {
        if self.viewport.is_empty() {
            tracing::warn!("viewport has no area, effects are skipped until it grows");
            self.drop_effects();
            return;
        }
        for layer in LayerKind::iter().filter(|layer| !self.config.is_enabled(*layer)) {
            tracing::info!(%layer, "layer disabled");
        }
        let viewport = self.viewport;
        if self.config.card_stream.enabled && self.card_stream.is_none() {
            let seed = self.rng.u64(..);
            self.card_stream = Some(CardStream::new(
                &self.config.card_stream,
                viewport,
                self.scan_line,
                self.signal.clone(),
                self.art.clone(),
                seed,
            ));
        }
        if self.config.particle_field.enabled && self.particle_field.is_none() {
            let seed = self.rng.u64(..);
            self.particle_field = Some(ParticleField::new(&self.config.particle_field, viewport, seed));
        }
        if self.config.scanner.enabled && self.scanner.is_none() {
            let seed = self.rng.u64(..);
            self.scanner =
                Some(Scanner::new(&self.config.scanner, viewport, self.scan_line, self.signal.clone(), seed));
        }
    }

    fn drop_effects(&mut self) {
        self.card_stream = None;
        self.particle_field = None;
        self.scanner = None;
        self.signal.set(false);
    }
}

/// Card images are scaled to the canvas pixels a card covers.
fn card_art_size(config: &Config) -> (u32, u32) {
    let pixel_height = config.cell.height / 2.0;
    let width = (config.card_stream.card_width / config.cell.width).ceil().max(1.0);
    let height = (config.card_stream.card_height / pixel_height).ceil().max(1.0);
    (width as u32, height as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DT: f32 = 1.0 / 60.0;

    fn scene(columns: u16, rows: u16) -> Scene {
        Scene::new(&Config::default(), columns, rows, 42)
    }

    #[test]
    fn test_builds_every_layer() {
        let scene = scene(192, 30);
        assert!(scene.card_stream().is_some());
        assert!(scene.particle_field().is_some());
        assert!(scene.scanner().is_some());
        assert_eq!(scene.viewport(), Viewport::new(1920.0, 600.0));
    }

    #[rstest]
    #[case::no_columns(0, 30)]
    #[case::no_rows(192, 0)]
    fn test_empty_viewport_skips_effects(#[case] columns: u16, #[case] rows: u16) {
        let mut scene = scene(columns, rows);
        assert!(scene.card_stream().is_none());
        assert!(scene.particle_field().is_none());
        assert!(scene.scanner().is_none());
        for _ in 0..10 {
            scene.tick(DT);
            scene.render();
        }
        assert_eq!(scene.frames(), 10);
        assert!(!scene.is_scanning());
    }

    #[test]
    fn test_growing_from_empty_builds_effects() {
        let mut scene = scene(0, 0);
        scene.resize(120, 30);
        assert!(scene.card_stream().is_some());
        assert!(scene.scanner().is_some());
        scene.resize(0, 30);
        assert!(scene.card_stream().is_none());
    }

    #[rstest]
    #[case::particle_field(LayerKind::ParticleField)]
    #[case::card_stream(LayerKind::CardStream)]
    #[case::scanner(LayerKind::Scanner)]
    fn test_disabled_layer_is_skipped(#[case] layer: LayerKind) {
        let mut config = Config::default();
        config.set_enabled(layer, false);
        let mut scene = Scene::new(&config, 120, 30, 1);
        assert_eq!(scene.particle_field().is_some(), layer != LayerKind::ParticleField);
        assert_eq!(scene.card_stream().is_some(), layer != LayerKind::CardStream);
        assert_eq!(scene.scanner().is_some(), layer != LayerKind::Scanner);
        scene.tick(DT);
        scene.render();
    }

    #[test]
    fn test_resize_keeps_scan_line_coupled() {
        let mut scene = scene(192, 30);
        scene.tick(DT);
        scene.resize(100, 40);

        let scan_x = scene.card_stream().map(CardStream::scan_x);
        let bar_x = scene.scanner().map(Scanner::light_bar_x);
        assert_eq!(scan_x, bar_x);
        let expected = 1000.0 * Config::default().scan_line;
        assert!((scan_x.unwrap_or_default() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_cards_drive_scanner() {
        let mut scene = scene(192, 30);
        scene.tick(DT);
        // the strip starts at x = 0 so a card already sits on the scan line
        assert!(scene.is_scanning());

        for _ in 0..200 {
            scene.tick(DT);
        }
        let idle = Config::default().scanner.idle.intensity;
        let state = scene.scanner().map(Scanner::state).expect("no scanner");
        assert!(state.intensity > idle);
    }

    #[test]
    fn test_render_composes_layers() {
        let mut scene = scene(192, 30);
        for _ in 0..5 {
            scene.tick(DT);
        }
        let canvas = scene.render();
        assert_eq!((canvas.columns(), canvas.rows()), (192, 30));
        let lit = (0..canvas.pixel_height())
            .flat_map(|y| (0..canvas.columns()).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y).a > 0.0)
            .count();
        assert!(lit > 0);
    }

    #[test]
    fn test_card_art_size() {
        assert_eq!(card_art_size(&Config::default()), (34, 21));
    }
}
