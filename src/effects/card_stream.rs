use super::ascii_code::AsciiBlock;
use super::card_art::CardArt;
use super::common::{Effect, FrameContext, ScanLine, Viewport};
use crate::config::CardStreamConfig;
use crate::render::{BlendMode, Canvas, Color, Glyph, Rect, Rgba};
use crate::signal::ScanSignal;
use std::rc::Rc;

/// Backdrop behind the ASCII face.
const ASCII_BACKGROUND: Color = Color::new(8, 6, 20);
const ASCII_BACKGROUND_ALPHA: f32 = 0.9;
/// Ink used for the ASCII face glyphs.
const ASCII_INK: Color = Color::new(176, 164, 236);
/// Peak opacity of the flash shown when a card starts being scanned.
const FLASH_ALPHA: f32 = 0.5;

/// One card in the strip: an image face and an ASCII face layered on top of each other.
#[derive(Debug, Clone)]
pub struct CardWrapper {
    width: f32,
    height: f32,
    /// Percentage of the normal face hidden from its left edge
    normal_clip_right: f32,
    /// Percentage of the ASCII face shown from its left edge
    ascii_clip_left: f32,
    scanned: bool,
    flash_remaining: Option<f32>,
    code: AsciiBlock,
    art: Rc<CardArt>,
}

impl CardWrapper {
    pub fn normal_clip_right(&self) -> f32 {
        self.normal_clip_right
    }

    pub fn ascii_clip_left(&self) -> f32 {
        self.ascii_clip_left
    }

    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    /// Seconds left on the scan flash, if one is showing.
    pub fn flash_remaining(&self) -> Option<f32> {
        self.flash_remaining
    }

    pub fn code(&self) -> &AsciiBlock {
        &self.code
    }

    fn set_clip(&mut self, normal_clip_right: f32, ascii_clip_left: f32) {
        self.normal_clip_right = normal_clip_right;
        self.ascii_clip_left = ascii_clip_left;
    }
}

/// A horizontally looping strip of cards that reveals each card's ASCII face as it crosses
/// the scan line.
#[derive(Debug)]
pub struct CardStream {
    config: CardStreamConfig,
    cards: Vec<CardWrapper>,
    position: f32,
    direction: f32,
    viewport: Viewport,
    container_width: f32,
    line_width: f32,
    scan_line: ScanLine,
    scan_x: f32,
    signal: ScanSignal,
    rng: fastrand::Rng,
    flashes_triggered: u64,
}

impl CardStream {
    pub fn new(
        config: &CardStreamConfig,
        viewport: Viewport,
        scan_line: ScanLine,
        signal: ScanSignal,
        art: Vec<Rc<CardArt>>,
        seed: u64,
    ) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let art = if art.is_empty() { vec![Rc::new(CardArt::placeholder(1, 1))] } else { art };
        let (grid_width, grid_height) = grid_size(config);
        let cards = (0..config.card_count)
            .map(|index| CardWrapper {
                width: config.card_width,
                height: config.card_height,
                normal_clip_right: 0.0,
                ascii_clip_left: 0.0,
                scanned: false,
                flash_remaining: None,
                code: AsciiBlock::generate(grid_width, grid_height, &mut rng),
                art: art[index % art.len()].clone(),
            })
            .collect();
        let mut stream = Self {
            config: config.clone(),
            cards,
            position: 0.0,
            direction: -1.0,
            viewport,
            container_width: 0.0,
            line_width: 0.0,
            scan_line,
            scan_x: 0.0,
            signal,
            rng,
            flashes_triggered: 0,
        };
        stream.calculate_dimensions();
        tracing::debug!(cards = stream.cards.len(), line_width = stream.line_width, "card stream ready");
        stream
    }

    pub fn cards(&self) -> &[CardWrapper] {
        &self.cards
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    pub fn container_width(&self) -> f32 {
        self.container_width
    }

    pub fn scan_x(&self) -> f32 {
        self.scan_x
    }

    /// How many scan flashes have been started so far.
    pub fn flashes_triggered(&self) -> u64 {
        self.flashes_triggered
    }

    /// Regenerate the ASCII face of each card with the configured probability. Returns how
    /// many cards changed.
    pub fn refresh_ascii(&mut self) -> usize {
        let (grid_width, grid_height) = grid_size(&self.config);
        let mut refreshed = 0;
        for card in &mut self.cards {
            if self.rng.f32() < self.config.ascii_refresh_probability {
                card.code = AsciiBlock::generate(grid_width, grid_height, &mut self.rng);
                refreshed += 1;
            }
        }
        refreshed
    }

    fn calculate_dimensions(&mut self) {
        self.container_width = self.viewport.width;
        self.line_width = (self.config.card_width + self.config.card_gap) * self.cards.len() as f32;
        self.scan_x = self.scan_line.x_for(self.viewport);
    }

    fn card_left(&self, index: usize) -> f32 {
        self.position + index as f32 * (self.config.card_width + self.config.card_gap)
    }

    fn advance(&mut self, dt: f32) {
        self.position += self.config.velocity * self.direction * dt;
        if self.position < -self.line_width {
            self.position = self.container_width;
        } else if self.position > self.container_width {
            self.position = -self.line_width;
        }
    }

    fn tick_flashes(&mut self, dt: f32) {
        for card in &mut self.cards {
            if let Some(remaining) = card.flash_remaining.as_mut() {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    card.flash_remaining = None;
                }
            }
        }
    }

    /// Recompute every card's clip percentages against the scan band and publish whether
    /// any card is under it.
    fn update_clipping(&mut self) -> bool {
        let half_band = self.config.scan_band_width / 2.0;
        let band_left = self.scan_x - half_band;
        let band_right = self.scan_x + half_band;
        let flash_duration = self.config.flash_duration().as_secs_f32();
        let mut any_scanning = false;

        for index in 0..self.cards.len() {
            let card_left = self.card_left(index);
            let card = &mut self.cards[index];
            let card_right = card_left + card.width;

            if card_left < band_right && card_right > band_left {
                any_scanning = true;
                let intersect_left = (band_left - card_left).max(0.0);
                let intersect_right = (band_right - card_left).min(card.width);
                card.set_clip(intersect_left / card.width * 100.0, intersect_right / card.width * 100.0);

                if !card.scanned && intersect_left > 0.0 {
                    card.scanned = true;
                    card.flash_remaining = Some(flash_duration);
                    self.flashes_triggered += 1;
                }
            } else {
                if card_right < band_left {
                    card.set_clip(100.0, 100.0);
                } else if card_left > band_right {
                    card.set_clip(0.0, 0.0);
                }
                card.scanned = false;
            }
        }

        self.signal.set(any_scanning);
        any_scanning
    }

    fn render_card(&self, canvas: &mut Canvas, card: &CardWrapper, left: f32, top: f32) {
        let rect = Rect::new(left, top, card.width, card.height);
        let normal_from = left + card.width * card.normal_clip_right / 100.0;
        let ascii_until = left + card.width * card.ascii_clip_left / 100.0;
        let backdrop = Rgba::from_color(ASCII_BACKGROUND, ASCII_BACKGROUND_ALPHA);

        canvas.fill_rect(rect, BlendMode::SourceOver, |x, y| {
            if x < ascii_until {
                backdrop
            } else if x >= normal_from {
                card.art.sample((x - left) / card.width, (y - top) / card.height)
            } else {
                Rgba::TRANSPARENT
            }
        });

        if let Some(remaining) = card.flash_remaining {
            let strength = FLASH_ALPHA * (remaining / self.config.flash_duration().as_secs_f32()).clamp(0.0, 1.0);
            let flash = Rgba::from_color(Color::WHITE, strength);
            canvas.fill_rect(rect, BlendMode::Lighter, |_, _| flash);
        }

        if ascii_until <= left {
            return;
        }
        let cell = canvas.cell_size();
        let first_column = (left / cell.width).floor().max(0.0) as usize;
        let last_column = ((ascii_until / cell.width).ceil().max(0.0) as usize).min(canvas.columns());
        let first_row = (top / cell.height).floor().max(0.0) as usize;
        let last_row = ((rect.bottom() / cell.height).ceil().max(0.0) as usize).min(canvas.rows());
        for row in first_row..last_row {
            for column in first_column..last_column {
                let (cx, cy) = canvas.cell_center(column, row);
                if !rect.contains(cx, cy) || cx >= ascii_until {
                    continue;
                }
                let grid_column = ((cx - left) / self.config.char_width) as usize;
                let grid_row = ((cy - top) / self.config.line_height) as usize;
                let ch = card.code.char_at(grid_column, grid_row);
                if ch != ' ' {
                    canvas.put_glyph(column, row, Glyph { ch, color: ASCII_INK });
                }
            }
        }
    }
}

impl Effect for CardStream {
    fn update(&mut self, frame: &FrameContext) {
        self.advance(frame.dt);
        self.tick_flashes(frame.dt);
        self.update_clipping();
    }

    fn render(&self, canvas: &mut Canvas) {
        let top = self.viewport.band_top(self.config.card_height);
        for (index, card) in self.cards.iter().enumerate() {
            let left = self.card_left(index);
            if left > self.viewport.width || left + card.width < 0.0 {
                continue;
            }
            self.render_card(canvas, card, left, top);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.calculate_dimensions();
    }
}

/// The ASCII grid that fits a card.
fn grid_size(config: &CardStreamConfig) -> (usize, usize) {
    let width = (config.card_width / config.char_width).floor().max(0.0) as usize;
    let height = (config.card_height / config.line_height).floor().max(0.0) as usize;
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CellSize;

    const WIDTH: f32 = 1920.0;

    fn stream() -> (CardStream, ScanSignal) {
        let signal = ScanSignal::new();
        let stream = CardStream::new(
            &CardStreamConfig::default(),
            Viewport::new(WIDTH, 600.0),
            ScanLine::new(0.6),
            signal.clone(),
            vec![Rc::new(CardArt::placeholder(34, 21))],
            1,
        );
        (stream, signal)
    }

    fn frame(dt: f32) -> FrameContext {
        FrameContext { dt, elapsed: 0.0, frame: 0 }
    }

    #[test]
    fn test_defaults() {
        let (stream, _) = stream();
        assert_eq!(stream.cards().len(), 30);
        assert_eq!(stream.line_width(), (340.0 + 40.0) * 30.0);
        assert_eq!(stream.scan_x(), WIDTH * 0.6);
        assert_eq!(stream.cards()[0].code().width(), 56);
        assert_eq!(stream.cards()[0].code().height(), 17);
    }

    #[test]
    fn test_moves_left() {
        let (mut stream, _) = stream();
        stream.update(&frame(0.5));
        assert_eq!(stream.position(), -60.0);
    }

    #[test]
    fn test_wraps_to_container_width() {
        let (mut stream, _) = stream();
        stream.position = -(340.0 + 40.0) * 30.0 - 1.0;
        stream.update(&frame(0.0));
        assert_eq!(stream.position(), WIDTH);
    }

    #[test]
    fn test_wraps_to_line_start() {
        let (mut stream, _) = stream();
        stream.position = WIDTH + 1.0;
        stream.update(&frame(0.0));
        assert_eq!(stream.position(), -stream.line_width());
    }

    #[test]
    fn test_cards_right_of_band_are_unscanned() {
        let (mut stream, signal) = stream();
        stream.position = stream.scan_x() + 100.0;
        stream.update(&frame(0.0));
        for card in stream.cards() {
            assert_eq!(card.normal_clip_right(), 0.0);
            assert_eq!(card.ascii_clip_left(), 0.0);
        }
        assert!(!signal.is_active());
    }

    #[test]
    fn test_cards_left_of_band_are_fully_ascii() {
        let (mut stream, signal) = stream();
        stream.position = stream.scan_x() - stream.line_width() - 100.0;
        stream.update(&frame(0.0));
        for card in stream.cards() {
            assert_eq!(card.normal_clip_right(), 100.0);
            assert_eq!(card.ascii_clip_left(), 100.0);
        }
        assert!(!signal.is_active());
    }

    #[test]
    fn test_partial_intersection() {
        let (mut stream, signal) = stream();
        stream.position = stream.scan_x() - 100.0;
        stream.update(&frame(0.0));

        let card = &stream.cards()[0];
        assert!((card.normal_clip_right() - 96.0 / 340.0 * 100.0).abs() < 1e-3);
        assert!((card.ascii_clip_left() - 104.0 / 340.0 * 100.0).abs() < 1e-3);
        assert!(card.is_scanned());
        assert!(card.flash_remaining().is_some());
        assert!(signal.is_active());
        assert_eq!(stream.flashes_triggered(), 1);
    }

    #[test]
    fn test_flash_fires_once_per_pass() {
        let (mut stream, _) = stream();
        stream.position = stream.scan_x() - 100.0;
        stream.update(&frame(0.0));
        stream.position -= 10.0;
        stream.update(&frame(0.0));
        assert_eq!(stream.flashes_triggered(), 1);

        // leave the band through the gap, then come back
        stream.position = stream.scan_x() - 340.0 - 10.0;
        stream.update(&frame(0.0));
        assert!(!stream.cards()[0].is_scanned());
        stream.position = stream.scan_x() - 100.0;
        stream.update(&frame(0.0));
        assert_eq!(stream.flashes_triggered(), 2);
    }

    #[test]
    fn test_flash_expires() {
        let (mut stream, _) = stream();
        stream.position = stream.scan_x() - 100.0;
        stream.update(&frame(0.0));
        // hold the card in place across frames
        stream.config.velocity = 0.0;
        stream.update(&frame(0.5));
        assert!(stream.cards()[0].flash_remaining().is_some());
        stream.update(&frame(0.2));
        assert!(stream.cards()[0].flash_remaining().is_none());
    }

    #[test]
    fn test_band_in_gap_is_inactive() {
        let (mut stream, signal) = stream();
        signal.set(true);
        // card 0 ends 10px before the band center, card 1 starts 30px after it
        stream.position = stream.scan_x() - 350.0;
        stream.update(&frame(0.0));
        assert!(!signal.is_active());
    }

    #[test]
    fn test_resize_moves_scan_line() {
        let (mut stream, _) = stream();
        stream.resize(Viewport::new(1000.0, 600.0));
        assert_eq!(stream.scan_x(), 600.0);
        assert_eq!(stream.container_width(), 1000.0);
    }

    #[test]
    fn test_refresh_probability() {
        let (mut stream, _) = stream();
        stream.config.ascii_refresh_probability = 1.0;
        assert_eq!(stream.refresh_ascii(), 30);
        stream.config.ascii_refresh_probability = 0.0;
        assert_eq!(stream.refresh_ascii(), 0);
    }

    #[test]
    fn test_render_splits_faces() {
        let (mut stream, _) = stream();
        stream.position = stream.scan_x() - 170.0;
        stream.update(&frame(0.0));

        let mut canvas = Canvas::new(192, 30, CellSize::default());
        stream.render(&mut canvas);

        // left half of card 0 shows code, right half shows the image
        let row = 15;
        let left_column = ((stream.position() + 20.0) / 10.0) as usize;
        let right_column = ((stream.position() + 320.0) / 10.0) as usize;
        assert!((0..17).any(|offset| canvas.glyph(left_column + offset, row).is_some()));
        assert!(canvas.glyph(right_column, row).is_none());
        assert!(canvas.pixel(right_column, row * 2).a > 0.9);
    }
}
