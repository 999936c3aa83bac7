use super::color::{Color, Rgba};
use super::gradient::Gradient;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The size of a terminal cell in logical pixels.
///
/// Effects work in logical pixels, the same units a browser page would use, and the
/// canvas maps them onto half-cell pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellSize {
    pub width: f32,
    pub height: f32,
}

impl Default for CellSize {
    fn default() -> Self {
        Self { width: 10.0, height: 20.0 }
    }
}

/// How a source value is combined with what's already on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    SourceOver,
    Lighter,
}

/// A character drawn on top of a cell's pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub color: Color,
}

/// An axis aligned rectangle in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// A software raster with one pixel per terminal column and two per terminal row, plus a
/// glyph plane with one entry per cell.
#[derive(Clone, Debug)]
pub struct Canvas {
    columns: usize,
    rows: usize,
    cell: CellSize,
    pixels: Vec<Rgba>,
    glyphs: Vec<Option<Glyph>>,
}

impl Canvas {
    pub fn new(columns: usize, rows: usize, cell: CellSize) -> Self {
        Self {
            columns,
            rows,
            cell,
            pixels: vec![Rgba::TRANSPARENT; columns * rows * 2],
            glyphs: vec![None; columns * rows],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn pixel_height(&self) -> usize {
        self.rows * 2
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell
    }

    /// The size of a single pixel in logical units.
    pub fn pixel_size(&self) -> (f32, f32) {
        (self.cell.width, self.cell.height / 2.0)
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Rgba::TRANSPARENT);
        self.glyphs.fill(None);
    }

    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        if x >= self.columns {
            return Rgba::TRANSPARENT;
        }
        self.pixels.get(y * self.columns + x).copied().unwrap_or_default()
    }

    pub fn glyph(&self, column: usize, row: usize) -> Option<Glyph> {
        if column >= self.columns {
            return None;
        }
        self.glyphs.get(row * self.columns + column).copied().flatten()
    }

    pub fn put_glyph(&mut self, column: usize, row: usize, glyph: Glyph) {
        if column < self.columns && row < self.rows {
            self.glyphs[row * self.columns + column] = Some(glyph);
        }
    }

    /// The logical coordinates of a pixel's center.
    pub fn pixel_center(&self, x: usize, y: usize) -> (f32, f32) {
        let (width, height) = self.pixel_size();
        ((x as f32 + 0.5) * width, (y as f32 + 0.5) * height)
    }

    /// The logical coordinates of a cell's center.
    pub fn cell_center(&self, column: usize, row: usize) -> (f32, f32) {
        ((column as f32 + 0.5) * self.cell.width, (row as f32 + 0.5) * self.cell.height)
    }

    pub fn blend_pixel(&mut self, x: usize, y: usize, color: Rgba, mode: BlendMode) {
        if x >= self.columns || y >= self.pixel_height() {
            return;
        }
        let pixel = &mut self.pixels[y * self.columns + x];
        *pixel = match mode {
            BlendMode::SourceOver => pixel.source_over(color),
            BlendMode::Lighter => pixel.lighter(color),
        };
    }

    /// Paint every pixel whose center lies inside `rect`. `paint` receives logical
    /// coordinates.
    pub fn fill_rect(&mut self, rect: Rect, mode: BlendMode, paint: impl Fn(f32, f32) -> Rgba) {
        let (pixel_width, pixel_height) = self.pixel_size();
        let xs = center_span(rect.x, rect.right(), pixel_width, self.columns);
        let ys = center_span(rect.y, rect.bottom(), pixel_height, self.pixel_height());
        for y in ys {
            for x in xs.clone() {
                let (cx, cy) = self.pixel_center(x, y);
                let color = paint(cx, cy);
                self.blend_pixel(x, y, color, mode);
            }
        }
    }

    /// Like [`Canvas::fill_rect`], but averages `samples × samples` points per pixel so
    /// shapes narrower than a pixel still leave a trace.
    pub fn fill_rect_supersampled(
        &mut self,
        rect: Rect,
        samples: usize,
        mode: BlendMode,
        paint: impl Fn(f32, f32) -> Rgba,
    ) {
        let samples = samples.max(1);
        let (pixel_width, pixel_height) = self.pixel_size();
        let xs = overlap_span(rect.x, rect.right(), pixel_width, self.columns);
        let ys = overlap_span(rect.y, rect.bottom(), pixel_height, self.pixel_height());
        let weight = 1.0 / (samples * samples) as f32;
        for y in ys {
            for x in xs.clone() {
                let mut total = Rgba::TRANSPARENT;
                for sy in 0..samples {
                    for sx in 0..samples {
                        let lx = (x as f32 + (sx as f32 + 0.5) / samples as f32) * pixel_width;
                        let ly = (y as f32 + (sy as f32 + 0.5) / samples as f32) * pixel_height;
                        if rect.contains(lx, ly) {
                            let sample = paint(lx, ly);
                            total = Rgba {
                                r: total.r + sample.r * weight,
                                g: total.g + sample.g * weight,
                                b: total.b + sample.b * weight,
                                a: total.a + sample.a * weight,
                            };
                        }
                    }
                }
                self.blend_pixel(x, y, total, mode);
            }
        }
    }

    /// Draw a radial sprite centered at `(cx, cy)`, clipped to the canvas. The pixel
    /// containing the center is always touched when it is on the canvas, so sprites smaller
    /// than a pixel remain visible.
    pub fn draw_sprite(&mut self, cx: f32, cy: f32, radius: f32, sprite: &Gradient, alpha: f32, mode: BlendMode) {
        if radius <= 0.0 || alpha <= 0.0 {
            return;
        }
        let (pixel_width, pixel_height) = self.pixel_size();
        let center = (cx >= 0.0 && cy >= 0.0)
            .then(|| ((cx / pixel_width) as usize, (cy / pixel_height) as usize))
            .filter(|&(x, y)| x < self.columns && y < self.pixel_height());
        let xs = overlap_span(cx - radius, cx + radius, pixel_width, self.columns);
        let ys = overlap_span(cy - radius, cy + radius, pixel_height, self.pixel_height());
        for y in ys {
            for x in xs.clone() {
                let distance = if center == Some((x, y)) {
                    0.0
                } else {
                    let (px, py) = self.pixel_center(x, y);
                    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt() / radius
                };
                if distance <= 1.0 {
                    let color = sprite.sample(distance).scale(alpha);
                    self.blend_pixel(x, y, color, mode);
                }
            }
        }
    }

    /// Destination-in composition with a vertical mask spanning `[top, top + height]`.
    /// Pixels outside the span are cleared.
    pub fn mask_rows(&mut self, top: f32, height: f32, mask: &Gradient) {
        for y in 0..self.pixel_height() {
            let (_, cy) = self.pixel_center(0, y);
            let factor = if height > 0.0 && cy >= top && cy <= top + height {
                mask.sample((cy - top) / height).a
            } else {
                0.0
            };
            let row = &mut self.pixels[y * self.columns..(y + 1) * self.columns];
            for pixel in row {
                *pixel = pixel.scale(factor);
            }
        }
    }

    /// Composite another canvas of the same size on top of this one. Glyphs in `layer`
    /// replace the ones underneath.
    pub fn composite(&mut self, layer: &Canvas, mode: BlendMode) {
        let columns = self.columns.min(layer.columns);
        let pixel_rows = self.pixel_height().min(layer.pixel_height());
        for y in 0..pixel_rows {
            for x in 0..columns {
                let color = layer.pixel(x, y);
                self.blend_pixel(x, y, color, mode);
            }
        }
        for row in 0..self.rows.min(layer.rows) {
            for column in 0..columns {
                if let Some(glyph) = layer.glyph(column, row) {
                    self.put_glyph(column, row, glyph);
                }
            }
        }
    }
}

/// Pixels whose centers fall within `[start, end)`.
fn center_span(start: f32, end: f32, size: f32, limit: usize) -> Range<usize> {
    if end <= start || size <= 0.0 {
        return 0..0;
    }
    let low = (start / size - 0.5).ceil().max(0.0) as usize;
    let high = ((end / size - 0.5).ceil().max(0.0) as usize).min(limit);
    low..high.max(low)
}

/// Pixels that overlap `[start, end)` at all.
fn overlap_span(start: f32, end: f32, size: f32, limit: usize) -> Range<usize> {
    if end <= start || size <= 0.0 {
        return 0..0;
    }
    let low = (start / size).floor().max(0.0) as usize;
    let high = ((end / size).ceil().max(0.0) as usize).min(limit);
    low..high.max(low)
}
