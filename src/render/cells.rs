use super::canvas::Canvas;
use super::color::Color;

/// The upper half block, drawn with the top pixel as foreground and the bottom pixel as
/// background.
pub const UPPER_HALF_BLOCK: char = '\u{2580}';

/// A single terminal cell ready to be printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

/// Flatten a canvas over `background` into a row-major grid of cells.
pub fn rasterize(canvas: &Canvas, background: Color) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(canvas.columns() * canvas.rows());
    for row in 0..canvas.rows() {
        for column in 0..canvas.columns() {
            let top = canvas.pixel(column, row * 2).over(background);
            let bottom = canvas.pixel(column, row * 2 + 1).over(background);
            let cell = match canvas.glyph(column, row) {
                Some(glyph) => Cell { ch: glyph.ch, fg: glyph.color, bg: top.lerp(bottom, 0.5) },
                None if top == bottom => Cell { ch: ' ', fg: top, bg: bottom },
                None => Cell { ch: UPPER_HALF_BLOCK, fg: top, bg: bottom },
            };
            cells.push(cell);
        }
    }
    cells
}
