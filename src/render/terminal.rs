use super::canvas::Canvas;
use super::cells::{Cell, rasterize};
use super::color::Color;
use crossterm::{
    cursor, execute, queue,
    style::{self, Color as TermColor, Colors},
    terminal,
};
use std::io::{self, Stdout, Write};

/// Errors that can occur when drawing to the terminal
#[derive(thiserror::Error, Debug)]
pub enum PresenterError {
    #[error("failed to write to the terminal: {0}")]
    Io(#[from] io::Error),
}

/// Draws canvases to a terminal, only rewriting the cells that changed since the last
/// frame.
pub struct TerminalPresenter<W: Write> {
    out: W,
    background: Color,
    previous: Vec<Cell>,
    columns: usize,
    /// Whether this presenter switched the terminal into raw/alternate mode and has to
    /// restore it.
    owns_terminal: bool,
}

impl TerminalPresenter<Stdout> {
    /// Take over stdout: raw mode, alternate screen, hidden cursor.
    pub fn enter(background: Color) -> Result<Self, PresenterError> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
            terminal::Clear(terminal::ClearType::All),
        )?;
        Ok(Self { out, background, previous: Vec::new(), columns: 0, owns_terminal: true })
    }
}

impl<W: Write> TerminalPresenter<W> {
    /// A presenter over an arbitrary writer that leaves terminal modes alone.
    pub fn with_writer(out: W, background: Color) -> Self {
        Self { out, background, previous: Vec::new(), columns: 0, owns_terminal: false }
    }

    /// Forget what's on screen so the next frame is drawn in full.
    pub fn invalidate(&mut self) {
        self.previous.clear();
    }

    /// Draw a canvas and return the number of cells written.
    pub fn present(&mut self, canvas: &Canvas) -> Result<usize, PresenterError> {
        let cells = rasterize(canvas, self.background);
        if self.columns != canvas.columns() || self.previous.len() != cells.len() {
            self.previous.clear();
            self.columns = canvas.columns();
            queue!(self.out, style::ResetColor, terminal::Clear(terminal::ClearType::All))?;
        }

        let mut written = 0;
        let mut cursor_at: Option<usize> = None;
        let mut colors: Option<(Color, Color)> = None;
        for (index, cell) in cells.iter().enumerate() {
            if self.previous.get(index) == Some(cell) {
                continue;
            }
            if cursor_at != Some(index) {
                let column = (index % self.columns) as u16;
                let row = (index / self.columns) as u16;
                queue!(self.out, cursor::MoveTo(column, row))?;
            }
            if colors != Some((cell.fg, cell.bg)) {
                queue!(self.out, style::SetColors(Colors::new(term_color(cell.fg), term_color(cell.bg))))?;
                colors = Some((cell.fg, cell.bg));
            }
            queue!(self.out, style::Print(cell.ch))?;
            written += 1;
            // the cursor doesn't wrap with line wrapping disabled
            cursor_at = if (index + 1) % self.columns == 0 { None } else { Some(index + 1) };
        }
        queue!(self.out, style::ResetColor)?;
        self.out.flush()?;
        self.previous = cells;
        Ok(written)
    }

    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Drop for TerminalPresenter<W> {
    fn drop(&mut self) {
        if self.owns_terminal {
            let _ = execute!(
                self.out,
                style::ResetColor,
                terminal::LeaveAlternateScreen,
                cursor::Show,
                terminal::EnableLineWrap,
            );
            let _ = terminal::disable_raw_mode();
        }
    }
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb { r: color.r, g: color.g, b: color.b }
}
