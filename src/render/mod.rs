//! Software compositing and terminal output.
//!
//! Effects draw into [`Canvas`] layers in logical pixel units. Layers are composited and
//! flattened into half block [`Cell`]s, which the [`TerminalPresenter`] writes out.

mod canvas;
mod cells;
mod color;
mod gradient;
pub mod terminal;

pub use canvas::{BlendMode, Canvas, CellSize, Glyph, Rect};
pub use cells::{Cell, UPPER_HALF_BLOCK, rasterize};
pub use color::{Color, Rgba, hsl_to_rgb};
pub use gradient::Gradient;
pub use terminal::{PresenterError, TerminalPresenter};
