//! An animated card scanner background for the terminal.
//!
//! A strip of cards scrolls past a vertical scan line. Cards reveal an ASCII face while
//! they cross it, an ambient particle field drifts behind them and a column of sparks at
//! the scan line flares up whenever a card is being scanned.
//!
//! The [`Scene`] owns the three effects and the [`ScanSignal`] coupling them. Effects
//! draw into [`render::Canvas`] layers that [`render::TerminalPresenter`] turns into half
//! block cells.

pub mod config;
pub mod effects;
pub mod logging;
pub mod render;
pub mod runner;
pub mod scene;
pub mod signal;

pub use config::{Config, ConfigError};
pub use scene::Scene;
pub use signal::ScanSignal;
