use crate::config::{Config, ConfigError};
use crate::render::{PresenterError, TerminalPresenter};
use crate::scene::Scene;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Longest step the interactive loop feeds the scene, so a stalled terminal doesn't make
/// the strip jump.
const MAX_FRAME_DT: f32 = 0.1;

/// Terminal size assumed when running without one.
pub const HEADLESS_COLUMNS: u16 = 192;
pub const HEADLESS_ROWS: u16 = 30;

/// Errors that can occur while running the animation
#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Presenter(#[from] PresenterError),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

/// What happened during a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub scanning_frames: u64,
    pub peak_scanner_particles: usize,
    pub final_scanner_particles: usize,
    pub flashes_triggered: u64,
    pub cells_written: usize,
}

impl RunSummary {
    fn record(&mut self, scene: &Scene, cells_written: usize) {
        self.frames += 1;
        if scene.is_scanning() {
            self.scanning_frames += 1;
        }
        let live = scene.scanner().map(|scanner| scanner.live_particles()).unwrap_or_default();
        self.peak_scanner_particles = self.peak_scanner_particles.max(live);
        self.final_scanner_particles = live;
        self.flashes_triggered = scene.card_stream().map(|cards| cards.flashes_triggered()).unwrap_or_default();
        self.cells_written += cells_written;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames:                  {}", self.frames)?;
        writeln!(f, "frames scanning:         {}", self.scanning_frames)?;
        writeln!(f, "peak scanner particles:  {}", self.peak_scanner_particles)?;
        writeln!(f, "final scanner particles: {}", self.final_scanner_particles)?;
        writeln!(f, "flashes triggered:       {}", self.flashes_triggered)?;
        write!(f, "cells written:           {}", self.cells_written)
    }
}

/// Animate in the current terminal until the user quits.
pub fn run_interactive(config: &Config, seed: u64) -> Result<RunSummary, RunnerError> {
    let background = config.background_color()?;
    let frame_duration = config.frame_duration();
    let (columns, rows) = terminal::size()?;
    let mut scene = Scene::new(config, columns, rows, seed);
    let mut presenter = TerminalPresenter::enter(background)?;
    let mut summary = RunSummary::default();

    tracing::info!(columns, rows, fps = config.frame_rate, "starting interactive loop");
    let mut last_frame = Instant::now();
    'frames: loop {
        let frame_start = Instant::now();
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if is_quit(&key) => break 'frames,
                Event::Resize(columns, rows) => {
                    scene.resize(columns, rows);
                    presenter.invalidate();
                }
                _ => {}
            }
        }

        let dt = last_frame.elapsed().as_secs_f32().min(MAX_FRAME_DT);
        last_frame = Instant::now();
        scene.tick(dt);
        let written = presenter.present(scene.render())?;
        summary.record(&scene, written);

        let elapsed = frame_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
    tracing::info!(frames = summary.frames, "interactive loop stopped");
    Ok(summary)
}

/// Run `frames` frames at a fixed step without touching the terminal.
pub fn run_headless(config: &Config, frames: u64, seed: u64) -> Result<RunSummary, RunnerError> {
    run_headless_with(config, frames, seed, io::sink())
}

/// Like [`run_headless`] but writing the rendered frames to `out`.
pub fn run_headless_with<W: Write>(
    config: &Config,
    frames: u64,
    seed: u64,
    out: W,
) -> Result<RunSummary, RunnerError> {
    let background = config.background_color()?;
    let dt = config.frame_duration().as_secs_f32();
    let mut scene = Scene::new(config, HEADLESS_COLUMNS, HEADLESS_ROWS, seed);
    let mut presenter = TerminalPresenter::with_writer(out, background);
    let mut summary = RunSummary::default();

    tracing::info!(frames, dt, "starting headless run");
    for _ in 0..frames {
        scene.tick(dt);
        let written = presenter.present(scene.render())?;
        summary.record(&scene, written);
    }
    tracing::info!(
        scanning_frames = summary.scanning_frames,
        peak = summary.peak_scanner_particles,
        "headless run finished"
    );
    Ok(summary)
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::LayerKind;
    use rstest::rstest;

    #[test]
    fn test_headless_summary() {
        let config = Config::default();
        let summary = run_headless(&config, 600, 7).expect("run failed");
        assert_eq!(summary.frames, 600);
        assert!(summary.scanning_frames > 0);
        assert!(summary.flashes_triggered > 0);
        assert!(summary.peak_scanner_particles >= config.scanner.idle.max_particles);
        assert!(summary.peak_scanner_particles <= config.scanner.scanning.max_particles + config.scanner.overflow);
        assert!(summary.final_scanner_particles <= summary.peak_scanner_particles);
        assert!(summary.cells_written > 0);
    }

    #[test]
    fn test_headless_is_reproducible() {
        let config = Config::default();
        let first = run_headless(&config, 120, 3).expect("run failed");
        let second = run_headless(&config, 120, 3).expect("run failed");
        assert_eq!(first, second);
    }

    #[test]
    fn test_headless_without_scanner() {
        let mut config = Config::default();
        config.set_enabled(LayerKind::Scanner, false);
        let summary = run_headless(&config, 30, 1).expect("run failed");
        assert_eq!(summary.peak_scanner_particles, 0);
        assert!(summary.scanning_frames > 0);
    }

    #[test]
    fn test_headless_writes_frames() {
        let mut out = Vec::new();
        run_headless_with(&Config::default(), 2, 1, &mut out).expect("run failed");
        assert!(!out.is_empty());
    }

    #[test]
    fn test_bad_background() {
        let config = Config { background: "nope".into(), ..Default::default() };
        assert!(matches!(run_headless(&config, 1, 1), Err(RunnerError::Config(_))));
    }

    #[rstest]
    #[case::q(KeyCode::Char('q'), KeyModifiers::NONE, true)]
    #[case::esc(KeyCode::Esc, KeyModifiers::NONE, true)]
    #[case::ctrl_c(KeyCode::Char('c'), KeyModifiers::CONTROL, true)]
    #[case::plain_c(KeyCode::Char('c'), KeyModifiers::NONE, false)]
    #[case::space(KeyCode::Char(' '), KeyModifiers::NONE, false)]
    fn test_quit_keys(#[case] code: KeyCode, #[case] modifiers: KeyModifiers, #[case] quits: bool) {
        assert_eq!(is_quit(&KeyEvent::new(code, modifiers)), quits);
    }
}
