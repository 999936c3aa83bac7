use crate::effects::LayerKind;
use crate::render::{CellSize, Color};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Errors that can occur when loading the configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    Read(PathBuf, #[source] io::Error),

    #[error("invalid config file '{0}': {1}")]
    Parse(PathBuf, #[source] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The top level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Size of a terminal cell in logical pixels
    pub cell: CellSize,

    /// Position of the scan line as a fraction of the viewport width
    pub scan_line: f32,

    /// Target frames per second
    pub frame_rate: u32,

    /// Background color as `#rrggbb`
    pub background: String,

    pub card_stream: CardStreamConfig,

    pub particle_field: ParticleFieldConfig,

    pub scanner: ScannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cell: CellSize::default(),
            scan_line: 0.6,
            frame_rate: 60,
            background: "#05040d".to_string(),
            card_stream: CardStreamConfig::default(),
            particle_field: ParticleFieldConfig::default(),
            scanner: ScannerConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, the file in the user's config directory is
    /// used if present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let contents = fs::read_to_string(&path).map_err(|e| ConfigError::Read(path.clone(), e))?;
        let config = Self::from_yaml(&contents).map_err(|e| ConfigError::Parse(path.clone(), e))?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// `<config dir>/cardscan/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cardscan").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn background_color(&self) -> Result<Color, ConfigError> {
        Color::from_hex(&self.background)
            .ok_or_else(|| ConfigError::Invalid(format!("background '{}' is not a #rrggbb color", self.background)))
    }

    pub fn is_enabled(&self, layer: LayerKind) -> bool {
        match layer {
            LayerKind::ParticleField => self.particle_field.enabled,
            LayerKind::CardStream => self.card_stream.enabled,
            LayerKind::Scanner => self.scanner.enabled,
        }
    }

    pub fn set_enabled(&mut self, layer: LayerKind, enabled: bool) {
        match layer {
            LayerKind::ParticleField => self.particle_field.enabled = enabled,
            LayerKind::CardStream => self.card_stream.enabled = enabled,
            LayerKind::Scanner => self.scanner.enabled = enabled,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }

    /// Reject values the effects can't work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));
        if !(self.scan_line > 0.0 && self.scan_line < 1.0) {
            return invalid(format!("scan_line must be within (0, 1), got {}", self.scan_line));
        }
        if self.frame_rate == 0 {
            return invalid("frame_rate must be positive".into());
        }
        if self.cell.width <= 0.0 || self.cell.height <= 0.0 {
            return invalid("cell dimensions must be positive".into());
        }
        self.background_color()?;

        let cards = &self.card_stream;
        if cards.card_count == 0 {
            return invalid("card_stream.card_count must be positive".into());
        }
        if cards.card_width <= 0.0 || cards.card_height <= 0.0 || cards.card_gap < 0.0 {
            return invalid("card_stream card dimensions must be positive".into());
        }
        if cards.char_width <= 0.0 || cards.line_height <= 0.0 {
            return invalid("card_stream.char_width and line_height must be positive".into());
        }
        if !(0.0..=1.0).contains(&cards.ascii_refresh_probability) {
            return invalid("card_stream.ascii_refresh_probability must be within [0, 1]".into());
        }
        if cards.ascii_refresh_interval_ms == 0 {
            return invalid("card_stream.ascii_refresh_interval_ms must be positive".into());
        }

        if self.particle_field.band_height <= 0.0 {
            return invalid("particle_field.band_height must be positive".into());
        }

        let scanner = &self.scanner;
        if !(scanner.transition_speed > 0.0 && scanner.transition_speed <= 1.0) {
            return invalid("scanner.transition_speed must be within (0, 1]".into());
        }
        if scanner.band_height <= 0.0 || scanner.light_bar_width <= 0.0 {
            return invalid("scanner dimensions must be positive".into());
        }
        if scanner.idle.intensity <= 0.0 {
            return invalid("scanner.idle.intensity must be positive".into());
        }
        Ok(())
    }
}

/// Card stream settings. Lengths are in logical pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardStreamConfig {
    pub enabled: bool,
    pub card_count: usize,
    pub card_width: f32,
    pub card_height: f32,
    pub card_gap: f32,

    /// Scroll speed in pixels per second
    pub velocity: f32,

    /// Width of the band around the scan line that reveals cards
    pub scan_band_width: f32,

    pub flash_duration_ms: u64,
    pub ascii_refresh_interval_ms: u64,

    /// Chance for each card to get new ASCII content on every refresh
    pub ascii_refresh_probability: f32,

    /// Character cell of the ASCII face
    pub char_width: f32,
    pub line_height: f32,

    /// Card face images, used round robin
    pub images: Vec<PathBuf>,
}

impl Default for CardStreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            card_count: 30,
            card_width: 340.0,
            card_height: 210.0,
            card_gap: 40.0,
            velocity: 120.0,
            scan_band_width: 8.0,
            flash_duration_ms: 600,
            ascii_refresh_interval_ms: 200,
            ascii_refresh_probability: 0.15,
            char_width: 6.0,
            line_height: 12.0,
            images: Vec::new(),
        }
    }
}

impl CardStreamConfig {
    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }

    pub fn ascii_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.ascii_refresh_interval_ms)
    }
}

/// Ambient particle field settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticleFieldConfig {
    pub enabled: bool,
    pub count: usize,
    pub band_height: f32,

    /// How far past either edge particles travel before wrapping
    pub margin: f32,
}

impl Default for ParticleFieldConfig {
    fn default() -> Self {
        Self { enabled: true, count: 300, band_height: 250.0, margin: 100.0 }
    }
}

/// One set of scanner emission parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanTuning {
    /// Spawn probability per frame; above 1 extra spawn tiers kick in
    pub intensity: f32,
    pub max_particles: usize,
    pub fade_zone: f32,
    pub glow: f32,
}

/// Scanner emitter settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    pub enabled: bool,
    pub band_height: f32,
    pub light_bar_width: f32,

    /// Fraction of the remaining distance to the target covered per frame
    pub transition_speed: f32,

    /// Particles allowed above the current cap before trimming
    pub overflow: usize,

    /// Maximum particles trimmed per frame
    pub trim_per_frame: usize,

    /// Parameters while nothing is being scanned
    pub idle: ScanTuning,

    /// Parameters while a card is under the scan line
    pub scanning: ScanTuning,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            band_height: 300.0,
            light_bar_width: 3.0,
            transition_speed: 0.05,
            overflow: 200,
            trim_per_frame: 15,
            idle: ScanTuning { intensity: 0.8, max_particles: 600, fade_zone: 60.0, glow: 1.0 },
            scanning: ScanTuning { intensity: 1.8, max_particles: 2000, fade_zone: 35.0, glow: 3.5 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use strum::IntoEnumIterator;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().expect("defaults invalid");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("scan_line: 0.5\ncard_stream:\n  velocity: 200\n").expect("parse failed");
        assert_eq!(config.scan_line, 0.5);
        assert_eq!(config.card_stream.velocity, 200.0);
        assert_eq!(config.card_stream.card_count, 30);
        assert_eq!(config.scanner, ScannerConfig::default());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(Config::from_yaml("scanlines: 3\n").is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = config.to_yaml().expect("serialize failed");
        assert_eq!(Config::from_yaml(&yaml).expect("parse failed"), config);
    }

    #[rstest]
    #[case::scan_line_zero("scan_line: 0.0")]
    #[case::scan_line_one("scan_line: 1.0")]
    #[case::no_frames("frame_rate: 0")]
    #[case::bad_background("background: purple")]
    #[case::no_cards("card_stream:\n  card_count: 0")]
    #[case::bad_probability("card_stream:\n  ascii_refresh_probability: 1.5")]
    #[case::frozen_transition("scanner:\n  transition_speed: 0.0")]
    fn test_invalid_values(#[case] yaml: &str) {
        let config = Config::from_yaml(yaml).expect("parse failed");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toggle_layers() {
        for disabled in LayerKind::iter() {
            let mut config = Config::default();
            config.set_enabled(disabled, false);
            for layer in LayerKind::iter() {
                assert_eq!(config.is_enabled(layer), layer != disabled, "{layer} after disabling {disabled}");
            }
        }
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().expect("no temp file");
        writeln!(file, "frame_rate: 30").expect("write failed");
        let config = Config::load(Some(file.path())).expect("load failed");
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.frame_duration(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().expect("no tempdir");
        let result = Config::load(Some(&dir.path().join("nope.yaml")));
        assert!(matches!(result, Err(ConfigError::Read(_, _))));
    }

    #[test]
    fn test_broken_file() {
        let mut file = tempfile::NamedTempFile::new().expect("no temp file");
        writeln!(file, "frame_rate: [").expect("write failed");
        assert!(matches!(Config::load(Some(file.path())), Err(ConfigError::Parse(_, _))));
    }
}
