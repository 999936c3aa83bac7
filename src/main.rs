use anyhow::Context;
use cardscan::{
    config::Config,
    effects::LayerKind,
    logging::{self, LogTarget},
    runner,
};
use clap::Parser;
use std::path::PathBuf;

/// Run an animated card scanner in the terminal.
#[derive(Parser)]
#[command(author, version, about = "An animated card scanner for your terminal", long_about = None)]
struct Cli {
    /// The path to the configuration file.
    #[clap(short, long, env = "CARDSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for every random choice, for reproducible runs.
    #[clap(long)]
    seed: Option<u64>,

    /// Target frames per second.
    #[clap(long)]
    fps: Option<u32>,

    /// Position of the scan line as a fraction of the terminal width.
    #[clap(long)]
    scan_line: Option<f32>,

    /// An image to use as a card face. Can be repeated; replaces the configured images.
    #[clap(long = "card-image")]
    card_images: Vec<PathBuf>,

    /// Disable a layer. Can be repeated.
    #[clap(long, value_enum)]
    disable: Vec<LayerKind>,

    /// Simulate without a terminal and print a summary.
    #[clap(long)]
    headless: bool,

    /// How many frames to simulate in headless mode.
    #[clap(long, default_value_t = 600, requires = "headless")]
    frames: u64,

    /// Write logs to this file.
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// Print the effective configuration and exit.
    #[clap(long)]
    print_config: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(fps) = self.fps {
            config.frame_rate = fps;
        }
        if let Some(scan_line) = self.scan_line {
            config.scan_line = scan_line;
        }
        if !self.card_images.is_empty() {
            config.card_stream.images = self.card_images.clone();
        }
        for layer in &self.disable {
            config.set_enabled(*layer, false);
        }
    }

    fn log_target(&self) -> LogTarget {
        match (&self.log_file, self.headless) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, true) => LogTarget::Stderr,
            (None, false) => LogTarget::Disabled,
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    logging::init(&cli.log_target()).context("setting up logging")?;

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("validating configuration")?;

    if cli.print_config {
        print!("{}", config.to_yaml().context("serializing configuration")?);
        return Ok(());
    }

    let seed = cli.seed.unwrap_or_else(|| fastrand::u64(..));
    tracing::info!(seed, "starting cardscan");
    if cli.headless {
        let summary = runner::run_headless(&config, cli.frames, seed).context("running headless")?;
        println!("{summary}");
    } else {
        let summary = runner::run_interactive(&config, seed).context("running animation")?;
        tracing::info!(frames = summary.frames, flashes = summary.flashes_triggered, "done");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
