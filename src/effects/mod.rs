mod ascii_code;
mod card_art;
mod card_stream;
mod common;
mod particle_field;
mod pool;
mod scanner;

pub use ascii_code::AsciiBlock;
pub use card_art::{CardArt, CardArtError, load_card_art};
pub use card_stream::{CardStream, CardWrapper};
pub use common::{Effect, FrameContext, Interval, REFERENCE_FPS, ScanLine, Viewport};
pub use particle_field::{FieldParticle, ParticleField};
pub use pool::ParticlePool;
pub use scanner::{EmitterState, Scanner, ScannerParticle};

/// The layers making up the background, from back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, clap::ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum LayerKind {
    ParticleField,
    CardStream,
    Scanner,
}
