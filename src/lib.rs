pub mod dsp;
pub mod engine; // Context, bus, output chain and pool behind one API
pub mod error;
pub mod graph; // Dynamic audio node graph
pub mod io;
pub mod patch; // Bundled presets
pub mod synth; // Voices, modulation bus and the voice pool

pub use engine::{EngineConfig, SynthEngine};
pub use error::{Error, Result};
pub use synth::Note;

/// Largest block the graph renders in one pass; longer requests are split.
pub const MAX_BLOCK_SIZE: usize = 2048;
