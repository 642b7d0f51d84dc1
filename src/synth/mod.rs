// Purpose: Voices, the shared modulation bus and the voice pool
// This layer sits above the graph and decides which nodes exist

/// Shared constant sources feeding every voice.
pub mod bus;
pub mod message;
/// FM / AM selection and per-voice routing.
pub mod mode;
pub mod params;
/// Live voice list, note map and pressed keys.
pub mod pool;
/// Per-note modulator → carrier chain.
pub mod voice;

/// MIDI note number. 0-127 in practice, not validated.
pub type Note = i32;

pub use bus::ModulationBus;
pub use message::SynthMessage;
pub use mode::{ModRouting, SynthMode};
pub use params::{ModParam, ParamRange, SynthParams, WaveDescriptor, WaveRole};
pub use pool::VoicePool;
pub use pool::VoiceTemplate;
pub use voice::{ReleaseShape, Voice, VoiceId, VoiceWaves};
