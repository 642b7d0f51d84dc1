//! Low-level DSP primitives used by the graph nodes.
//!
//! These components stay focused on the signal-processing math; the graph
//! layers routing, scheduling and lifetime management on top.

/// Windowed FFT analysis over the most recent output.
pub mod analyser;
/// Fourier coefficients for the classic waveform shapes.
pub mod harmonics;
/// Table oscillator with per-sample frequency input.
pub mod oscillator;
/// Automatable values with scheduled changes.
pub mod param;
/// Single-cycle tables built from harmonic coefficients.
pub mod wavetable;

pub use harmonics::{synthesize, HarmonicComponents, Waveform};
pub use wavetable::PeriodicWave;
