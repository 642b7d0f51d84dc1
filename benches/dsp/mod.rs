//! Benchmarks for low-level DSP primitives.

mod harmonics;
mod oscillator;
mod param;

pub use harmonics::bench_harmonics;
pub use oscillator::bench_oscillator;
pub use param::bench_param;
