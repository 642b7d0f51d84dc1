//! Real-world scenario benchmarks.
//!
//! Whole-engine renders: every live voice, the shared bus, the analyser and
//! the master gain in one block.

mod voices;

pub use voices::bench_voices;
