//! Benchmarks for building waves from harmonic descriptors.
//!
//! Runs on the control thread whenever a waveform, phase or partial count
//! changes, so it only needs to stay well under a UI frame.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use modsynth::dsp::{synthesize, PeriodicWave, Waveform};

pub fn bench_harmonics(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/harmonics");

    for partials in [8u32, 32, 128, 512] {
        group.bench_with_input(
            BenchmarkId::new("synthesize", partials),
            &partials,
            |b, &n| b.iter(|| synthesize(black_box(Waveform::Square), 0.7, n)),
        );

        let components = synthesize(Waveform::Square, 0.7, partials);
        group.bench_with_input(
            BenchmarkId::new("periodic_wave", partials),
            &components,
            |b, components| b.iter(|| PeriodicWave::from_components(black_box(components))),
        );
    }

    group.finish();
}
