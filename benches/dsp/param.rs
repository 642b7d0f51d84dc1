//! Benchmarks for parameter automation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use modsynth::dsp::param::AudioParam;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_param(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/param");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // No events - constant fill
        let mut param = AudioParam::new(1.0);
        group.bench_with_input(BenchmarkId::new("static", size), &size, |b, _| {
            b.iter(|| {
                param.render(black_box(&mut buffer), 0.0, SAMPLE_RATE);
            })
        });

        // Exponential release - exp() per sample
        let mut param = AudioParam::new(1.0);
        param.set_target_at_time(0.0, 0.0, 0.1);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                param.render(black_box(&mut buffer), 0.0, SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
