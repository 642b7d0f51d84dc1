//! Benchmarks for table oscillator rendering.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use modsynth::dsp::{oscillator::OscillatorBlock, synthesize, PeriodicWave, Waveform};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Fixed pitch - table lookup only
        let steady = vec![440.0f32; size];
        let mut osc = OscillatorBlock::sine();
        group.bench_with_input(BenchmarkId::new("steady", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(&steady), SAMPLE_RATE);
            })
        });

        // Audio-rate FM - frequency moves every sample
        let swept: Vec<f32> = (0..size)
            .map(|i| 440.0 + 300.0 * (i as f32 * 0.05).sin())
            .collect();
        let saw = Arc::new(PeriodicWave::from_components(&synthesize(
            Waveform::Sawtooth,
            0.0,
            64,
        )));
        let mut osc = OscillatorBlock::new(saw);
        group.bench_with_input(BenchmarkId::new("fm_sawtooth", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(&swept), SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
