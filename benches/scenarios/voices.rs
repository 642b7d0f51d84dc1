//! Benchmarks for full polyphonic renders.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use modsynth::{
    dsp::Waveform,
    synth::{params::WaveRole, SynthMode},
    SynthEngine,
};

use crate::BLOCK_SIZES;

/// C major spread over two octaves
const CHORD: [i32; 8] = [48, 52, 55, 60, 64, 67, 72, 76];

fn engine(mode: SynthMode, voices: usize) -> SynthEngine {
    let mut engine = SynthEngine::default();
    engine.set_mode(mode);
    engine.set_max_voices(voices);
    engine.init().expect("init");
    engine
        .set_waveform(WaveRole::Carrier, Waveform::Sawtooth)
        .expect("carrier wave");
    engine.set_mod_depth(200.0).expect("depth");
    for &note in CHORD.iter().take(voices) {
        engine.note_on(note).expect("note on");
    }
    engine
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === SINGLE FM VOICE ===
        // baseline: bus + one 12-node voice + output chain
        let fm_one = engine(SynthMode::Fm, 1);
        group.bench_with_input(BenchmarkId::new("fm_1", size), &size, |b, _| {
            b.iter(|| fm_one.render(black_box(&mut buffer)))
        });

        // === FULL FM POOL ===
        let fm_full = engine(SynthMode::Fm, 8);
        group.bench_with_input(BenchmarkId::new("fm_8", size), &size, |b, _| {
            b.iter(|| fm_full.render(black_box(&mut buffer)))
        });

        // === FULL AM POOL ===
        let am_full = engine(SynthMode::Am, 8);
        group.bench_with_input(BenchmarkId::new("am_8", size), &size, |b, _| {
            b.iter(|| am_full.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
