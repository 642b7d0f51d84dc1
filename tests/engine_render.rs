use approx::assert_abs_diff_eq;
use modsynth::{
    graph::ContextState,
    io::{midi_to_synth, MidiEvent},
    patch::PresetCatalog,
    synth::{voice::ReleaseShape, SynthMode},
    EngineConfig, SynthEngine,
};

const SAMPLE_RATE: f32 = 48_000.0;
const FFT_SIZE: usize = 2048;

fn engine() -> SynthEngine {
    let mut engine = SynthEngine::new(EngineConfig {
        sample_rate: SAMPLE_RATE,
        fft_size: FFT_SIZE,
        smoothing: 0.0,
        ..EngineConfig::default()
    });
    engine.init().unwrap();
    engine
}

fn render(engine: &SynthEngine, frames: usize) -> Vec<f32> {
    let mut out = vec![0.0; frames];
    engine.render(&mut out);
    out
}

fn spectrum(engine: &SynthEngine) -> Vec<f32> {
    let mut bins = vec![0.0; engine.frequency_bin_count()];
    engine.frequency_data(&mut bins).unwrap();
    bins
}

fn bin_of(hz: f32) -> usize {
    (hz * FFT_SIZE as f32 / SAMPLE_RATE).round() as usize
}

fn peak_bin(bins: &[f32]) -> usize {
    bins.iter()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, &db)| if db > best.1 { (i, db) } else { best })
        .0
}

/// Largest dB value within one bin either side of `hz`.
fn level_near(bins: &[f32], hz: f32) -> f32 {
    let center = bin_of(hz);
    bins[center - 1..=center + 1]
        .iter()
        .copied()
        .fold(f32::MIN, f32::max)
}

#[test]
fn suspended_engine_is_silent_and_frozen() {
    let engine = SynthEngine::default();
    assert_eq!(engine.state(), ContextState::Suspended);
    let out = render(&engine, 512);
    assert!(out.iter().all(|&s| s == 0.0));
    assert_eq!(engine.current_time(), 0.0);
}

#[test]
fn time_advances_once_running() {
    let engine = engine();
    render(&engine, 4_800);
    assert_abs_diff_eq!(engine.current_time(), 0.1, epsilon = 1e-9);
}

#[test]
fn unmodulated_fm_voice_is_a_pure_carrier() {
    let mut engine = engine();
    engine.set_mod_index(0.0).unwrap();
    engine.set_mod_depth(0.0).unwrap();
    engine.note_on(69).unwrap();
    render(&engine, 2 * FFT_SIZE);

    let bins = spectrum(&engine);
    let peak = peak_bin(&bins);
    assert!((bin_of(440.0) - 1..=bin_of(440.0) + 1).contains(&peak));
    assert!(level_near(&bins, 440.0) - level_near(&bins, 880.0) > 50.0);
}

#[test]
fn fm_depth_adds_sidebands() {
    let mut plain = engine();
    plain.set_mod_index(0.0).unwrap();
    plain.set_mod_depth(0.0).unwrap();
    plain.note_on(69).unwrap();
    render(&plain, 2 * FFT_SIZE);

    let mut modulated = engine();
    modulated.set_mod_index(0.0).unwrap();
    modulated.set_mod_depth(440.0).unwrap();
    modulated.note_on(69).unwrap();
    render(&modulated, 2 * FFT_SIZE);

    let before = level_near(&spectrum(&plain), 880.0);
    let after = level_near(&spectrum(&modulated), 880.0);
    assert!(after - before > 30.0, "880 Hz went from {before} to {after} dB");
}

#[test]
fn full_level_am_moves_energy_off_the_carrier() {
    let mut engine = engine();
    engine.set_mode(SynthMode::Am);
    engine.set_mod_level(1.0).unwrap();
    engine.note_on(69).unwrap();
    render(&engine, 2 * FFT_SIZE);

    // sin(a)·sin(a) has no component at a, only DC and 2a
    let bins = spectrum(&engine);
    assert!(level_near(&bins, 880.0) - level_near(&bins, 440.0) > 30.0);
}

#[test]
fn zero_level_am_leaves_the_carrier_alone() {
    let mut engine = engine();
    engine.set_mode(SynthMode::Am);
    engine.set_mod_level(0.0).unwrap();
    engine.note_on(69).unwrap();
    render(&engine, 2 * FFT_SIZE);

    let bins = spectrum(&engine);
    let peak = peak_bin(&bins);
    assert!((bin_of(440.0) - 1..=bin_of(440.0) + 1).contains(&peak));
}

#[test]
fn exponential_release_decays_to_silence() {
    let mut engine = engine();
    engine.note_on(60).unwrap();
    render(&engine, 4_800);
    engine.note_off(60).unwrap();

    render(&engine, 48_000);
    let tail = render(&engine, 1_024);
    assert!(tail.iter().all(|s| s.abs() < 1e-3));
    // Released voices stay in the pool until evicted or reset
    assert_eq!(engine.voice_count(), 1);
    assert!(engine.pressed_notes().is_empty());
}

#[test]
fn step_release_cuts_immediately() {
    let mut engine = engine();
    engine.set_release_shape(ReleaseShape::Step);
    engine.note_on(60).unwrap();
    let held = render(&engine, 1_024);
    assert!(held.iter().any(|s| s.abs() > 0.01));

    engine.note_off(60).unwrap();
    let after = render(&engine, 1_024);
    assert!(after.iter().all(|&s| s == 0.0));
}

#[test]
fn reset_silences_everything() {
    let mut engine = engine();
    for note in [60, 64, 67] {
        engine.note_on(note).unwrap();
    }
    render(&engine, 1_024);
    engine.init().unwrap();

    assert_eq!(engine.voice_count(), 0);
    assert!(engine.pressed_notes().is_empty());
    let out = render(&engine, 1_024);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn midi_bytes_play_and_release_notes() {
    let mut engine = engine();
    for bytes in [[0x90, 60, 100], [0x91, 64, 100], [0x80, 60, 0]] {
        let msg = MidiEvent::parse(&bytes).and_then(|e| midi_to_synth(e, None));
        engine.handle_message(msg.unwrap()).unwrap();
    }
    assert_eq!(engine.pressed_notes().iter().copied().collect::<Vec<_>>(), vec![64]);
    assert_eq!(engine.voice_count(), 2);
}

#[test]
fn every_bundled_preset_plays() {
    let catalog = PresetCatalog::bundled().unwrap();
    assert!(!catalog.is_empty());

    for preset in catalog.presets() {
        let mut engine = engine();
        engine.apply_preset(preset).unwrap();
        engine.note_on(57).unwrap();
        engine.note_on(64).unwrap();
        let out = render(&engine, 4_096);

        assert!(out.iter().all(|s| s.is_finite()), "{} produced NaN", preset.name);
        assert!(
            out.iter().any(|s| s.abs() > 1e-4),
            "{} is silent",
            preset.name
        );
        assert!(engine.voice_count() <= engine.params().max_voices);
    }
}

#[test]
fn byte_views_center_silence_and_peak_on_the_note() {
    let mut engine = engine();
    render(&engine, FFT_SIZE);

    // Silence sits at the middle of the byte range
    let mut bytes = vec![0u8; FFT_SIZE];
    engine.byte_time_domain_data(&mut bytes).unwrap();
    assert!(bytes.iter().all(|&b| b == 128));

    engine.note_on(69).unwrap();
    render(&engine, FFT_SIZE);
    let mut freq = vec![0u8; engine.frequency_bin_count()];
    engine.byte_frequency_data(&mut freq).unwrap();
    assert_eq!(freq[bin_of(440.0)], *freq.iter().max().unwrap());
}
