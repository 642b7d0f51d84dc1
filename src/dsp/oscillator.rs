use std::sync::Arc;

use crate::dsp::wavetable::PeriodicWave;

/// Table oscillator driven by a per-sample frequency signal.
///
/// Frequency arrives as a buffer rather than a scalar so that audio-rate
/// frequency modulation lands on every sample.
pub struct OscillatorBlock {
    wave: Arc<PeriodicWave>,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(wave: Arc<PeriodicWave>) -> Self {
        Self { wave, phase: 0.0 }
    }

    pub fn sine() -> Self {
        Self::new(Arc::new(PeriodicWave::sine()))
    }

    /// Swap the waveform without resetting phase (no discontinuity in time).
    pub fn set_wave(&mut self, wave: Arc<PeriodicWave>) {
        self.wave = wave;
    }

    pub fn wave(&self) -> &Arc<PeriodicWave> {
        &self.wave
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn render(&mut self, out: &mut [f32], frequency: &[f32], sample_rate: f32) {
        let inv_sr = 1.0 / sample_rate;
        for (o, &f) in out.iter_mut().zip(frequency) {
            *o = self.wave.sample(self.phase);
            // Negative frequencies run the cycle backwards.
            self.phase = (self.phase + f * inv_sr).rem_euclid(1.0);
            if !self.phase.is_finite() || self.phase >= 1.0 {
                self.phase = 0.0;
            }
        }
    }
}
