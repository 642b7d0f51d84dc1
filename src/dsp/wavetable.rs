use rustfft::{num_complex::Complex, FftPlanner};

use crate::dsp::harmonics::{synthesize, HarmonicComponents, Waveform};

/// Samples per single-cycle table. Must stay above twice the largest partial
/// count so every harmonic fits below the table's Nyquist bin.
pub const TABLE_SIZE: usize = 4096;

/// One cycle of a waveform defined by its harmonic coefficients.
///
/// The table is the literal inverse transform of the coefficients; it is not
/// rescaled to unit peak.
#[derive(Debug, Clone)]
pub struct PeriodicWave {
    table: Vec<f32>,
}

impl PeriodicWave {
    pub fn from_components(components: &HarmonicComponents) -> Self {
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); TABLE_SIZE];
        let nyquist = TABLE_SIZE / 2;

        // x[n] = Σ a_k cos(2πkn/N) + b_k sin(2πkn/N)
        //      = Σ X[k] e^{i2πkn/N}  with X[k] = (a_k - i b_k) / 2, X[N-k] = conj
        for k in 1..components.len().min(nyquist) {
            let a = components.real[k];
            let b = components.imag[k];
            spectrum[k] = Complex::new(a * 0.5, -b * 0.5);
            spectrum[TABLE_SIZE - k] = Complex::new(a * 0.5, b * 0.5);
        }

        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(TABLE_SIZE);
        ifft.process(&mut spectrum);

        Self {
            table: spectrum.iter().map(|c| c.re).collect(),
        }
    }

    pub fn sine() -> Self {
        Self::from_components(&synthesize(Waveform::Sine, 0.0, 1))
    }

    /// Sample the cycle at `phase` in [0, 1) with linear interpolation.
    #[inline]
    pub fn sample(&self, phase: f32) -> f32 {
        let pos = phase * TABLE_SIZE as f32;
        let i = pos as usize % TABLE_SIZE;
        let frac = pos - pos.floor();
        let a = self.table[i];
        let b = self.table[(i + 1) % TABLE_SIZE];
        a + (b - a) * frac
    }

    pub fn table(&self) -> &[f32] {
        &self.table
    }

    pub fn peak(&self) -> f32 {
        self.table.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

impl Default for PeriodicWave {
    fn default() -> Self {
        Self::sine()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn sine_table_matches_sin() {
        let wave = PeriodicWave::sine();
        for n in [0usize, 100, 1024, 2048, 3000] {
            let expected = (TAU * n as f32 / TABLE_SIZE as f32).sin();
            assert!(
                (wave.table()[n] - expected).abs() < 1e-4,
                "table[{n}] = {}, expected {expected}",
                wave.table()[n]
            );
        }
    }

    #[test]
    fn phase_offset_shifts_the_cycle() {
        let shifted = PeriodicWave::from_components(&synthesize(
            Waveform::Sine,
            std::f32::consts::FRAC_PI_2,
            1,
        ));
        // sin(t + π/2) = cos(t)
        assert!((shifted.sample(0.0) - 1.0).abs() < 1e-4);
        assert!((shifted.sample(0.5) + 1.0).abs() < 1e-3);
    }

    #[test]
    fn square_is_not_normalized() {
        let wave = PeriodicWave::from_components(&synthesize(Waveform::Square, 0.0, 256));
        // Gibbs overshoot of an un-normalized square series is ~9% above 1.0
        assert!(wave.peak() > 1.05, "peak {}", wave.peak());
        assert!(wave.peak() < 1.25, "peak {}", wave.peak());
    }

    #[test]
    fn interpolation_wraps_at_cycle_end() {
        let wave = PeriodicWave::sine();
        let near_end = wave.sample(0.99999);
        assert!(near_end.abs() < 1e-3);
    }
}
