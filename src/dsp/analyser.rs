use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Default analysis window length in samples.
pub const DEFAULT_FFT_SIZE: usize = 2048;
/// Default spectral smoothing between successive reads.
pub const DEFAULT_SMOOTHING: f32 = 0.8;
/// Smaller windows are rounded up to this.
pub const MIN_FFT_SIZE: usize = 32;

const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Read-only analysis tap over the most recent output samples.
///
/// Keeps a rolling window of `fft_size` samples. Time-domain reads return
/// the window oldest-first; frequency reads apply a Blackman window, run a
/// forward FFT, smooth magnitudes against the previous read and convert to
/// decibels.
pub struct AnalyserTap {
    ring: Vec<f32>,
    write_pos: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
}

impl AnalyserTap {
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        let fft_size = fft_size.max(MIN_FFT_SIZE);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let n = fft_size as f32;
        let window = (0..fft_size)
            .map(|i| {
                let x = i as f32 / n;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();

        Self {
            ring: vec![0.0; fft_size],
            write_pos: 0,
            window,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.ring.len()
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.ring.len() / 2
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 1.0);
    }

    pub fn push(&mut self, samples: &[f32]) {
        let len = self.ring.len();
        for &s in samples {
            self.ring[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % len;
        }
    }

    fn ordered(&self) -> impl Iterator<Item = f32> + '_ {
        let (newer, older) = self.ring.split_at(self.write_pos);
        older.iter().chain(newer.iter()).copied()
    }

    /// Copy the most recent samples, oldest first, into `out`.
    pub fn time_domain(&self, out: &mut [f32]) {
        let skip = self.ring.len().saturating_sub(out.len());
        for (o, s) in out.iter_mut().zip(self.ordered().skip(skip)) {
            *o = s;
        }
    }

    /// Time-domain samples mapped to bytes, 128 = silence.
    pub fn byte_time_domain(&self, out: &mut [u8]) {
        let skip = self.ring.len().saturating_sub(out.len());
        for (o, s) in out.iter_mut().zip(self.ordered().skip(skip)) {
            *o = (128.0 * (s + 1.0)).clamp(0.0, 255.0) as u8;
        }
    }

    /// Magnitude spectrum in dB, one value per bin up to `frequency_bin_count`.
    pub fn frequency_db(&mut self, out: &mut [f32]) {
        let n = self.ring.len();
        let (newer, older) = self.ring.split_at(self.write_pos);
        for ((c, &s), w) in self
            .scratch
            .iter_mut()
            .zip(older.iter().chain(newer.iter()))
            .zip(&self.window)
        {
            *c = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut self.scratch);

        let scale = 1.0 / n as f32;
        let tau = self.smoothing;
        for (i, o) in out.iter_mut().enumerate().take(self.smoothed.len()) {
            let magnitude = self.scratch[i].norm() * scale;
            let prev = self.smoothed[i];
            let value = tau * prev + (1.0 - tau) * magnitude;
            self.smoothed[i] = if value.is_finite() { value } else { 0.0 };
            *o = 20.0 * self.smoothed[i].max(1e-12).log10();
        }
    }

    /// Spectrum scaled to bytes over the [-100, -30] dB range.
    pub fn byte_frequency(&mut self, out: &mut [u8]) {
        let mut db = vec![0.0f32; out.len().min(self.frequency_bin_count())];
        self.frequency_db(&mut db);
        for (o, d) in out.iter_mut().zip(db) {
            let scaled = 255.0 * (d - MIN_DB) / (MAX_DB - MIN_DB);
            *o = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

impl Default for AnalyserTap {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING)
    }
}
