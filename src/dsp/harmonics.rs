use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/*
Harmonic Synthesis
==================

Every periodic waveform can be written as a sum of sines at integer
multiples of the fundamental (its Fourier series):

    x(t) = Σ  m_k · sin(2π k t + φ_k)        k = 1, 2, 3, ...

A periodic wave table is described by two coefficient arrays, `real` and
`imag`, holding the cosine and sine weight of each harmonic:

    x(t) = Σ  real[k] · cos(2π k t) + imag[k] · sin(2π k t)

Rotating harmonic k by an angle θ_k moves weight between the two:

    real[k] = m_k · sin(θ_k)
    imag[k] = m_k · cos(θ_k)

so with θ_k = 0 the harmonic is a pure sine. Shifting the whole wave by a
phase offset φ rotates harmonic k by φ·k.


Classic Shapes
--------------

  sine              k = 1 only               m = 1
  square            odd k                    m = 4 / (π k)
  sawtooth          all k                    m = -2 / (π k)
  reverse sawtooth  all k                    m =  2 / (π k)
  triangle          odd k                    m = (8 / π²) · (-1)^((k-1)/2) / k²

The partial count N truncates the series. Small N gives the soft, rounded
shapes you see on an oscilloscope when only a few harmonics survive; large N
approaches the ideal edges (with the Gibbs overshoot near discontinuities).

Index 0 is the DC term and is always zero. Nothing is normalized: the
coefficients are the analytic values, so a square wave built with many
partials peaks slightly above 1.0 and the legend shows the true relative
amplitudes.
*/

/// Waveform class for a harmonic oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    ReverseSawtooth,
}

impl Waveform {
    pub const ALL: [Waveform; 5] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
        Waveform::ReverseSawtooth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Square => "Square",
            Waveform::Triangle => "Triangle",
            Waveform::Sawtooth => "Sawtooth",
            Waveform::ReverseSawtooth => "Reverse Sawtooth",
        }
    }

    /// Unrotated magnitude of harmonic `k` (k >= 1).
    fn magnitude(self, k: u32) -> f32 {
        let kf = k as f32;
        let odd = k % 2 == 1;
        match self {
            Waveform::Sine => {
                if k == 1 {
                    1.0
                } else {
                    0.0
                }
            }
            Waveform::Square if odd => 4.0 / (PI * kf),
            Waveform::Sawtooth => -2.0 / (PI * kf),
            Waveform::ReverseSawtooth => 2.0 / (PI * kf),
            Waveform::Triangle if odd => {
                let sign = if (k - 1) / 2 % 2 == 0 { 1.0 } else { -1.0 };
                8.0 / (PI * PI) * sign / (kf * kf)
            }
            Waveform::Square | Waveform::Triangle => 0.0,
        }
    }
}

/// Fourier coefficient pair for one periodic waveform.
///
/// Both vectors have `partials + 1` entries; index 0 is the (always zero) DC
/// term.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicComponents {
    pub real: Vec<f32>,
    pub imag: Vec<f32>,
}

impl HarmonicComponents {
    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    /// Magnitude of harmonic `k`, used by the legend.
    pub fn magnitude(&self, k: usize) -> f32 {
        match (self.real.get(k), self.imag.get(k)) {
            (Some(re), Some(im)) => re.hypot(*im),
            _ => 0.0,
        }
    }
}

/// Compute the truncated Fourier series of `kind`, shifted by `phase` radians.
pub fn synthesize(kind: Waveform, phase: f32, partials: u32) -> HarmonicComponents {
    let len = partials as usize + 1;
    let mut real = vec![0.0; len];
    let mut imag = vec![0.0; len];

    for k in 1..=partials {
        let m = kind.magnitude(k);
        if m == 0.0 {
            continue;
        }
        let theta = phase * k as f32;
        real[k as usize] = m * theta.sin();
        imag[k as usize] = m * theta.cos();
    }

    HarmonicComponents { real, imag }
}
