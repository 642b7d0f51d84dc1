use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{dsp::harmonics::Waveform, synth::mode::SynthMode};

/// Legal range of a continuous control.
///
/// The core only clamps the voice count; everything else is published here
/// for the input layer to clamp before calling in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const VOLUME: ParamRange = ParamRange::new(0.0, 1.0);
    pub const MOD_LEVEL: ParamRange = ParamRange::new(0.0, 1.0);
    pub const MOD_RATIO: ParamRange = ParamRange::new(0.0, 64.0);
    pub const MOD_OFFSET: ParamRange = ParamRange::new(-1000.0, 1000.0);
    pub const MOD_INDEX: ParamRange = ParamRange::new(0.0, 50.0);
    pub const MOD_DEPTH: ParamRange = ParamRange::new(0.0, 1000.0);
    pub const WAVE_PHASE: ParamRange = ParamRange::new(0.0, TAU);

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub const PARTIALS_RANGE: RangeInclusive<u32> = 1..=512;
pub const MAX_VOICES_RANGE: RangeInclusive<usize> = 1..=8;

/// Clamp a requested voice count to [`MAX_VOICES_RANGE`].
pub fn clamp_max_voices(n: usize) -> usize {
    n.clamp(*MAX_VOICES_RANGE.start(), *MAX_VOICES_RANGE.end())
}

/// Continuous controls broadcast to every voice through the modulation bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModParam {
    Level,
    Ratio,
    Offset,
    /// FM only
    Index,
    /// FM only, Hz
    Depth,
}

impl ModParam {
    pub const ALL: [ModParam; 5] = [
        ModParam::Level,
        ModParam::Ratio,
        ModParam::Offset,
        ModParam::Index,
        ModParam::Depth,
    ];

    pub fn range(self) -> ParamRange {
        match self {
            ModParam::Level => ParamRange::MOD_LEVEL,
            ModParam::Ratio => ParamRange::MOD_RATIO,
            ModParam::Offset => ParamRange::MOD_OFFSET,
            ModParam::Index => ParamRange::MOD_INDEX,
            ModParam::Depth => ParamRange::MOD_DEPTH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModParam::Level => "Modulator Level",
            ModParam::Ratio => "Modulator Ratio",
            ModParam::Offset => "Modulator Offset",
            ModParam::Index => "Modulation Index",
            ModParam::Depth => "Modulation Depth",
        }
    }
}

/// Which oscillator of a voice a waveform belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveRole {
    Modulator,
    Carrier,
}

/// Shape of one oscillator role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveDescriptor {
    pub kind: Waveform,
    /// Radians, [0, 2π]
    pub phase: f32,
    /// Harmonic count, [1, 512]
    pub partials: u32,
}

impl Default for WaveDescriptor {
    fn default() -> Self {
        Self {
            kind: Waveform::Sine,
            phase: 0.0,
            partials: 32,
        }
    }
}

/// Every user-facing setting of the synth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    pub master_volume: f32,
    pub mode: SynthMode,
    pub mod_level: f32,
    pub mod_ratio: f32,
    pub mod_offset: f32,
    pub mod_index: f32,
    pub mod_depth: f32,
    pub modulator: WaveDescriptor,
    pub carrier: WaveDescriptor,
    pub max_voices: usize,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            master_volume: 0.2,
            mode: SynthMode::Fm,
            mod_level: 1.0,
            mod_ratio: 1.0,
            mod_offset: 0.0,
            mod_index: 13.0,
            mod_depth: 0.0,
            modulator: WaveDescriptor::default(),
            carrier: WaveDescriptor::default(),
            max_voices: 4,
        }
    }
}

impl SynthParams {
    pub fn mod_value(&self, param: ModParam) -> f32 {
        match param {
            ModParam::Level => self.mod_level,
            ModParam::Ratio => self.mod_ratio,
            ModParam::Offset => self.mod_offset,
            ModParam::Index => self.mod_index,
            ModParam::Depth => self.mod_depth,
        }
    }

    pub fn set_mod_value(&mut self, param: ModParam, value: f32) {
        match param {
            ModParam::Level => self.mod_level = value,
            ModParam::Ratio => self.mod_ratio = value,
            ModParam::Offset => self.mod_offset = value,
            ModParam::Index => self.mod_index = value,
            ModParam::Depth => self.mod_depth = value,
        }
    }

    pub fn wave(&self, role: WaveRole) -> &WaveDescriptor {
        match role {
            WaveRole::Modulator => &self.modulator,
            WaveRole::Carrier => &self.carrier,
        }
    }

    pub fn wave_mut(&mut self, role: WaveRole) -> &mut WaveDescriptor {
        match role {
            WaveRole::Modulator => &mut self.modulator,
            WaveRole::Carrier => &mut self.carrier,
        }
    }
}
