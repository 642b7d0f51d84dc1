//! Named parameter bundles.
//!
//! The catalog is compiled into the binary and read-only at runtime. Field
//! names follow the bundled JSON (`modIdx`, `modWaveN`, ...).

use serde::{Deserialize, Serialize};

use crate::{
    dsp::harmonics::Waveform,
    error::{Error, Result},
    synth::{
        mode::SynthMode,
        params::{SynthParams, WaveDescriptor},
    },
};

const BUNDLED: &str = include_str!("../../presets/presets.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetState {
    pub volume: f32,
    pub mode: SynthMode,
    pub mod_level: f32,
    pub mod_ratio: f32,
    pub mod_offset: f32,
    pub mod_idx: f32,
    pub mod_depth: f32,
    pub mod_waveform: Waveform,
    pub mod_wave_phase: f32,
    pub mod_wave_n: u32,
    pub car_waveform: Waveform,
    pub car_wave_phase: f32,
    pub car_wave_n: u32,
    /// Absent in most presets; applying one without it keeps the pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_voices: Option<usize>,
}

impl PresetState {
    /// `base` with every field of the preset applied.
    pub fn params(&self, base: &SynthParams) -> SynthParams {
        SynthParams {
            master_volume: self.volume,
            mode: self.mode,
            mod_level: self.mod_level,
            mod_ratio: self.mod_ratio,
            mod_offset: self.mod_offset,
            mod_index: self.mod_idx,
            mod_depth: self.mod_depth,
            modulator: WaveDescriptor {
                kind: self.mod_waveform,
                phase: self.mod_wave_phase,
                partials: self.mod_wave_n,
            },
            carrier: WaveDescriptor {
                kind: self.car_waveform,
                phase: self.car_wave_phase,
                partials: self.car_wave_n,
            },
            max_voices: self.max_voices.unwrap_or(base.max_voices),
        }
    }

    /// Snapshot of `params`, voice count included.
    pub fn from_params(params: &SynthParams) -> Self {
        Self {
            volume: params.master_volume,
            mode: params.mode,
            mod_level: params.mod_level,
            mod_ratio: params.mod_ratio,
            mod_offset: params.mod_offset,
            mod_idx: params.mod_index,
            mod_depth: params.mod_depth,
            mod_waveform: params.modulator.kind,
            mod_wave_phase: params.modulator.phase,
            mod_wave_n: params.modulator.partials,
            car_waveform: params.carrier.kind,
            car_wave_phase: params.carrier.phase,
            car_wave_n: params.carrier.partials,
            max_voices: Some(params.max_voices),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub state: PresetState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl PresetCatalog {
    /// The catalog shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED)
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look a preset up by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Result<&Preset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_parses() {
        let catalog = PresetCatalog::bundled().unwrap();
        assert!(!catalog.is_empty());
        let init = catalog.get("init").unwrap();
        assert_eq!(
            init.state.params(&SynthParams::default()),
            SynthParams::default()
        );
    }

    #[test]
    fn bundled_presets_stay_in_range() {
        use crate::synth::params::{ParamRange, PARTIALS_RANGE};
        let catalog = PresetCatalog::bundled().unwrap();
        for preset in catalog.presets() {
            let s = &preset.state;
            assert!(ParamRange::VOLUME.contains(s.volume), "{}", preset.name);
            assert!(ParamRange::MOD_LEVEL.contains(s.mod_level), "{}", preset.name);
            assert!(ParamRange::MOD_RATIO.contains(s.mod_ratio), "{}", preset.name);
            assert!(ParamRange::MOD_INDEX.contains(s.mod_idx), "{}", preset.name);
            assert!(ParamRange::MOD_DEPTH.contains(s.mod_depth), "{}", preset.name);
            assert!(PARTIALS_RANGE.contains(&s.mod_wave_n), "{}", preset.name);
            assert!(PARTIALS_RANGE.contains(&s.car_wave_n), "{}", preset.name);
        }
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let catalog = PresetCatalog::bundled().unwrap();
        assert!(matches!(
            catalog.get("no such thing"),
            Err(Error::UnknownPreset(name)) if name == "no such thing"
        ));
    }

    #[test]
    fn reads_camel_case_field_names() {
        let json = r#"{"presets":[{"name":"x","state":{
            "volume":0.5,"mode":"AM","modLevel":0.3,"modRatio":2,"modOffset":-4,
            "modIdx":7,"modDepth":12,"modWaveform":"reverse-sawtooth",
            "modWavePhase":1.0,"modWaveN":8,"carWaveform":"square",
            "carWavePhase":0,"carWaveN":3}}]}"#;
        let catalog = PresetCatalog::parse(json).unwrap();
        let params = catalog.presets()[0].state.params(&SynthParams::default());
        assert_eq!(params.mode, SynthMode::Am);
        assert_eq!(params.mod_index, 7.0);
        assert_eq!(params.modulator.kind, Waveform::ReverseSawtooth);
        assert_eq!(params.carrier.partials, 3);
        assert_eq!(params.max_voices, 4);
    }

    #[test]
    fn malformed_catalog_is_reported() {
        assert!(matches!(
            PresetCatalog::parse("{\"presets\": 3}"),
            Err(Error::PresetCatalog(_))
        ));
    }

    #[test]
    fn snapshot_round_trips_through_params() {
        let mut params = SynthParams::default();
        params.mod_ratio = 3.0;
        params.max_voices = 6;
        let state = PresetState::from_params(&params);
        assert_eq!(state.params(&SynthParams::default()), params);
    }
}
