//! Adjustable parameters shown in the params panel

use std::f32::consts::TAU;

use modsynth::{
    dsp::Waveform,
    synth::params::{ModParam, ParamRange, WaveRole, MAX_VOICES_RANGE, PARTIALS_RANGE},
    Result, SynthEngine,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Volume,
    Mod(ModParam),
    Waveform(WaveRole),
    Phase(WaveRole),
    Partials(WaveRole),
    MaxVoices,
}

impl Control {
    pub const ALL: [Control; 13] = [
        Control::Volume,
        Control::Mod(ModParam::Level),
        Control::Mod(ModParam::Ratio),
        Control::Mod(ModParam::Offset),
        Control::Mod(ModParam::Index),
        Control::Mod(ModParam::Depth),
        Control::Waveform(WaveRole::Modulator),
        Control::Phase(WaveRole::Modulator),
        Control::Partials(WaveRole::Modulator),
        Control::Waveform(WaveRole::Carrier),
        Control::Phase(WaveRole::Carrier),
        Control::Partials(WaveRole::Carrier),
        Control::MaxVoices,
    ];

    pub fn label(self) -> String {
        match self {
            Control::Volume => "Volume".into(),
            Control::Mod(param) => param.name().into(),
            Control::Waveform(role) => format!("{} wave", role_prefix(role)),
            Control::Phase(role) => format!("{} phase", role_prefix(role)),
            Control::Partials(role) => format!("{} partials", role_prefix(role)),
            Control::MaxVoices => "Max voices".into(),
        }
    }

    pub fn value_text(self, engine: &SynthEngine) -> String {
        let params = engine.params();
        match self {
            Control::Volume => format!("{:.2}", params.master_volume),
            Control::Mod(ModParam::Offset) => format!("{:+.0} Hz", params.mod_offset),
            Control::Mod(ModParam::Depth) => format!("{:.0} Hz", params.mod_depth),
            Control::Mod(param) => format!("{:.2}", params.mod_value(param)),
            Control::Waveform(role) => params.wave(role).kind.name().into(),
            Control::Phase(role) => format!("{:.2} rad", params.wave(role).phase),
            Control::Partials(role) => params.wave(role).partials.to_string(),
            Control::MaxVoices => params.max_voices.to_string(),
        }
    }

    /// Index and depth do nothing in AM.
    pub fn fm_only(self) -> bool {
        matches!(
            self,
            Control::Mod(ModParam::Index) | Control::Mod(ModParam::Depth)
        )
    }

    /// Nudge the value by `steps` increments, clamped to its range.
    pub fn adjust(self, engine: &mut SynthEngine, steps: i32) -> Result<()> {
        let params = engine.params().clone();
        match self {
            Control::Volume => {
                let v = nudge(params.master_volume, 0.01, steps, ParamRange::VOLUME);
                engine.set_master_volume(v)
            }
            Control::Mod(param) => {
                let v = nudge(params.mod_value(param), mod_step(param), steps, param.range());
                engine.set_mod_param(param, v)
            }
            Control::Waveform(role) => {
                let current = params.wave(role).kind;
                let index = Waveform::ALL
                    .iter()
                    .position(|&w| w == current)
                    .unwrap_or_default() as i32;
                let len = Waveform::ALL.len() as i32;
                let next = Waveform::ALL[(index + steps).rem_euclid(len) as usize];
                engine.set_waveform(role, next)
            }
            Control::Phase(role) => {
                let phase = nudge(
                    params.wave(role).phase,
                    TAU / 64.0,
                    steps,
                    ParamRange::WAVE_PHASE,
                );
                engine.set_wave_phase(role, phase)
            }
            Control::Partials(role) => {
                let n = params.wave(role).partials as i64 + steps as i64;
                let n = n.clamp(
                    *PARTIALS_RANGE.start() as i64,
                    *PARTIALS_RANGE.end() as i64,
                ) as u32;
                engine.set_wave_partials(role, n)
            }
            Control::MaxVoices => {
                let n = params.max_voices as i64 + steps as i64;
                let n = n.clamp(
                    *MAX_VOICES_RANGE.start() as i64,
                    *MAX_VOICES_RANGE.end() as i64,
                ) as usize;
                if n != params.max_voices {
                    engine.set_max_voices(n);
                }
                Ok(())
            }
        }
    }
}

fn role_prefix(role: WaveRole) -> &'static str {
    match role {
        WaveRole::Modulator => "Mod",
        WaveRole::Carrier => "Car",
    }
}

fn mod_step(param: ModParam) -> f32 {
    match param {
        ModParam::Level => 0.01,
        ModParam::Ratio => 0.25,
        ModParam::Offset => 1.0,
        ModParam::Index => 0.25,
        ModParam::Depth => 5.0,
    }
}

fn nudge(value: f32, step: f32, steps: i32, range: ParamRange) -> f32 {
    range.clamp(value + step * steps as f32)
}
