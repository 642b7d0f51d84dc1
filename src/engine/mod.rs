//! Engine lifecycle: the audio context, the shared bus, the output chain,
//! the voice pool and the waveform cache, behind one control-thread API.

use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    dsp::{
        analyser::{DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING, MIN_FFT_SIZE},
        harmonics::{synthesize, HarmonicComponents, Waveform},
        wavetable::PeriodicWave,
    },
    error::{Error, Result},
    graph::{AudioContext, AudioGraph, ContextState, Destination, NodeId, ParamKind},
    io::converter::midi_to_hz,
    patch::Preset,
    synth::{
        bus::ModulationBus,
        message::SynthMessage,
        mode::SynthMode,
        params::{clamp_max_voices, ModParam, SynthParams, WaveDescriptor, WaveRole},
        pool::{VoicePool, VoiceTemplate},
        voice::{ReleaseShape, Voice, VoiceWaves},
        Note,
    },
};

/// Startup settings for [`SynthEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Analyser window, a power of two.
    pub fft_size: usize,
    /// Analyser spectrum smoothing in [0, 1).
    pub smoothing: f32,
    pub release: ReleaseShape,
    pub params: SynthParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: DEFAULT_SMOOTHING,
            release: ReleaseShape::default(),
            params: SynthParams::default(),
        }
    }
}

/// voice sum → analyser → master → device
#[derive(Debug, Clone, Copy)]
struct OutputChain {
    voice_sum: NodeId,
    analyser: NodeId,
    master: NodeId,
}

impl OutputChain {
    fn create(graph: &mut AudioGraph, fft_size: usize, smoothing: f32) -> Self {
        Self {
            voice_sum: graph.create_gain(1.0),
            analyser: graph.create_analyser(fft_size, smoothing),
            master: graph.create_gain(0.0),
        }
    }

    /// Drop and remake the chain's own edges. Voice edges into
    /// `voice_sum` are left alone.
    fn rewire(&self, graph: &mut AudioGraph) -> Result<()> {
        graph.disconnect(self.voice_sum)?;
        graph.connect(self.voice_sum, Destination::Node(self.analyser))?;
        graph.disconnect(self.analyser)?;
        graph.connect(self.analyser, Destination::Node(self.master))?;
        graph.disconnect(self.master)?;
        graph.connect(self.master, Destination::Output)?;
        Ok(())
    }
}

/// Harmonic coefficients and playable wave for one oscillator role.
#[derive(Debug, Clone)]
struct CachedWave {
    components: HarmonicComponents,
    wave: Arc<PeriodicWave>,
}

impl CachedWave {
    fn build(desc: &WaveDescriptor) -> Self {
        let components = synthesize(desc.kind, desc.phase, desc.partials);
        let wave = Arc::new(PeriodicWave::from_components(&components));
        Self { components, wave }
    }
}

/// The synthesizer.
///
/// All methods run on the control thread. The audio callback only needs a
/// clone of [`SynthEngine::context`] and calls `render` on it.
pub struct SynthEngine {
    ctx: AudioContext,
    fft_size: usize,
    smoothing: f32,
    params: SynthParams,
    pool: VoicePool,
    bus: Option<ModulationBus>,
    output: Option<OutputChain>,
    modulator: CachedWave,
    carrier: CachedWave,
    last_note_hz: Option<f32>,
}

impl SynthEngine {
    /// A new engine is suspended and has no nodes until [`SynthEngine::init`].
    pub fn new(config: EngineConfig) -> Self {
        let mut params = config.params;
        params.max_voices = clamp_max_voices(params.max_voices);
        Self {
            ctx: AudioContext::new(config.sample_rate),
            fft_size: config.fft_size.max(MIN_FFT_SIZE),
            smoothing: config.smoothing,
            pool: VoicePool::new(params.max_voices, config.release),
            bus: None,
            output: None,
            modulator: CachedWave::build(&params.modulator),
            carrier: CachedWave::build(&params.carrier),
            last_note_hz: None,
            params,
        }
    }

    // --- lifecycle --------------------------------------------------------

    /// Bring the engine up, or reset it.
    ///
    /// The bus sources and output nodes are created on the first call and
    /// reused after that. Every call resumes the context, kills every voice,
    /// rewires the output chain and re-applies the master volume.
    pub fn init(&mut self) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();
        let first = self.bus.is_none();

        let bus = match self.bus {
            Some(bus) => bus,
            None => ModulationBus::create(&mut graph, &self.params)?,
        };
        let output = match self.output {
            Some(output) => output,
            None => OutputChain::create(&mut graph, self.fft_size, self.smoothing),
        };
        self.bus = Some(bus);
        self.output = Some(output);

        graph.resume();
        self.pool.kill_all(&mut graph);
        output.rewire(&mut graph)?;
        let now = graph.current_time();
        graph.set_value_at_time(output.master, ParamKind::Gain, self.params.master_volume, now)?;

        info!(
            first,
            sample_rate = graph.sample_rate(),
            max_voices = self.pool.max_voices(),
            "synth engine initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.bus.is_some()
    }

    /// Shared graph handle, for the audio callback.
    pub fn context(&self) -> &AudioContext {
        &self.ctx
    }

    pub fn state(&self) -> ContextState {
        self.ctx.state()
    }

    pub fn resume(&self) {
        self.ctx.resume();
    }

    pub fn suspend(&self) {
        self.ctx.suspend();
    }

    pub fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    pub fn sample_rate(&self) -> f32 {
        self.ctx.sample_rate()
    }

    /// Render mono output directly, for offline use and tests.
    pub fn render(&self, out: &mut [f32]) {
        self.ctx.render(out);
    }

    // --- notes ------------------------------------------------------------

    pub fn note_on(&mut self, note: Note) -> Result<()> {
        let (Some(bus), Some(output)) = (self.bus, self.output) else {
            return Err(Error::NotInitialized);
        };
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();
        let now = graph.current_time();
        let waves = VoiceWaves {
            modulator: self.modulator.wave.clone(),
            carrier: self.carrier.wave.clone(),
        };
        let template = VoiceTemplate {
            mode: self.params.mode,
            bus: &bus,
            waves: &waves,
            output: output.voice_sum,
        };
        self.pool.note_on(&mut graph, note, template, now)?;
        self.last_note_hz = Some(midi_to_hz(note));
        Ok(())
    }

    /// Release `note`. Unknown notes, and any note before `init`, are ignored.
    pub fn note_off(&mut self, note: Note) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();
        let now = graph.current_time();
        self.pool.note_off(&mut graph, note, now)
    }

    /// Release every pressed note.
    pub fn all_notes_off(&mut self) -> Result<()> {
        let notes: Vec<Note> = self.pool.pressed_notes().iter().copied().collect();
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();
        let now = graph.current_time();
        for note in notes {
            self.pool.note_off(&mut graph, note, now)?;
        }
        Ok(())
    }

    pub fn handle_message(&mut self, msg: SynthMessage) -> Result<()> {
        trace!(?msg, "message");
        match msg {
            SynthMessage::NoteOn { note } => self.note_on(note),
            SynthMessage::NoteOff { note } => self.note_off(note),
            SynthMessage::AllNotesOff => self.all_notes_off(),
        }
    }

    // --- parameters -------------------------------------------------------

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn set_master_volume(&mut self, volume: f32) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();
        self.write_master_volume(&mut graph, volume)
    }

    /// Takes effect for voices built from now on.
    pub fn set_mode(&mut self, mode: SynthMode) {
        debug!(mode = mode.name(), "mode set");
        self.params.mode = mode;
    }

    /// Record `value` and push it onto the shared bus, moving every live
    /// voice at once. Before `init` the value only seeds the bus.
    pub fn set_mod_param(&mut self, param: ModParam, value: f32) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();
        self.write_mod_param(&mut graph, param, value)
    }

    pub fn set_mod_level(&mut self, value: f32) -> Result<()> {
        self.set_mod_param(ModParam::Level, value)
    }

    pub fn set_mod_ratio(&mut self, value: f32) -> Result<()> {
        self.set_mod_param(ModParam::Ratio, value)
    }

    pub fn set_mod_offset(&mut self, value: f32) -> Result<()> {
        self.set_mod_param(ModParam::Offset, value)
    }

    pub fn set_mod_index(&mut self, value: f32) -> Result<()> {
        self.set_mod_param(ModParam::Index, value)
    }

    pub fn set_mod_depth(&mut self, value: f32) -> Result<()> {
        self.set_mod_param(ModParam::Depth, value)
    }

    /// Replace the descriptor for `role`. An unchanged descriptor is a no-op;
    /// otherwise the wave is rebuilt and pushed to every live oscillator of
    /// that role.
    pub fn set_wave(&mut self, role: WaveRole, desc: WaveDescriptor) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();
        self.write_wave(&mut graph, role, desc)
    }

    pub fn set_waveform(&mut self, role: WaveRole, kind: Waveform) -> Result<()> {
        let desc = WaveDescriptor {
            kind,
            ..*self.params.wave(role)
        };
        self.set_wave(role, desc)
    }

    pub fn set_wave_phase(&mut self, role: WaveRole, phase: f32) -> Result<()> {
        let desc = WaveDescriptor {
            phase,
            ..*self.params.wave(role)
        };
        self.set_wave(role, desc)
    }

    pub fn set_wave_partials(&mut self, role: WaveRole, partials: u32) -> Result<()> {
        let desc = WaveDescriptor {
            partials,
            ..*self.params.wave(role)
        };
        self.set_wave(role, desc)
    }

    /// Clamp to [1, 8] and hard-reset the pool, even for the current value.
    pub fn set_max_voices(&mut self, n: usize) {
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();
        self.pool.set_max_voices(&mut graph, n);
        self.params.max_voices = self.pool.max_voices();
    }

    pub fn set_release_shape(&mut self, shape: ReleaseShape) {
        self.pool.set_release_shape(shape);
    }

    /// Apply every field of `preset` under a single graph lock. The voice
    /// pool is only reset when the preset names a voice count.
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<()> {
        let target = preset.state.params(&self.params);
        let ctx = self.ctx.clone();
        let mut graph = ctx.lock();

        self.write_master_volume(&mut graph, target.master_volume)?;
        self.params.mode = target.mode;
        for param in ModParam::ALL {
            self.write_mod_param(&mut graph, param, target.mod_value(param))?;
        }
        self.write_wave(&mut graph, WaveRole::Modulator, target.modulator)?;
        self.write_wave(&mut graph, WaveRole::Carrier, target.carrier)?;
        if let Some(n) = preset.state.max_voices {
            self.pool.set_max_voices(&mut graph, n);
            self.params.max_voices = self.pool.max_voices();
        }

        info!(preset = %preset.name, mode = target.mode.name(), "preset applied");
        Ok(())
    }

    fn write_master_volume(&mut self, graph: &mut AudioGraph, volume: f32) -> Result<()> {
        self.params.master_volume = volume;
        if let Some(output) = self.output {
            let now = graph.current_time();
            graph.set_value_at_time(output.master, ParamKind::Gain, volume, now)?;
        }
        Ok(())
    }

    fn write_mod_param(&mut self, graph: &mut AudioGraph, param: ModParam, value: f32) -> Result<()> {
        self.params.set_mod_value(param, value);
        if let Some(bus) = self.bus {
            let now = graph.current_time();
            bus.set(graph, param, value, now)?;
        }
        Ok(())
    }

    fn write_wave(&mut self, graph: &mut AudioGraph, role: WaveRole, desc: WaveDescriptor) -> Result<()> {
        if *self.params.wave(role) == desc {
            return Ok(());
        }
        *self.params.wave_mut(role) = desc;
        let cached = CachedWave::build(&desc);
        for voice in self.pool.voices() {
            voice.set_wave(graph, role, cached.wave.clone())?;
        }
        debug!(
            ?role,
            kind = desc.kind.name(),
            partials = desc.partials,
            voices = self.pool.len(),
            "wave rebuilt"
        );
        match role {
            WaveRole::Modulator => self.modulator = cached,
            WaveRole::Carrier => self.carrier = cached,
        }
        Ok(())
    }

    // --- observables ------------------------------------------------------

    pub fn pressed_notes(&self) -> &BTreeSet<Note> {
        self.pool.pressed_notes()
    }

    /// Frequency of the most recent note-on.
    pub fn last_note_hz(&self) -> Option<f32> {
        self.last_note_hz
    }

    pub fn components(&self, role: WaveRole) -> &HarmonicComponents {
        match role {
            WaveRole::Modulator => &self.modulator.components,
            WaveRole::Carrier => &self.carrier.components,
        }
    }

    pub fn mod_components(&self) -> &HarmonicComponents {
        self.components(WaveRole::Modulator)
    }

    pub fn car_components(&self) -> &HarmonicComponents {
        self.components(WaveRole::Carrier)
    }

    pub fn voice_count(&self) -> usize {
        self.pool.len()
    }

    /// Live voices, oldest first, released ones included.
    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.pool.voices()
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Latest output samples, oldest first.
    pub fn time_domain_data(&self, out: &mut [f32]) -> Result<()> {
        let analyser = self.analyser_id()?;
        self.ctx.lock().analyser(analyser)?.time_domain(out);
        Ok(())
    }

    pub fn byte_time_domain_data(&self, out: &mut [u8]) -> Result<()> {
        let analyser = self.analyser_id()?;
        self.ctx.lock().analyser(analyser)?.byte_time_domain(out);
        Ok(())
    }

    /// Smoothed magnitude spectrum in dB, one value per bin.
    pub fn frequency_data(&self, out: &mut [f32]) -> Result<()> {
        let analyser = self.analyser_id()?;
        self.ctx.lock().analyser_mut(analyser)?.frequency_db(out);
        Ok(())
    }

    pub fn byte_frequency_data(&self, out: &mut [u8]) -> Result<()> {
        let analyser = self.analyser_id()?;
        self.ctx.lock().analyser_mut(analyser)?.byte_frequency(out);
        Ok(())
    }

    fn analyser_id(&self) -> Result<NodeId> {
        self.output
            .map(|o| o.analyser)
            .ok_or(Error::NotInitialized)
    }
}

impl Default for SynthEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
