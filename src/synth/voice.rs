use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    dsp::wavetable::PeriodicWave,
    error::Result,
    graph::{AudioGraph, Destination, NodeId, ParamKind},
    io::converter::midi_to_hz,
    synth::{
        bus::ModulationBus,
        mode::{ModRouting, SynthMode},
        params::{ModParam, WaveRole},
        Note,
    },
};

/*
Voice Graph
===========

Every note-on builds a fresh chain. Boxes are graph nodes, `=>` marks an
edge into a parameter rather than an audio input.

    note_freq ──> ratio ──> offset_sum ──=> mod_osc.frequency
    bus.ratio ==> ratio.gain   ^
    bus.offset ────────────────┘

    mod_osc ──> mod_depth ──> mod_env ──> mod_level ──> mod_out
                               bus.level ==> mod_level.gain

    car_osc ──> car_depth ──> car_env ──> output

So the modulator runs at `note_hz · ratio + offset`, and any change on the
ratio or offset bus re-targets every live voice at once.

FM adds an index stage scaling that same frequency by the index bus:

    offset_sum ──> index_stage ──=> mod_depth.gain <=── bus.depth
    bus.index  ==> index_stage.gain
    mod_out ==> car_osc.frequency

giving a peak deviation of `index · f_mod + depth` Hz on the carrier.

AM leaves the depth stage at unity and sums a -1 source before the level
stage, so the carrier gain becomes `1 + level · (m - 1)`:

    dc(-1) ──> mod_level
    mod_out ==> car_depth.gain   (intrinsic 1)

At level 0 the carrier is untouched; at level 1 a full-scale modulator
swings the gain across [-1, 1].
*/

/// Unique per voice, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoiceId(pub u64);

/// How a released voice falls silent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseShape {
    /// Hard step to zero. Correct, but clicks.
    Step,
    /// Exponential approach to zero, `time_constant` in seconds.
    Exponential { time_constant: f64 },
}

impl Default for ReleaseShape {
    fn default() -> Self {
        ReleaseShape::Exponential { time_constant: 0.1 }
    }
}

/// The periodic waves new oscillators start with.
#[derive(Debug, Clone)]
pub struct VoiceWaves {
    pub modulator: Arc<PeriodicWave>,
    pub carrier: Arc<PeriodicWave>,
}

impl VoiceWaves {
    pub fn get(&self, role: WaveRole) -> &Arc<PeriodicWave> {
        match role {
            WaveRole::Modulator => &self.modulator,
            WaveRole::Carrier => &self.carrier,
        }
    }
}

impl Default for VoiceWaves {
    fn default() -> Self {
        let sine = Arc::new(PeriodicWave::sine());
        Self {
            modulator: sine.clone(),
            carrier: sine,
        }
    }
}

/// Node ids of the stages every voice has, whatever its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceNodes {
    pub note_freq: NodeId,
    pub ratio: NodeId,
    pub offset_sum: NodeId,
    pub mod_osc: NodeId,
    pub mod_depth: NodeId,
    pub mod_env: NodeId,
    pub mod_level: NodeId,
    pub mod_out: NodeId,
    pub car_osc: NodeId,
    pub car_depth: NodeId,
    pub car_env: NodeId,
}

impl VoiceNodes {
    fn all(&self) -> [NodeId; 11] {
        [
            self.note_freq,
            self.ratio,
            self.offset_sum,
            self.mod_osc,
            self.mod_depth,
            self.mod_env,
            self.mod_level,
            self.mod_out,
            self.car_osc,
            self.car_depth,
            self.car_env,
        ]
    }
}

/// One sounding modulator → carrier chain for a single note-on.
#[derive(Debug)]
pub struct Voice {
    id: VoiceId,
    note: Note,
    nodes: VoiceNodes,
    routing: ModRouting,
    killed: bool,
}

/// Build the chain for `note` and connect its output to `output`.
///
/// Sources are started but both envelopes sit at zero until
/// [`Voice::trigger`]. Notes are not range-checked; an absurd note just
/// yields an absurd frequency.
pub fn build(
    graph: &mut AudioGraph,
    id: VoiceId,
    note: Note,
    mode: SynthMode,
    bus: &ModulationBus,
    waves: &VoiceWaves,
    output: NodeId,
) -> Result<Voice> {
    let note_hz = midi_to_hz(note);

    let nodes = VoiceNodes {
        note_freq: graph.create_constant_source(note_hz),
        ratio: graph.create_gain(0.0),
        offset_sum: graph.create_gain(1.0),
        mod_osc: graph.create_oscillator(waves.modulator.clone()),
        mod_depth: graph.create_gain(match mode {
            SynthMode::Fm => 0.0,
            SynthMode::Am => 1.0,
        }),
        mod_env: graph.create_gain(0.0),
        mod_level: graph.create_gain(0.0),
        mod_out: graph.create_gain(1.0),
        car_osc: graph.create_oscillator(waves.carrier.clone()),
        car_depth: graph.create_gain(1.0),
        car_env: graph.create_gain(0.0),
    };
    let n = &nodes;

    // modulator frequency: note_hz * ratio + offset
    graph.set_value_at_time(n.mod_osc, ParamKind::Frequency, 0.0, 0.0)?;
    graph.connect(n.note_freq, Destination::Node(n.ratio))?;
    bus.feed(graph, ModParam::Ratio, Destination::Param(n.ratio, ParamKind::Gain))?;
    graph.connect(n.ratio, Destination::Node(n.offset_sum))?;
    bus.feed(graph, ModParam::Offset, Destination::Node(n.offset_sum))?;
    graph.connect(n.offset_sum, Destination::Param(n.mod_osc, ParamKind::Frequency))?;

    graph.connect(n.mod_osc, Destination::Node(n.mod_depth))?;
    graph.connect(n.mod_depth, Destination::Node(n.mod_env))?;
    graph.connect(n.mod_env, Destination::Node(n.mod_level))?;
    bus.feed(graph, ModParam::Level, Destination::Param(n.mod_level, ParamKind::Gain))?;
    graph.connect(n.mod_level, Destination::Node(n.mod_out))?;

    graph.connect(n.car_osc, Destination::Node(n.car_depth))?;
    graph.connect(n.car_depth, Destination::Node(n.car_env))?;
    graph.connect(n.car_env, Destination::Node(output))?;

    let routing = match mode {
        SynthMode::Fm => {
            let index_stage = graph.create_gain(0.0);
            graph.connect(n.offset_sum, Destination::Node(index_stage))?;
            bus.feed(graph, ModParam::Index, Destination::Param(index_stage, ParamKind::Gain))?;
            graph.connect(index_stage, Destination::Param(n.mod_depth, ParamKind::Gain))?;
            bus.feed(graph, ModParam::Depth, Destination::Param(n.mod_depth, ParamKind::Gain))?;
            graph.connect(n.mod_out, Destination::Param(n.car_osc, ParamKind::Frequency))?;
            ModRouting::Frequency { index_stage }
        }
        SynthMode::Am => {
            let dc_offset = graph.create_constant_source(-1.0);
            graph.connect(dc_offset, Destination::Node(n.mod_level))?;
            graph.connect(n.mod_out, Destination::Param(n.car_depth, ParamKind::Gain))?;
            graph.start(dc_offset)?;
            ModRouting::Amplitude { dc_offset }
        }
    };

    graph.start(n.note_freq)?;
    graph.start(n.mod_osc)?;
    graph.start(n.car_osc)?;

    debug!(?id, note, mode = mode.name(), "voice built");
    Ok(Voice {
        id,
        note,
        nodes,
        routing,
        killed: false,
    })
}

impl Voice {
    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn note(&self) -> Note {
        self.note
    }

    /// Mode the voice was built with. Never changes.
    pub fn mode(&self) -> SynthMode {
        self.routing.mode()
    }

    pub fn routing(&self) -> ModRouting {
        self.routing
    }

    pub fn nodes(&self) -> &VoiceNodes {
        &self.nodes
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn oscillator(&self, role: WaveRole) -> NodeId {
        match role {
            WaveRole::Modulator => self.nodes.mod_osc,
            WaveRole::Carrier => self.nodes.car_osc,
        }
    }

    /// Note-on: carrier to the note frequency, both envelopes hard to 1.
    pub fn trigger(&self, graph: &mut AudioGraph, now: f64) -> Result<()> {
        let n = &self.nodes;
        graph.set_value_at_time(n.car_osc, ParamKind::Frequency, midi_to_hz(self.note), now)?;
        graph.set_value_at_time(n.mod_env, ParamKind::Gain, 1.0, now)?;
        graph.set_value_at_time(n.car_env, ParamKind::Gain, 1.0, now)?;
        Ok(())
    }

    /// Note-off: bring the carrier envelope to zero. The nodes stay alive.
    pub fn release(&self, graph: &mut AudioGraph, shape: ReleaseShape, now: f64) -> Result<()> {
        let env = graph.param_mut(self.nodes.car_env, ParamKind::Gain)?;
        env.cancel_scheduled_values(now);
        match shape {
            ReleaseShape::Step => env.set_value_at_time(0.0, now),
            ReleaseShape::Exponential { time_constant } => {
                env.set_target_at_time(0.0, now, time_constant)
            }
        }
        Ok(())
    }

    /// Swap the periodic wave of one oscillator in place.
    pub fn set_wave(&self, graph: &mut AudioGraph, role: WaveRole, wave: Arc<PeriodicWave>) -> Result<()> {
        graph.set_periodic_wave(self.oscillator(role), wave)
    }

    /// Stop every source and remove every node this voice owns.
    ///
    /// Removing a node drops all of its edges, including the ones into the
    /// shared bus sources; the bus itself is left alone. A second call does
    /// nothing.
    pub fn kill(&mut self, graph: &mut AudioGraph) {
        if self.killed {
            return;
        }
        self.killed = true;

        let owned = self.nodes.all().into_iter().chain([self.routing.node()]);
        for node in owned {
            if let Err(err) = graph.stop(node).and_then(|()| graph.remove_node(node)) {
                warn!(id = ?self.id, ?node, %err, "voice node already gone");
            }
        }
        debug!(id = ?self.id, note = self.note, "voice killed");
    }
}
