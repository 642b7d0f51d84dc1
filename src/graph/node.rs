use std::sync::Arc;

use crate::dsp::{
    analyser::AnalyserTap, oscillator::OscillatorBlock, param::AudioParam,
    wavetable::PeriodicWave,
};

/// Generational handle to a node in an [`AudioGraph`](super::AudioGraph).
///
/// A removed node's slot may be reused, but with a new generation, so stale
/// handles are rejected instead of aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Automatable parameter on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Oscillator frequency in Hz
    Frequency,
    /// Gain multiplier
    Gain,
    /// Constant source output value
    Offset,
}

/// Where an edge lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// The node's audio input (edges sum).
    Node(NodeId),
    /// One of the node's parameters (edges sum onto the intrinsic value).
    Param(NodeId, ParamKind),
    /// The device output.
    Output,
}

impl Destination {
    pub fn node(&self) -> Option<NodeId> {
        match *self {
            Destination::Node(id) | Destination::Param(id, _) => Some(id),
            Destination::Output => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Oscillator,
    Gain,
    ConstantSource,
    Analyser,
}

/// Whether a source node is producing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Created, not started: outputs silence.
    Idle,
    Playing,
    /// Stopped for good. A stopped source cannot be restarted.
    Stopped,
}

pub(crate) enum Processor {
    Oscillator {
        osc: OscillatorBlock,
        frequency: AudioParam,
    },
    Gain {
        gain: AudioParam,
    },
    Constant {
        offset: AudioParam,
    },
    Analyser {
        tap: AnalyserTap,
    },
}

/// A node in the audio graph.
pub struct Node {
    pub(crate) processor: Processor,
    playback: Playback,
}

impl Node {
    pub(crate) fn oscillator(wave: Arc<PeriodicWave>, frequency: f32) -> Self {
        Self {
            processor: Processor::Oscillator {
                osc: OscillatorBlock::new(wave),
                frequency: AudioParam::new(frequency),
            },
            playback: Playback::Idle,
        }
    }

    pub(crate) fn gain(gain: f32) -> Self {
        Self {
            processor: Processor::Gain {
                gain: AudioParam::new(gain),
            },
            playback: Playback::Playing,
        }
    }

    pub(crate) fn constant(offset: f32) -> Self {
        Self {
            processor: Processor::Constant {
                offset: AudioParam::new(offset),
            },
            playback: Playback::Idle,
        }
    }

    pub(crate) fn analyser(tap: AnalyserTap) -> Self {
        Self {
            processor: Processor::Analyser { tap },
            playback: Playback::Playing,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.processor {
            Processor::Oscillator { .. } => NodeKind::Oscillator,
            Processor::Gain { .. } => NodeKind::Gain,
            Processor::Constant { .. } => NodeKind::ConstantSource,
            Processor::Analyser { .. } => NodeKind::Analyser,
        }
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn is_source(&self) -> bool {
        matches!(
            self.processor,
            Processor::Oscillator { .. } | Processor::Constant { .. }
        )
    }

    pub(crate) fn start(&mut self) {
        if self.playback == Playback::Idle {
            self.playback = Playback::Playing;
        }
    }

    pub(crate) fn stop(&mut self) {
        if self.is_source() {
            self.playback = Playback::Stopped;
        }
    }

    /// The node's single automatable parameter, if it has one.
    pub fn param_kind(&self) -> Option<ParamKind> {
        match self.processor {
            Processor::Oscillator { .. } => Some(ParamKind::Frequency),
            Processor::Gain { .. } => Some(ParamKind::Gain),
            Processor::Constant { .. } => Some(ParamKind::Offset),
            Processor::Analyser { .. } => None,
        }
    }

    pub fn param(&self, kind: ParamKind) -> Option<&AudioParam> {
        match (&self.processor, kind) {
            (Processor::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (Processor::Gain { gain }, ParamKind::Gain) => Some(gain),
            (Processor::Constant { offset }, ParamKind::Offset) => Some(offset),
            _ => None,
        }
    }

    pub fn param_mut(&mut self, kind: ParamKind) -> Option<&mut AudioParam> {
        match (&mut self.processor, kind) {
            (Processor::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (Processor::Gain { gain }, ParamKind::Gain) => Some(gain),
            (Processor::Constant { offset }, ParamKind::Offset) => Some(offset),
            _ => None,
        }
    }

    pub(crate) fn own_param_mut(&mut self) -> Option<&mut AudioParam> {
        match self.param_kind() {
            Some(kind) => self.param_mut(kind),
            None => None,
        }
    }

    /// Render one block. `param` holds the already-summed parameter values.
    pub(crate) fn process(&mut self, input: &[f32], param: &[f32], out: &mut [f32], sample_rate: f32) {
        let playing = self.playback == Playback::Playing;
        match &mut self.processor {
            Processor::Oscillator { osc, .. } => {
                if playing {
                    osc.render(out, param, sample_rate);
                } else {
                    out.fill(0.0);
                }
            }
            Processor::Constant { .. } => {
                if playing {
                    out.copy_from_slice(param);
                } else {
                    out.fill(0.0);
                }
            }
            Processor::Gain { .. } => {
                for ((o, i), g) in out.iter_mut().zip(input).zip(param) {
                    *o = i * g;
                }
            }
            Processor::Analyser { tap } => {
                out.copy_from_slice(input);
                tap.push(input);
            }
        }
    }
}
