use tracing::trace;

use crate::{
    error::Result,
    graph::{AudioGraph, Destination, NodeId, ParamKind},
    synth::params::{ModParam, SynthParams},
};

/// One started constant source per continuous modulation parameter.
///
/// Voices connect these sources into their own nodes when they are built.
/// Edges into the same parameter sum, so a single value change here moves
/// every voice that is listening, with no per-voice bookkeeping. The bus is
/// owned by the engine and outlives every voice; voices only hold its node
/// ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulationBus {
    level: NodeId,
    ratio: NodeId,
    offset: NodeId,
    index: NodeId,
    depth: NodeId,
}

impl ModulationBus {
    /// Create and start the sources, seeded from `params`.
    pub fn create(graph: &mut AudioGraph, params: &SynthParams) -> Result<Self> {
        let mut source = |param: ModParam| -> Result<NodeId> {
            let id = graph.create_constant_source(params.mod_value(param));
            graph.start(id)?;
            Ok(id)
        };
        Ok(Self {
            level: source(ModParam::Level)?,
            ratio: source(ModParam::Ratio)?,
            offset: source(ModParam::Offset)?,
            index: source(ModParam::Index)?,
            depth: source(ModParam::Depth)?,
        })
    }

    pub fn source(&self, param: ModParam) -> NodeId {
        match param {
            ModParam::Level => self.level,
            ModParam::Ratio => self.ratio,
            ModParam::Offset => self.offset,
            ModParam::Index => self.index,
            ModParam::Depth => self.depth,
        }
    }

    /// Schedule `value` on the parameter's source at `now`.
    pub fn set(&self, graph: &mut AudioGraph, param: ModParam, value: f32, now: f64) -> Result<()> {
        trace!(?param, value, "bus set");
        graph.set_value_at_time(self.source(param), ParamKind::Offset, value, now)
    }

    /// Wire the parameter's source into `to`.
    pub(crate) fn feed(&self, graph: &mut AudioGraph, param: ModParam, to: Destination) -> Result<()> {
        graph.connect(self.source(param), to)
    }

    /// Current scheduled-or-applied value of the source, without inputs.
    pub fn value(&self, graph: &AudioGraph, param: ModParam) -> Result<f32> {
        Ok(graph.param(self.source(param), ParamKind::Offset)?.value())
    }
}
