use std::sync::Arc;

use tracing::trace;

use crate::{
    dsp::{analyser::AnalyserTap, param::AudioParam, wavetable::PeriodicWave},
    error::{Error, Result},
    graph::node::{Destination, Node, NodeId, NodeKind, ParamKind},
    MAX_BLOCK_SIZE,
};

/*
Node Graph
==========

Nodes live in a slot arena and are addressed by generational `NodeId`s.
Edges run from a node's output to one of three places:

  Destination::Node(id)          the other node's audio input
  Destination::Param(id, kind)   one of its parameters
  Destination::Output            the device output

Everything arriving at the same place is summed. That summing is what makes
a shared control source useful: connect one constant source into the gain
parameter of many nodes and a single value change moves all of them.

Rendering
---------

Cycles are rejected at connect time, so the graph is always a DAG. Before
rendering, nodes are put in dependency order (Kahn's algorithm) and each
node's incoming edges are gathered into a plan. The plan is cached and
rebuilt only after the topology changes.

For each block, every node in order:
  1. sums its audio inputs into a scratch buffer
  2. renders its parameter's automation and adds parameter inputs
  3. processes, writing its own output buffer

Frequency modulation therefore happens at audio rate: the modulator's
output buffer is added sample by sample onto the carrier's frequency.

While the context is suspended, render produces silence and time stands
still.
*/

/// Whether the graph is producing sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Output is muted and time does not advance until resumed.
    Suspended,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    from: NodeId,
    to: Destination,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

struct Step {
    slot: usize,
    audio_in: Vec<usize>,
    param_in: Vec<usize>,
}

struct RenderPlan {
    steps: Vec<Step>,
    output_in: Vec<usize>,
}

pub struct AudioGraph {
    sample_rate: f32,
    frames: u64,
    state: ContextState,
    slots: Vec<Slot>,
    free: Vec<usize>,
    edges: Vec<Edge>,
    plan: Option<RenderPlan>,
    buffers: Vec<Vec<f32>>,
    input_buf: Vec<f32>,
    param_buf: Vec<f32>,
}

impl AudioGraph {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frames: 0,
            state: ContextState::Suspended,
            slots: Vec::new(),
            free: Vec::new(),
            edges: Vec::new(),
            plan: None,
            buffers: Vec::new(),
            input_buf: vec![0.0; MAX_BLOCK_SIZE],
            param_buf: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Seconds of audio rendered so far.
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn resume(&mut self) {
        self.state = ContextState::Running;
    }

    pub fn suspend(&mut self) {
        self.state = ContextState::Suspended;
    }

    // --- construction ---------------------------------------------------

    fn insert(&mut self, node: Node) -> NodeId {
        self.plan = None;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return NodeId {
                index: index as u32,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        self.buffers.push(vec![0.0; MAX_BLOCK_SIZE]);
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Oscillator playing `wave`, frequency param at 440 Hz. Not started.
    pub fn create_oscillator(&mut self, wave: Arc<PeriodicWave>) -> NodeId {
        self.insert(Node::oscillator(wave, 440.0))
    }

    pub fn create_gain(&mut self, gain: f32) -> NodeId {
        self.insert(Node::gain(gain))
    }

    /// Constant source emitting `offset`. Not started.
    pub fn create_constant_source(&mut self, offset: f32) -> NodeId {
        self.insert(Node::constant(offset))
    }

    pub fn create_analyser(&mut self, fft_size: usize, smoothing: f32) -> NodeId {
        self.insert(Node::analyser(AnalyserTap::new(fft_size, smoothing)))
    }

    /// Remove a node and every edge into or out of it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        let index = id.index as usize;
        let slot = &mut self.slots[index];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.edges
            .retain(|e| e.from != id && e.to.node() != Some(id));
        self.plan = None;
        Ok(())
    }

    // --- access ---------------------------------------------------------

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
            .ok_or(Error::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or(Error::NodeNotFound(id))
    }

    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn start(&mut self, id: NodeId) -> Result<()> {
        self.node_mut(id)?.start();
        Ok(())
    }

    pub fn stop(&mut self, id: NodeId) -> Result<()> {
        self.node_mut(id)?.stop();
        Ok(())
    }

    pub fn param(&self, id: NodeId, kind: ParamKind) -> Result<&AudioParam> {
        self.node(id)?
            .param(kind)
            .ok_or(Error::NoSuchParam { node: id, param: kind })
    }

    pub fn param_mut(&mut self, id: NodeId, kind: ParamKind) -> Result<&mut AudioParam> {
        self.node_mut(id)?
            .param_mut(kind)
            .ok_or(Error::NoSuchParam { node: id, param: kind })
    }

    /// Parameter value including connected inputs, as of the last rendered sample.
    pub fn param_value(&self, id: NodeId, kind: ParamKind) -> Result<f32> {
        Ok(self.param(id, kind)?.computed())
    }

    pub fn set_value_at_time(
        &mut self,
        id: NodeId,
        kind: ParamKind,
        value: f32,
        time: f64,
    ) -> Result<()> {
        self.param_mut(id, kind)?.set_value_at_time(value, time);
        Ok(())
    }

    pub fn set_periodic_wave(&mut self, id: NodeId, wave: Arc<PeriodicWave>) -> Result<()> {
        match &mut self.node_mut(id)?.processor {
            super::node::Processor::Oscillator { osc, .. } => {
                osc.set_wave(wave);
                Ok(())
            }
            _ => Err(Error::WrongNodeKind {
                node: id,
                expected: NodeKind::Oscillator,
            }),
        }
    }

    pub fn analyser(&self, id: NodeId) -> Result<&AnalyserTap> {
        match &self.node(id)?.processor {
            super::node::Processor::Analyser { tap } => Ok(tap),
            _ => Err(Error::WrongNodeKind {
                node: id,
                expected: NodeKind::Analyser,
            }),
        }
    }

    pub fn analyser_mut(&mut self, id: NodeId) -> Result<&mut AnalyserTap> {
        match &mut self.node_mut(id)?.processor {
            super::node::Processor::Analyser { tap } => Ok(tap),
            _ => Err(Error::WrongNodeKind {
                node: id,
                expected: NodeKind::Analyser,
            }),
        }
    }

    // --- topology -------------------------------------------------------

    /// Connect `from`'s output to `to`. Connecting an existing edge again is a no-op.
    pub fn connect(&mut self, from: NodeId, to: Destination) -> Result<()> {
        self.node(from)?;
        match to {
            Destination::Node(id) => {
                self.node(id)?;
            }
            Destination::Param(id, kind) => {
                self.param(id, kind)?;
            }
            Destination::Output => {}
        }

        let edge = Edge { from, to };
        if self.edges.contains(&edge) {
            return Ok(());
        }
        if let Some(target) = to.node() {
            if target == from || self.reaches(target, from) {
                return Err(Error::WouldCycle { from, to: target });
            }
        }

        trace!(?from, ?to, "connect");
        self.edges.push(edge);
        self.plan = None;
        Ok(())
    }

    /// Remove every outgoing edge of `from`.
    pub fn disconnect(&mut self, from: NodeId) -> Result<()> {
        self.node(from)?;
        self.edges.retain(|e| e.from != from);
        self.plan = None;
        Ok(())
    }

    /// Remove one edge. Returns whether it existed.
    pub fn disconnect_from(&mut self, from: NodeId, to: Destination) -> Result<bool> {
        self.node(from)?;
        let before = self.edges.len();
        self.edges.retain(|e| !(e.from == from && e.to == to));
        let removed = self.edges.len() != before;
        if removed {
            self.plan = None;
        }
        Ok(removed)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Destinations `from` currently feeds.
    pub fn outputs_of(&self, from: NodeId) -> Vec<Destination> {
        self.edges
            .iter()
            .filter(|e| e.from == from)
            .map(|e| e.to)
            .collect()
    }

    pub fn is_connected(&self, from: NodeId, to: Destination) -> bool {
        self.edges.contains(&Edge { from, to })
    }

    /// Whether `target` is reachable downstream of `start`.
    fn reaches(&self, start: NodeId, target: NodeId) -> bool {
        let mut stack = vec![start];
        let mut seen = vec![false; self.slots.len()];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            let index = id.index as usize;
            if std::mem::replace(&mut seen[index], true) {
                continue;
            }
            stack.extend(self.edges.iter().filter(|e| e.from == id).filter_map(|e| e.to.node()));
        }
        false
    }

    fn build_plan(&self) -> RenderPlan {
        let n = self.slots.len();
        let mut indegree = vec![0usize; n];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut audio_in: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut param_in: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut output_in = Vec::new();

        for edge in &self.edges {
            let from = edge.from.index as usize;
            match edge.to {
                Destination::Node(id) => audio_in[id.index as usize].push(from),
                Destination::Param(id, _) => param_in[id.index as usize].push(from),
                Destination::Output => output_in.push(from),
            }
            if let Some(id) = edge.to.node() {
                indegree[id.index as usize] += 1;
                downstream[from].push(id.index as usize);
            }
        }

        let mut ready: Vec<usize> = (0..n)
            .filter(|&i| self.slots[i].node.is_some() && indegree[i] == 0)
            .collect();
        let mut steps = Vec::with_capacity(n);
        while let Some(slot) = ready.pop() {
            for &next in &downstream[slot] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push(next);
                }
            }
            steps.push(Step {
                slot,
                audio_in: std::mem::take(&mut audio_in[slot]),
                param_in: std::mem::take(&mut param_in[slot]),
            });
        }

        RenderPlan { steps, output_in }
    }

    // --- rendering ------------------------------------------------------

    /// Render mono output into `out`, advancing time by `out.len()` frames.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.state != ContextState::Running {
            out.fill(0.0);
            return;
        }
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_block(chunk);
        }
    }

    fn render_block(&mut self, out: &mut [f32]) {
        let len = out.len();
        let start_time = self.current_time();
        let sample_rate = self.sample_rate;

        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => self.build_plan(),
        };

        for step in &plan.steps {
            let input = &mut self.input_buf[..len];
            input.fill(0.0);
            for &src in &step.audio_in {
                for (i, s) in input.iter_mut().zip(&self.buffers[src][..len]) {
                    *i += s;
                }
            }

            let Some(node) = self.slots[step.slot].node.as_mut() else {
                continue;
            };

            let param = &mut self.param_buf[..len];
            if let Some(p) = node.own_param_mut() {
                p.render(param, start_time, sample_rate);
                for &src in &step.param_in {
                    for (v, s) in param.iter_mut().zip(&self.buffers[src][..len]) {
                        *v += s;
                    }
                }
                if let Some(&last) = param.last() {
                    p.set_computed(last);
                }
            }

            node.process(input, param, &mut self.buffers[step.slot][..len], sample_rate);
        }

        out.fill(0.0);
        for &src in &plan.output_in {
            for (o, s) in out.iter_mut().zip(&self.buffers[src][..len]) {
                *o += s;
            }
        }

        self.plan = Some(plan);
        self.frames += len as u64;
    }
}
