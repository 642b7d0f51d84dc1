use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::{debug, trace};

use crate::{
    error::Result,
    graph::{AudioGraph, NodeId},
    synth::{
        bus::ModulationBus,
        mode::SynthMode,
        params::clamp_max_voices,
        voice::{self, ReleaseShape, Voice, VoiceId, VoiceWaves},
        Note,
    },
};

/// What a new voice is built from: the mode and waves current at note-on,
/// the shared bus and the node voices sum into.
#[derive(Debug, Clone, Copy)]
pub struct VoiceTemplate<'a> {
    pub mode: SynthMode,
    pub bus: &'a ModulationBus,
    pub waves: &'a VoiceWaves,
    pub output: NodeId,
}

/// Bounded set of live voices with oldest-first eviction.
///
/// A note-off only releases: the voice keeps its nodes, silent, until a
/// later note-on evicts it or the pool is reset. `pressed_notes` holds a
/// note exactly while its entry in the note map is non-empty.
#[derive(Debug)]
pub struct VoicePool {
    voices: VecDeque<Voice>,
    note_voices: HashMap<Note, Vec<VoiceId>>,
    pressed: BTreeSet<Note>,
    max_voices: usize,
    release: ReleaseShape,
    next_id: u64,
}

impl VoicePool {
    pub fn new(max_voices: usize, release: ReleaseShape) -> Self {
        Self {
            voices: VecDeque::new(),
            note_voices: HashMap::new(),
            pressed: BTreeSet::new(),
            max_voices: clamp_max_voices(max_voices),
            release,
            next_id: 0,
        }
    }

    /// Build, trigger and register a voice for `note`, then evict the oldest
    /// voices until the pool is back within `max_voices`.
    pub fn note_on(
        &mut self,
        graph: &mut AudioGraph,
        note: Note,
        template: VoiceTemplate<'_>,
        now: f64,
    ) -> Result<VoiceId> {
        let id = VoiceId(self.next_id);
        self.next_id += 1;

        let voice = voice::build(
            graph,
            id,
            note,
            template.mode,
            template.bus,
            template.waves,
            template.output,
        )?;
        voice.trigger(graph, now)?;
        self.voices.push_back(voice);

        while self.voices.len() > self.max_voices {
            let Some(mut oldest) = self.voices.pop_front() else {
                break;
            };
            debug!(id = ?oldest.id(), note = oldest.note(), "evicting voice");
            oldest.kill(graph);
            self.forget(oldest.note(), oldest.id());
        }

        self.note_voices.entry(note).or_default().push(id);
        self.pressed.insert(note);
        trace!(note, ?id, voices = self.voices.len(), "note on");
        Ok(id)
    }

    /// Release every voice sounding `note`. Unknown notes are ignored.
    pub fn note_off(&mut self, graph: &mut AudioGraph, note: Note, now: f64) -> Result<()> {
        let Some(ids) = self.note_voices.remove(&note) else {
            return Ok(());
        };
        for voice in self.voices.iter().filter(|v| ids.contains(&v.id())) {
            voice.release(graph, self.release, now)?;
        }
        self.pressed.remove(&note);
        trace!(note, released = ids.len(), "note off");
        Ok(())
    }

    /// Clamp `n` to the legal range, then kill everything. This is a hard
    /// reset even when `n` is the current limit.
    pub fn set_max_voices(&mut self, graph: &mut AudioGraph, n: usize) {
        self.max_voices = clamp_max_voices(n);
        debug!(max_voices = self.max_voices, "max voices set");
        self.kill_all(graph);
    }

    /// Kill every voice and clear all pool state.
    pub fn kill_all(&mut self, graph: &mut AudioGraph) {
        for mut voice in self.voices.drain(..) {
            voice.kill(graph);
        }
        self.note_voices.clear();
        self.pressed.clear();
    }

    fn forget(&mut self, note: Note, id: VoiceId) {
        if let Some(ids) = self.note_voices.get_mut(&note) {
            ids.retain(|&v| v != id);
            if ids.is_empty() {
                self.note_voices.remove(&note);
                self.pressed.remove(&note);
            }
        }
    }

    /// Live voices, oldest first. Released voices are included.
    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn pressed_notes(&self) -> &BTreeSet<Note> {
        &self.pressed
    }

    /// Voices currently sounding `note` (not yet released).
    pub fn voices_for(&self, note: Note) -> &[VoiceId] {
        self.note_voices
            .get(&note)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    pub fn release_shape(&self) -> ReleaseShape {
        self.release
    }

    pub fn set_release_shape(&mut self, shape: ReleaseShape) {
        self.release = shape;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{Destination, ParamKind},
        synth::params::{ModParam, SynthParams},
    };

    struct Rig {
        graph: AudioGraph,
        bus: ModulationBus,
        waves: VoiceWaves,
        sum: NodeId,
        pool: VoicePool,
    }

    impl Rig {
        fn new(max_voices: usize) -> Self {
            let mut graph = AudioGraph::new(48_000.0);
            let bus = ModulationBus::create(&mut graph, &SynthParams::default()).unwrap();
            let sum = graph.create_gain(1.0);
            graph.connect(sum, Destination::Output).unwrap();
            graph.resume();
            Self {
                graph,
                bus,
                waves: VoiceWaves::default(),
                sum,
                pool: VoicePool::new(max_voices, ReleaseShape::default()),
            }
        }

        fn on(&mut self, note: Note) -> VoiceId {
            self.on_with(note, SynthMode::Fm)
        }

        fn on_with(&mut self, note: Note, mode: SynthMode) -> VoiceId {
            let template = VoiceTemplate {
                mode,
                bus: &self.bus,
                waves: &self.waves,
                output: self.sum,
            };
            let now = self.graph.current_time();
            self.pool
                .note_on(&mut self.graph, note, template, now)
                .unwrap()
        }

        fn off(&mut self, note: Note) {
            let now = self.graph.current_time();
            self.pool.note_off(&mut self.graph, note, now).unwrap();
        }

        fn ids(&self) -> Vec<VoiceId> {
            self.pool.voices().map(Voice::id).collect()
        }

        fn pressed(&self) -> Vec<Note> {
            self.pool.pressed_notes().iter().copied().collect()
        }
    }

    #[test]
    fn keeps_the_k_most_recent_voices() {
        for k in 1..=8 {
            let mut rig = Rig::new(k);
            let mut created = Vec::new();
            for i in 0..20 {
                created.push(rig.on(48 + (i * 5) % 24));
                assert!(rig.pool.len() <= k);
            }
            let expected: Vec<_> = created[created.len() - k..].to_vec();
            assert_eq!(rig.ids(), expected, "k = {k}");
        }
    }

    #[test]
    fn third_note_evicts_the_first_with_two_voices() {
        let mut rig = Rig::new(2);
        rig.on(60);
        rig.on(64);
        rig.on(67);
        assert_eq!(rig.pool.len(), 2);
        assert_eq!(rig.pressed(), vec![64, 67]);
        assert!(rig.pool.voices_for(60).is_empty());
    }

    #[test]
    fn note_off_clears_pressed_but_keeps_the_voice() {
        let mut rig = Rig::new(4);
        rig.on(60);
        rig.off(60);
        assert!(rig.pressed().is_empty());
        assert!(rig.pool.voices_for(60).is_empty());
        assert_eq!(rig.pool.len(), 1);
    }

    #[test]
    fn note_off_for_unknown_note_is_a_no_op() {
        let mut rig = Rig::new(4);
        rig.on(60);
        rig.off(61);
        assert_eq!(rig.pressed(), vec![60]);
    }

    #[test]
    fn retrigger_keeps_both_voices_for_the_note() {
        let mut rig = Rig::new(4);
        let first = rig.on(60);
        let second = rig.on(60);
        assert_eq!(rig.pool.voices_for(60), &[first, second]);

        rig.off(60);
        assert!(rig.pressed().is_empty());
        assert_eq!(rig.pool.len(), 2);
    }

    #[test]
    fn evicting_one_of_two_voices_keeps_the_note_pressed() {
        let mut rig = Rig::new(2);
        rig.on(60);
        let second = rig.on(60);
        rig.on(72);
        assert_eq!(rig.pool.voices_for(60), &[second]);
        assert_eq!(rig.pressed(), vec![60, 72]);
    }

    #[test]
    fn released_voices_are_evicted_first_in_line() {
        let mut rig = Rig::new(2);
        let a = rig.on(60);
        rig.off(60);
        let b = rig.on(62);
        let c = rig.on(64);
        assert_eq!(rig.ids(), vec![b, c]);
        assert!(!rig.ids().contains(&a));
    }

    #[test]
    fn set_max_voices_resets_even_for_the_same_value() {
        let mut rig = Rig::new(4);
        let baseline = rig.graph.node_count();
        rig.on(60);
        rig.on(64);
        rig.pool.set_max_voices(&mut rig.graph, 4);
        assert!(rig.pressed().is_empty());
        assert!(rig.pool.is_empty());
        assert_eq!(rig.graph.node_count(), baseline);
    }

    #[test]
    fn set_max_voices_clamps() {
        let mut rig = Rig::new(4);
        rig.pool.set_max_voices(&mut rig.graph, 0);
        assert_eq!(rig.pool.max_voices(), 1);
        rig.pool.set_max_voices(&mut rig.graph, 100);
        assert_eq!(rig.pool.max_voices(), 8);
    }

    #[test]
    fn eviction_frees_the_graph_nodes() {
        let mut rig = Rig::new(1);
        rig.on(60);
        let with_one = rig.graph.node_count();
        for note in 61..70 {
            rig.on(note);
        }
        assert_eq!(rig.graph.node_count(), with_one);
    }

    #[test]
    fn ratio_change_retargets_every_live_voice() {
        let mut rig = Rig::new(4);
        rig.on(60);
        rig.on(67);
        let mut out = vec![0.0; 128];
        rig.graph.render(&mut out);

        let now = rig.graph.current_time();
        rig.bus.set(&mut rig.graph, ModParam::Ratio, 2.0, now).unwrap();
        rig.graph.render(&mut out);

        for voice in rig.pool.voices() {
            let expected = crate::io::converter::midi_to_hz(voice.note()) * 2.0;
            let f = rig
                .graph
                .param_value(voice.nodes().mod_osc, ParamKind::Frequency)
                .unwrap();
            assert!((f - expected).abs() < 1e-2, "{f} vs {expected}");
            let env = rig
                .graph
                .param_value(voice.nodes().car_env, ParamKind::Gain)
                .unwrap();
            assert_eq!(env, 1.0);
        }
    }

    #[test]
    fn mode_is_fixed_at_build_time() {
        let mut rig = Rig::new(4);
        rig.on_with(60, SynthMode::Fm);
        rig.on_with(64, SynthMode::Am);
        let modes: Vec<_> = rig.pool.voices().map(Voice::mode).collect();
        assert_eq!(modes, vec![SynthMode::Fm, SynthMode::Am]);
    }
}
