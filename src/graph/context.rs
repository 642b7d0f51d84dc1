use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::graph::audio_graph::{AudioGraph, ContextState};

/// Shared handle to an [`AudioGraph`].
///
/// The control thread and the audio callback each hold a clone. Control
/// code takes the lock once per operation; the audio callback takes it once
/// per block.
#[derive(Clone)]
pub struct AudioContext {
    graph: Arc<Mutex<AudioGraph>>,
}

impl AudioContext {
    /// A new context starts suspended. Call [`AudioContext::resume`] to hear it.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            graph: Arc::new(Mutex::new(AudioGraph::new(sample_rate))),
        }
    }

    /// Lock the graph. A panic on another thread while holding the lock does
    /// not make the graph unusable; the guard is recovered.
    pub fn lock(&self) -> MutexGuard<'_, AudioGraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn render(&self, out: &mut [f32]) {
        self.lock().render(out);
    }

    pub fn current_time(&self) -> f64 {
        self.lock().current_time()
    }

    pub fn sample_rate(&self) -> f32 {
        self.lock().sample_rate()
    }

    pub fn state(&self) -> ContextState {
        self.lock().state()
    }

    pub fn resume(&self) {
        self.lock().resume();
    }

    pub fn suspend(&self) {
        self.lock().suspend();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::Destination;

    #[test]
    fn clones_share_one_graph() {
        let ctx = AudioContext::new(48_000.0);
        let audio_side = ctx.clone();

        {
            let mut graph = ctx.lock();
            let src = graph.create_constant_source(0.25);
            graph.start(src).unwrap();
            graph.connect(src, Destination::Output).unwrap();
        }
        ctx.resume();

        let mut out = [0.0f32; 32];
        audio_side.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.25));
        assert_eq!(ctx.state(), ContextState::Running);
        assert!(ctx.current_time() > 0.0);
    }

    #[test]
    fn render_runs_on_another_thread() {
        let ctx = AudioContext::new(48_000.0);
        ctx.resume();
        let audio_side = ctx.clone();
        let handle = std::thread::spawn(move || {
            let mut out = [0.0f32; 256];
            audio_side.render(&mut out);
        });
        handle.join().unwrap();
        assert!((ctx.current_time() - 256.0 / 48_000.0).abs() < 1e-9);
    }
}
