//! Dynamic audio node graph.
//!
//! Nodes (oscillators, gains, constant sources, analysers) are created at
//! runtime, wired together and torn down again as voices come and go. Edges
//! can land on another node's input or on one of its parameters; everything
//! arriving at the same place is summed, which is how one shared control
//! source drives a parameter on every voice at once.

/// Node arena, connections and the block renderer.
pub mod audio_graph;
/// Thread-shareable handle around the graph.
pub mod context;
/// Node ids, kinds, parameters and per-node processing.
pub mod node;

pub use audio_graph::{AudioGraph, ContextState};
pub use context::AudioContext;
pub use node::{Destination, Node, NodeId, NodeKind, ParamKind, Playback};
