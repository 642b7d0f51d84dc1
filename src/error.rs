//! Error types for modsynth.

use thiserror::Error;

use crate::graph::{NodeId, NodeKind, ParamKind};

/// Result type alias for modsynth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in modsynth.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine has not been initialized yet (`SynthEngine::init`).
    #[error("synth engine is not initialized")]
    NotInitialized,

    /// A node id that was never allocated or has already been removed.
    #[error("graph node {0:?} does not exist")]
    NodeNotFound(NodeId),

    /// The node has no parameter of that kind.
    #[error("graph node {node:?} has no {param:?} parameter")]
    NoSuchParam { node: NodeId, param: ParamKind },

    /// The operation needs a different kind of node.
    #[error("graph node {node:?} is not a {expected:?} node")]
    WrongNodeKind { node: NodeId, expected: NodeKind },

    /// The connection would close a feedback loop.
    #[error("connecting {from:?} to {to:?} would create a cycle")]
    WouldCycle { from: NodeId, to: NodeId },

    /// The named preset is not in the catalog.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// The preset catalog could not be parsed.
    #[error("invalid preset catalog: {0}")]
    PresetCatalog(#[from] serde_json::Error),
}
