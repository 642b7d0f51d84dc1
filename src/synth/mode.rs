use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// How the modulator acts on the carrier.
///
/// Read once when a voice is built. Switching the mode affects only voices
/// built afterwards; live voices keep their wiring until they are killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SynthMode {
    /// Modulator output is added to the carrier's frequency.
    #[default]
    #[serde(rename = "FM")]
    Fm,
    /// Modulator output swings the carrier's gain around unity.
    #[serde(rename = "AM")]
    Am,
}

impl SynthMode {
    pub fn name(self) -> &'static str {
        match self {
            SynthMode::Fm => "FM",
            SynthMode::Am => "AM",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SynthMode::Fm => SynthMode::Am,
            SynthMode::Am => SynthMode::Fm,
        }
    }
}

/// The mode-specific part of a built voice, with the extra node it needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModRouting {
    /// FM: `index_stage` scales the modulator frequency by the index bus
    /// and drives the modulator depth. Modulation lands on the carrier
    /// frequency.
    Frequency { index_stage: NodeId },
    /// AM: `dc_offset` is a -1 source summed ahead of the level stage.
    /// Modulation lands on the carrier depth gain.
    Amplitude { dc_offset: NodeId },
}

impl ModRouting {
    pub fn mode(&self) -> SynthMode {
        match self {
            ModRouting::Frequency { .. } => SynthMode::Fm,
            ModRouting::Amplitude { .. } => SynthMode::Am,
        }
    }

    pub(crate) fn node(&self) -> NodeId {
        match *self {
            ModRouting::Frequency { index_stage } => index_stage,
            ModRouting::Amplitude { dc_offset } => dc_offset,
        }
    }
}
