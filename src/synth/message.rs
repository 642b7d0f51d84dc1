use rtrb::Consumer;

use crate::synth::Note;

/// Control events produced by input collaborators (keyboard, MIDI, UI).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SynthMessage {
    NoteOn { note: Note },
    NoteOff { note: Note },
    /// Release every pressed note.
    AllNotesOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
